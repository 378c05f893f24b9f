use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, GltfError>;

/// Errors produced while reading, transforming, and emitting glTF assets.
#[derive(Debug, Error)]
pub enum GltfError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// JSON parse or serialization failure.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Unknown leading file magic.
	#[error("not a glTF container or JSON document (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Decompressed stream did not contain glTF input.
	#[error("decompressed data is neither a glTF container nor JSON")]
	NotGltfAfterDecompress,
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Container format version is neither 1 nor 2.
	#[error("unsupported container version {version} (expected 1 or 2)")]
	UnsupportedVersion {
		/// Parsed container version.
		version: u32,
	},
	/// Version-1 scene format tag was not JSON.
	#[error("unsupported scene format {format} (expected 0 = JSON)")]
	SceneFormatNotJson {
		/// Parsed scene format tag.
		format: u32,
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Declared total length disagrees with actual byte count.
	#[error("declared length {declared} does not match actual {actual}")]
	LengthMismatch {
		/// Length recorded in the container header.
		declared: u64,
		/// Actual input byte count.
		actual: u64,
	},
	/// Chunk payload would exceed remaining container data.
	#[error("chunk length {len} at offset {at} exceeds remaining {rem}")]
	ChunkLenOutOfRange {
		/// Chunk header byte offset.
		at: usize,
		/// Declared payload length.
		len: u64,
		/// Remaining bytes in cursor.
		rem: usize,
	},
	/// Version-2 container carried no JSON chunk.
	#[error("container has no JSON chunk")]
	MissingJsonChunk,
	/// JSON chunk did not decode to an object document.
	#[error("invalid document: {reason}")]
	InvalidDocument {
		/// Human-readable failure detail.
		reason: &'static str,
	},
	/// A pipeline stage name has no resolvable implementation.
	#[error("unknown pipeline stage: {name}")]
	UnknownStage {
		/// Requested stage name.
		name: String,
	},
}
