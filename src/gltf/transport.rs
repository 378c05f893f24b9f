use std::io::Read;

use crate::gltf::{GltfError, Result, container};

const MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;
/// gzip member magic used by compressed asset files.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Transport wrapping detected around a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
	/// Raw uncompressed stream.
	None,
	/// gzip-compressed stream.
	Gzip,
}

impl Transport {
	/// Render transport mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Gzip => "gzip",
		}
	}
}

/// Detect and strip transport compression, returning `(mode, decoded_bytes)`.
///
/// A raw stream passes through untouched; whether it is actually a container
/// or a JSON document is the caller's concern. A gzip stream is inflated and
/// must then hold glTF input of either form.
pub fn decode_bytes(raw: Vec<u8>) -> Result<(Transport, Vec<u8>)> {
	if !raw.starts_with(&GZIP_MAGIC) {
		return Ok((Transport::None, raw));
	}

	let out = decode_gzip(&raw)?;
	if !looks_like_gltf_input(&out) {
		return Err(GltfError::NotGltfAfterDecompress);
	}
	Ok((Transport::Gzip, out))
}

/// Whether bytes plausibly hold a container or a JSON document.
pub fn looks_like_gltf_input(bytes: &[u8]) -> bool {
	if container::is_container(bytes) {
		return true;
	}
	bytes.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'{')
}

fn decode_gzip(raw: &[u8]) -> Result<Vec<u8>> {
	let mut decoder = flate2::read::GzDecoder::new(raw);
	let mut out = Vec::new();
	let mut buf = [0_u8; 8192];

	loop {
		let read = decoder.read(&mut buf)?;
		if read == 0 {
			break;
		}

		if out.len() + read > MAX_DECOMPRESSED_BYTES {
			return Err(GltfError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
		}

		out.extend_from_slice(&buf[..read]);
	}

	Ok(out)
}
