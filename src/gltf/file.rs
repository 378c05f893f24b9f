use std::fs;
use std::path::Path;

use crate::gltf::container::{self, ContainerVersion};
use crate::gltf::transport::{self, Transport};
use crate::gltf::{Document, GltfError, Result};

/// Input form a source file carried after transport stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceForm {
	/// Binary container of the given generation.
	Container(ContainerVersion),
	/// Bare JSON document.
	Json,
}

impl SourceForm {
	/// Render the source form as a stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Container(ContainerVersion::V1) => "glb-v1",
			Self::Container(ContainerVersion::V2) => "glb-v2",
			Self::Json => "json",
		}
	}
}

/// One opened asset: the parsed graph plus source metadata.
#[derive(Debug)]
pub struct GltfFile {
	/// Parsed, mutable asset graph.
	pub document: Document,
	/// Transport wrapping the source carried.
	pub transport: Transport,
	/// Form of the input after transport stripping.
	pub form: SourceForm,
	/// JSON region byte length of the input.
	pub json_length: usize,
	/// Binary region byte length of the input, 0 when absent.
	pub binary_length: usize,
}

impl GltfFile {
	/// Read, decompress, and parse one asset file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let raw = fs::read(path)?;
		Self::from_bytes(raw)
	}

	/// Decompress and parse raw asset bytes.
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		let (transport, bytes) = transport::decode_bytes(raw)?;

		if container::is_container(&bytes) {
			let decoded = container::decode(&bytes)?;
			return Ok(Self {
				document: decoded.document,
				transport,
				form: SourceForm::Container(decoded.version),
				json_length: decoded.json_length,
				binary_length: decoded.binary_length,
			});
		}

		if !transport::looks_like_gltf_input(&bytes) {
			return Err(GltfError::UnknownMagic { magic: first4(&bytes) });
		}

		let json_length = bytes.len();
		Ok(Self {
			document: Document::from_json_bytes(&bytes)?,
			transport,
			form: SourceForm::Json,
			json_length,
			binary_length: 0,
		})
	}

	/// Per-category element counts, in collection-name order.
	pub fn scan_category_stats(&self) -> Vec<(String, usize)> {
		let mut stats: Vec<(String, usize)> = self
			.document
			.root()
			.iter()
			.filter(|(_, value)| value.is_array() || value.is_object())
			.map(|(category, _)| (category.clone(), self.document.collection_len(category)))
			.filter(|(category, _)| category != "asset" && category != "extensions")
			.collect();
		stats.sort();
		stats
	}
}

fn first4(bytes: &[u8]) -> [u8; 4] {
	let mut magic = [0_u8; 4];
	let take = bytes.len().min(4);
	magic[..take].copy_from_slice(&bytes[..take]);
	magic
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::{GltfFile, SourceForm};
	use crate::gltf::transport::Transport;
	use crate::gltf::{Document, GltfError, container};

	#[test]
	fn bare_json_bytes_open_as_a_document() {
		let raw = serde_json::to_vec(&json!({"scenes": [], "nodes": [{}, {}]})).unwrap();
		let file = GltfFile::from_bytes(raw).expect("open succeeds");

		assert_eq!(file.transport, Transport::None);
		assert_eq!(file.form, SourceForm::Json);
		assert_eq!(file.scan_category_stats(), vec![("nodes".to_owned(), 2), ("scenes".to_owned(), 0)]);
	}

	#[test]
	fn container_bytes_open_with_version_metadata() {
		let serde_json::Value::Object(root) = json!({"asset": {"version": "2.0"}}) else {
			unreachable!()
		};
		let bytes = container::encode(&Document::from_root(root)).expect("encode succeeds");
		let file = GltfFile::from_bytes(bytes).expect("open succeeds");

		assert_eq!(file.form.as_str(), "glb-v2");
		assert!(file.json_length > 0);
	}

	#[test]
	fn unrecognized_bytes_are_rejected() {
		let err = GltfFile::from_bytes(b"BLENDER-v500".to_vec()).expect_err("open fails");
		assert!(matches!(err, GltfError::UnknownMagic { magic } if &magic == b"BLEN"));
	}
}
