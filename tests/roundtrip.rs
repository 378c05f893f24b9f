#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};

/// Packing, unpacking, and packing again must be byte-stable: the container
/// is fully self-describing and the codec adds nothing of its own beyond
/// alignment padding.
#[test]
fn pack_unpack_pack_is_byte_stable() {
	let dir = tempfile::tempdir().expect("tempdir creates");
	let source = dir.path().join("asset.gltf");
	std::fs::write(&source, serde_json::to_vec(&asset_json()).unwrap()).expect("fixture writes");

	let first = dir.path().join("first.glb");
	run_ok(&["pack", path_str(&source), "--output", path_str(&first)]);

	let unpacked = dir.path().join("unpacked.gltf");
	run_ok(&["unpack", path_str(&first), "--output", path_str(&unpacked)]);

	let second = dir.path().join("second.glb");
	run_ok(&["pack", path_str(&unpacked), "--output", path_str(&second)]);

	let first_bytes = std::fs::read(&first).expect("first container readable");
	let second_bytes = std::fs::read(&second).expect("second container readable");
	assert_eq!(first_bytes, second_bytes);

	// Wire invariants of the emitted container.
	assert_eq!(&first_bytes[0..4], b"glTF");
	let declared = u32::from_le_bytes(first_bytes[8..12].try_into().unwrap());
	assert_eq!(declared as usize, first_bytes.len());
	assert_eq!(first_bytes.len() % 4, 0);
}

#[test]
fn unpacked_document_matches_the_source() {
	let dir = tempfile::tempdir().expect("tempdir creates");
	let source = dir.path().join("asset.gltf");
	std::fs::write(&source, serde_json::to_vec(&asset_json()).unwrap()).expect("fixture writes");

	let glb = dir.path().join("asset.glb");
	run_ok(&["pack", path_str(&source), "--output", path_str(&glb)]);
	let unpacked = dir.path().join("unpacked.gltf");
	run_ok(&["unpack", path_str(&glb), "--output", path_str(&unpacked)]);

	let original: Value = serde_json::from_slice(&std::fs::read(&source).unwrap()).unwrap();
	let round_tripped: Value = serde_json::from_slice(&std::fs::read(&unpacked).unwrap()).unwrap();
	assert_eq!(round_tripped, original);
}

fn asset_json() -> Value {
	json!({
		"asset": {"version": "2.0"},
		"scenes": [{"nodes": [0]}],
		"nodes": [{"mesh": 0}],
		"meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
		"accessors": [
			{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
			{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"},
		],
		"bufferViews": [
			{"buffer": 0, "byteOffset": 0, "byteLength": 36},
			{"buffer": 0, "byteOffset": 36, "byteLength": 6},
		],
		"buffers": [{"byteLength": 42, "uri": "geometry.bin"}],
	})
}

fn path_str(path: &Path) -> &str {
	path.to_str().expect("paths are utf-8")
}

fn run_ok(args: &[&str]) -> Output {
	let output = Command::new(env!("CARGO_BIN_EXE_glbopt")).args(args).output().expect("command executes");
	assert!(
		output.status.success(),
		"glbopt {:?} failed with status={}: {}",
		args,
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	output
}
