#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

#[test]
fn info_json_output_reports_source_and_categories() {
	let dir = tempfile::tempdir().expect("tempdir creates");
	let glb = write_packed_asset(dir.path(), "asset.glb");

	let output = run_glbopt(&["info", glb.to_str().unwrap(), "--json"]);
	let info: Value = parse_stdout_json(&output);

	assert_eq!(info["form"], "glb-v2");
	assert_eq!(info["transport"], "none");
	assert!(info["json_bytes"].as_u64().is_some_and(|bytes| bytes > 0));
	let categories = info["categories"].as_array().expect("categories array");
	assert!(
		categories.iter().any(|entry| entry["category"] == "nodes" && entry["count"] == 2),
		"expected node count in {categories:?}"
	);
}

#[test]
fn optimize_prunes_unreachable_elements_end_to_end() {
	let dir = tempfile::tempdir().expect("tempdir creates");
	let glb = write_packed_asset(dir.path(), "asset.glb");
	let out = dir.path().join("optimized.gltf");

	let output = run_glbopt(&[
		"optimize",
		glb.to_str().unwrap(),
		"--output",
		out.to_str().unwrap(),
		"--keep-json",
		"--stats",
	]);
	assert!(output.status.success(), "optimize failed: {}", String::from_utf8_lossy(&output.stderr));

	let optimized: Value = serde_json::from_slice(&std::fs::read(&out).expect("output readable")).expect("output is json");
	assert_eq!(optimized["nodes"].as_array().map(Vec::len), Some(1), "orphan node removed");
	assert_eq!(optimized["meshes"].as_array().map(Vec::len), Some(1), "orphan mesh removed");
	assert!(optimized.get("cameras").is_none_or(|cameras| cameras.as_array().is_some_and(Vec::is_empty)));
}

#[test]
fn optimize_rejects_unknown_stage_names() {
	let dir = tempfile::tempdir().expect("tempdir creates");
	let glb = write_packed_asset(dir.path(), "asset.glb");
	let out = dir.path().join("never-written.glb");

	let output = run_glbopt(&[
		"optimize",
		glb.to_str().unwrap(),
		"--output",
		out.to_str().unwrap(),
		"--run",
		"bakeAmbientOcclusion",
	]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("unknown pipeline stage"), "unexpected stderr: {stderr}");
	assert!(!out.exists(), "failed pipeline must not emit output");
}

/// Two-node asset where node 1, its mesh, and a camera are unreachable from
/// the scene root.
fn asset_json() -> Value {
	json!({
		"asset": {"version": "2.0"},
		"scenes": [{"nodes": [0]}],
		"scene": 0,
		"nodes": [
			{"mesh": 0},
			{"mesh": 1, "name": "orphan"},
		],
		"meshes": [
			{"primitives": [{"attributes": {"POSITION": 0}}]},
			{"primitives": [{"attributes": {"POSITION": 1}}]},
		],
		"accessors": [
			{"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"},
			{"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"},
		],
		"bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 12}],
		"buffers": [{"byteLength": 12}],
		"cameras": [{"type": "perspective", "perspective": {"yfov": 0.7, "znear": 0.01}}],
	})
}

fn write_packed_asset(dir: &Path, name: &str) -> PathBuf {
	let gltf = dir.join("asset.gltf");
	std::fs::write(&gltf, serde_json::to_vec(&asset_json()).unwrap()).expect("fixture writes");

	let glb = dir.join(name);
	let output = run_glbopt(&["pack", gltf.to_str().unwrap(), "--output", glb.to_str().unwrap()]);
	assert!(output.status.success(), "pack failed: {}", String::from_utf8_lossy(&output.stderr));
	glb
}

fn run_glbopt(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_glbopt")).args(args).output().expect("command executes")
}

fn parse_stdout_json(output: &Output) -> Value {
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
