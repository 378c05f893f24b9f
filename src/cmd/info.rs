use std::path::PathBuf;

use glbopt::gltf::{GltfFile, Result};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print transport, source form, and per-category element counts.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let file = GltfFile::open(&path)?;
	let categories = file.scan_category_stats();

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			transport: file.transport.as_str().to_owned(),
			form: file.form.as_str().to_owned(),
			json_bytes: file.json_length,
			binary_bytes: file.binary_length,
			categories: categories
				.iter()
				.map(|(category, count)| CategoryJson {
					category: category.clone(),
					count: *count,
				})
				.collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("transport: {}", file.transport.as_str());
	println!("form: {}", file.form.as_str());
	println!("json_bytes: {}", file.json_length);
	println!("binary_bytes: {}", file.binary_length);
	println!("categories:");
	for (category, count) in categories {
		println!("  {category}: {count}");
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct CategoryJson {
	category: String,
	count: usize,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	transport: String,
	form: String,
	json_bytes: usize,
	binary_bytes: usize,
	categories: Vec<CategoryJson>,
}
