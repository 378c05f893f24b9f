use std::fs;
use std::path::PathBuf;

use glbopt::gltf::{GltfFile, Result};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(short, long)]
	pub output: PathBuf,
	#[arg(long)]
	pub pretty: bool,
}

/// Unpack a container (or transported JSON) into a bare JSON document.
pub fn run(args: Args) -> Result<()> {
	let Args { path, output, pretty } = args;

	let mut file = GltfFile::open(&path)?;
	file.document.strip_pipeline_extras();

	let bytes = if pretty {
		file.document.to_json_bytes_pretty()?
	} else {
		file.document.to_json_bytes()?
	};
	fs::write(&output, bytes)?;

	println!("unpacked {} ({}) -> {}", path.display(), file.form.as_str(), output.display());
	Ok(())
}
