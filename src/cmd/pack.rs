use std::fs;
use std::path::PathBuf;

use glbopt::gltf::{self, GltfFile, Result};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(short, long)]
	pub output: PathBuf,
}

/// Pack a JSON document (or re-pack a container) into the current binary
/// container format.
pub fn run(args: Args) -> Result<()> {
	let Args { path, output } = args;

	let mut file = GltfFile::open(&path)?;
	file.document.strip_pipeline_extras();

	let bytes = gltf::encode(&file.document)?;
	fs::write(&output, &bytes)?;

	println!("packed {} -> {} ({} bytes)", path.display(), output.display(), bytes.len());
	Ok(())
}
