use std::fs;
use std::path::PathBuf;

use glbopt::gltf::{self, GltfError, GltfFile, RemovalStats, Result, Scheduler, Stage, StageRelations};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(short, long)]
	pub output: PathBuf,
	/// Leave unreachable elements in place.
	#[arg(long)]
	pub skip_prune: bool,
	/// Leave buffers unmerged.
	#[arg(long)]
	pub skip_merge: bool,
	/// Emit a JSON document instead of a binary container.
	#[arg(long)]
	pub keep_json: bool,
	/// Extra stages to run before emission, by configuration name.
	#[arg(long = "run", value_name = "STAGE")]
	pub extra_stages: Vec<String>,
	/// Print per-category removal counts.
	#[arg(long)]
	pub stats: bool,
	/// Verify no dangling references remain after the pipeline.
	#[arg(long)]
	pub check: bool,
}

/// Run the pruning, merging, and packing pipeline over one asset.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		output,
		skip_prune,
		skip_merge,
		keep_json,
		extra_stages,
		stats: print_stats,
		check,
	} = args;

	// Unknown stage names fail before any work runs.
	let extra: Vec<Stage> = extra_stages.iter().map(|name| Stage::parse(name)).collect::<Result<_>>()?;

	let mut file = GltfFile::open(&path)?;
	let mut scheduler = Scheduler::standard();
	let mut stats = RemovalStats::default();
	let doc = &mut file.document;

	if skip_prune {
		// Merging must not drag the pruning stages back in through its
		// default dependency.
		scheduler.set_relations(Stage::MergeBuffers, StageRelations::default());
	} else {
		scheduler.run(Stage::RemoveUnusedAttributes, doc, &mut stats)?;
		scheduler.run(Stage::RemoveUnused, doc, &mut stats)?;
	}
	if !skip_merge {
		scheduler.run(Stage::MergeBuffers, doc, &mut stats)?;
	}
	for stage in extra {
		scheduler.run(stage, doc, &mut stats)?;
	}
	scheduler.run(Stage::StripExtras, doc, &mut stats)?;
	scheduler.finish(doc, &mut stats)?;

	if check {
		let violations = gltf::dangling_references(doc);
		if !violations.is_empty() {
			for violation in &violations {
				eprintln!("dangling: {violation}");
			}
			return Err(GltfError::InvalidDocument {
				reason: "dangling references remain after optimization",
			});
		}
	}

	let bytes = if keep_json {
		file.document.to_json_bytes()?
	} else {
		gltf::encode(&file.document)?
	};
	fs::write(&output, &bytes)?;

	println!("optimized {} -> {} ({} bytes)", path.display(), output.display(), bytes.len());
	if print_stats {
		println!("removed: {}", stats.total());
		for (category, count) in stats.iter() {
			println!("  {category}: {count}");
		}
	}

	Ok(())
}
