use std::collections::{HashMap, HashSet};

use crate::gltf::prune::RemovalStats;
use crate::gltf::{Document, GltfError, Result, attributes, collect, merge};

/// Closed set of processing stage identifiers.
///
/// Dispatch is a build-time table from identifier to function; stage names
/// exist only at the configuration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Drop primitive attributes no technique consumes.
	RemoveUnusedAttributes,
	/// Remove every unreachable graph element.
	RemoveUnused,
	/// Coalesce all buffers into one backing store.
	MergeBuffers,
	/// Strip serialized processing side channels.
	StripExtras,
	/// Geometry collaborator: normal generation passthrough.
	GenerateNormals,
	/// Geometry collaborator: quantization passthrough.
	Quantize,
}

impl Stage {
	/// Stable configuration-facing name of the stage.
	pub fn name(self) -> &'static str {
		match self {
			Self::RemoveUnusedAttributes => "removeUnusedAttributes",
			Self::RemoveUnused => "removeUnused",
			Self::MergeBuffers => "mergeBuffers",
			Self::StripExtras => "stripExtras",
			Self::GenerateNormals => "generateNormals",
			Self::Quantize => "quantize",
		}
	}

	/// Resolve a configuration name to a stage identifier.
	pub fn parse(name: &str) -> Result<Self> {
		match name {
			"removeUnusedAttributes" => Ok(Self::RemoveUnusedAttributes),
			"removeUnused" => Ok(Self::RemoveUnused),
			"mergeBuffers" => Ok(Self::MergeBuffers),
			"stripExtras" => Ok(Self::StripExtras),
			"generateNormals" => Ok(Self::GenerateNormals),
			"quantize" => Ok(Self::Quantize),
			other => Err(GltfError::UnknownStage { name: other.to_owned() }),
		}
	}
}

/// Stage implementation signature.
pub type StageFn = fn(&mut Document, &mut RemovalStats) -> Result<()>;

/// Ordering relations of one stage.
///
/// `run_before` dependencies are satisfied at most once; the immediate
/// variants re-run every time. `run_after` targets are flagged for a future
/// run instead of being entered recursively, so one stage invocation cannot
/// recurse without bound; [`Scheduler::finish`] sweeps the flags.
#[derive(Debug, Clone, Default)]
pub struct StageRelations {
	/// Must have run at least once before this stage.
	pub run_before: Vec<Stage>,
	/// Always re-run immediately before this stage.
	pub run_immediately_before: Vec<Stage>,
	/// Always run immediately after this stage.
	pub run_immediately_after: Vec<Stage>,
	/// Needs a future run once this stage has run.
	pub run_after: Vec<Stage>,
}

/// Externally supplied per-stage ordering configuration.
///
/// Absence of a configuration defaults to no added constraints.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
	/// Stages that must have run before.
	pub before: Vec<Stage>,
	/// Stages to flag for a run after.
	pub after: Vec<Stage>,
}

/// Dependency-ordered stage runner.
///
/// All lookup tables and run-state live on the instance, so independent
/// pipelines never interfere; create one scheduler per asset.
pub struct Scheduler {
	registry: HashMap<Stage, StageFn>,
	relations: HashMap<Stage, StageRelations>,
	has_run: HashSet<Stage>,
	needs_to_run: Vec<Stage>,
	history: Vec<Stage>,
}

impl Scheduler {
	/// Scheduler over an explicit dispatch table with no relations.
	pub fn new(registry: HashMap<Stage, StageFn>) -> Self {
		Self {
			registry,
			relations: HashMap::new(),
			has_run: HashSet::new(),
			needs_to_run: Vec::new(),
			history: Vec::new(),
		}
	}

	/// Scheduler over the built-in stage set and its default ordering.
	pub fn standard() -> Self {
		let mut registry: HashMap<Stage, StageFn> = HashMap::new();
		registry.insert(Stage::RemoveUnusedAttributes, run_remove_unused_attributes);
		registry.insert(Stage::RemoveUnused, run_remove_unused);
		registry.insert(Stage::MergeBuffers, run_merge_buffers);
		registry.insert(Stage::StripExtras, run_strip_extras);
		registry.insert(Stage::GenerateNormals, run_passthrough);
		registry.insert(Stage::Quantize, run_passthrough);

		let mut scheduler = Self::new(registry);
		scheduler.set_relations(
			Stage::RemoveUnused,
			StageRelations {
				run_before: vec![Stage::RemoveUnusedAttributes],
				..Default::default()
			},
		);
		scheduler.set_relations(
			Stage::MergeBuffers,
			StageRelations {
				run_before: vec![Stage::RemoveUnused],
				..Default::default()
			},
		);
		scheduler.set_relations(
			Stage::Quantize,
			StageRelations {
				run_before: vec![Stage::GenerateNormals],
				// Quantization drops accessors; the graph needs another
				// sweep before emission.
				run_after: vec![Stage::RemoveUnused],
				..Default::default()
			},
		);
		scheduler
	}

	/// Replace the relations of one stage.
	pub fn set_relations(&mut self, stage: Stage, relations: StageRelations) {
		self.relations.insert(stage, relations);
	}

	/// Fold an external `{before, after}` configuration into a stage's
	/// relations.
	pub fn apply_config(&mut self, stage: Stage, config: &StageConfig) {
		let relations = self.relations.entry(stage).or_default();
		relations.run_before.extend(config.before.iter().copied());
		relations.run_after.extend(config.after.iter().copied());
	}

	/// Execute one stage, satisfying its relations.
	pub fn run(&mut self, stage: Stage, doc: &mut Document, stats: &mut RemovalStats) -> Result<()> {
		self.execute(stage, doc, stats, false)
	}

	/// Run every stage flagged for a deferred run until none remain.
	pub fn finish(&mut self, doc: &mut Document, stats: &mut RemovalStats) -> Result<()> {
		while let Some(stage) = self.needs_to_run.first().copied() {
			self.execute(stage, doc, stats, true)?;
		}
		Ok(())
	}

	/// Ordered execution history, most recent last.
	pub fn history(&self) -> &[Stage] {
		&self.history
	}

	fn execute(&mut self, stage: Stage, doc: &mut Document, stats: &mut RemovalStats, finishing: bool) -> Result<()> {
		let relations = self.relations.get(&stage).cloned().unwrap_or_default();

		for dep in relations.run_before {
			if !self.has_run.contains(&dep) {
				self.execute(dep, doc, stats, finishing)?;
			}
		}
		for dep in relations.run_immediately_before {
			self.execute(dep, doc, stats, finishing)?;
		}

		let func = *self.registry.get(&stage).ok_or_else(|| GltfError::UnknownStage {
			name: stage.name().to_owned(),
		})?;
		func(doc, stats)?;
		self.history.push(stage);
		self.has_run.insert(stage);
		self.needs_to_run.retain(|item| *item != stage);

		for dep in relations.run_immediately_after {
			self.execute(dep, doc, stats, finishing)?;
		}
		for dep in relations.run_after {
			if finishing {
				self.execute(dep, doc, stats, true)?;
			} else if !self.needs_to_run.contains(&dep) {
				self.needs_to_run.push(dep);
			}
		}

		Ok(())
	}
}

fn run_remove_unused_attributes(doc: &mut Document, _stats: &mut RemovalStats) -> Result<()> {
	attributes::remove_unused_primitive_attributes(doc);
	Ok(())
}

fn run_remove_unused(doc: &mut Document, stats: &mut RemovalStats) -> Result<()> {
	collect::remove_all_unused(doc, stats);
	Ok(())
}

fn run_merge_buffers(doc: &mut Document, _stats: &mut RemovalStats) -> Result<()> {
	merge::merge_buffers(doc, "buffer_0");
	Ok(())
}

fn run_strip_extras(doc: &mut Document, _stats: &mut RemovalStats) -> Result<()> {
	doc.strip_pipeline_extras();
	Ok(())
}

fn run_passthrough(_doc: &mut Document, _stats: &mut RemovalStats) -> Result<()> {
	Ok(())
}

#[cfg(test)]
mod tests;
