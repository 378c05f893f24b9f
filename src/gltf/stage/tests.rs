use std::collections::HashMap;

use serde_json::json;

use crate::gltf::prune::RemovalStats;
use crate::gltf::stage::{Scheduler, Stage, StageConfig, StageFn, StageRelations};
use crate::gltf::{Document, GltfError};

fn empty_doc() -> Document {
	let serde_json::Value::Object(root) = json!({}) else {
		unreachable!()
	};
	Document::from_root(root)
}

fn noop(_: &mut crate::gltf::Document, _: &mut RemovalStats) -> crate::gltf::Result<()> {
	Ok(())
}

fn noop_registry(stages: &[Stage]) -> HashMap<Stage, StageFn> {
	stages.iter().map(|stage| (*stage, noop as StageFn)).collect()
}

#[test]
fn soft_dependencies_run_once_ahead_of_the_stage() {
	let mut scheduler = Scheduler::standard();
	let mut doc = empty_doc();
	let mut stats = RemovalStats::default();

	scheduler.run(Stage::MergeBuffers, &mut doc, &mut stats).expect("run succeeds");
	assert_eq!(
		scheduler.history(),
		&[Stage::RemoveUnusedAttributes, Stage::RemoveUnused, Stage::MergeBuffers]
	);

	// Satisfied soft dependencies are not re-entered on a second run.
	scheduler.run(Stage::MergeBuffers, &mut doc, &mut stats).expect("second run succeeds");
	assert_eq!(
		scheduler.history(),
		&[
			Stage::RemoveUnusedAttributes,
			Stage::RemoveUnused,
			Stage::MergeBuffers,
			Stage::MergeBuffers,
		]
	);
}

#[test]
fn immediate_dependencies_rerun_every_time() {
	let mut scheduler = Scheduler::new(noop_registry(&[Stage::MergeBuffers, Stage::StripExtras, Stage::GenerateNormals]));
	scheduler.set_relations(
		Stage::MergeBuffers,
		StageRelations {
			run_immediately_before: vec![Stage::StripExtras],
			run_immediately_after: vec![Stage::GenerateNormals],
			..Default::default()
		},
	);
	let mut doc = empty_doc();
	let mut stats = RemovalStats::default();

	scheduler.run(Stage::MergeBuffers, &mut doc, &mut stats).expect("run succeeds");
	scheduler.run(Stage::MergeBuffers, &mut doc, &mut stats).expect("second run succeeds");

	assert_eq!(
		scheduler.history(),
		&[
			Stage::StripExtras,
			Stage::MergeBuffers,
			Stage::GenerateNormals,
			Stage::StripExtras,
			Stage::MergeBuffers,
			Stage::GenerateNormals,
		]
	);
}

#[test]
fn deferred_dependencies_wait_for_finish() {
	let mut scheduler = Scheduler::standard();
	let mut doc = empty_doc();
	let mut stats = RemovalStats::default();

	scheduler.run(Stage::Quantize, &mut doc, &mut stats).expect("run succeeds");
	// The deferred removeUnused is flagged, not entered.
	assert_eq!(scheduler.history(), &[Stage::GenerateNormals, Stage::Quantize]);

	scheduler.finish(&mut doc, &mut stats).expect("finish succeeds");
	let history = scheduler.history().to_vec();
	assert_eq!(history.last(), Some(&Stage::RemoveUnused));
	assert!(history.contains(&Stage::RemoveUnusedAttributes), "finish satisfies the swept stage's own dependencies");

	// Nothing is left permanently deferred.
	scheduler.finish(&mut doc, &mut stats).expect("idle finish succeeds");
	assert_eq!(scheduler.history().len(), history.len());
}

#[test]
fn external_config_extends_relations() {
	let mut scheduler = Scheduler::new(noop_registry(&[Stage::MergeBuffers, Stage::RemoveUnused, Stage::StripExtras]));
	scheduler.apply_config(
		Stage::MergeBuffers,
		&StageConfig {
			before: vec![Stage::RemoveUnused],
			after: vec![Stage::StripExtras],
		},
	);
	let mut doc = empty_doc();
	let mut stats = RemovalStats::default();

	scheduler.run(Stage::MergeBuffers, &mut doc, &mut stats).expect("run succeeds");
	assert_eq!(scheduler.history(), &[Stage::RemoveUnused, Stage::MergeBuffers]);

	scheduler.finish(&mut doc, &mut stats).expect("finish succeeds");
	assert_eq!(scheduler.history(), &[Stage::RemoveUnused, Stage::MergeBuffers, Stage::StripExtras]);
}

#[test]
fn missing_stage_implementation_is_a_configuration_error() {
	let mut scheduler = Scheduler::new(HashMap::new());
	let mut doc = empty_doc();
	let mut stats = RemovalStats::default();

	let err = scheduler
		.run(Stage::RemoveUnused, &mut doc, &mut stats)
		.expect_err("unregistered stage fails");
	assert!(matches!(err, GltfError::UnknownStage { name } if name == "removeUnused"));
}

#[test]
fn stage_names_round_trip_and_reject_unknowns() {
	for stage in [
		Stage::RemoveUnusedAttributes,
		Stage::RemoveUnused,
		Stage::MergeBuffers,
		Stage::StripExtras,
		Stage::GenerateNormals,
		Stage::Quantize,
	] {
		assert_eq!(Stage::parse(stage.name()).expect("name resolves"), stage);
	}
	assert!(matches!(
		Stage::parse("bakeAmbientOcclusion"),
		Err(GltfError::UnknownStage { name }) if name == "bakeAmbientOcclusion"
	));
}
