use serde_json::Value;

use crate::gltf::prune::{IndexRemap, RemovalStats, compact_array, prune};
use crate::gltf::refs::UsedIds;
use crate::gltf::{Document, ElementId, attributes, refs};

/// Remove every element no longer reachable from the asset graph's roots.
///
/// Categories are pruned parents-first in a fixed order, so an element
/// orphaned by an earlier category's prune is caught later in the same pass:
/// pruning nodes can orphan meshes, pruning meshes orphans accessors and
/// materials, pruning materials orphans techniques, and so on down to
/// shaders. Each category's used-set is computed fresh from the
/// already-pruned upstream state, so orphan cascades resolve in one pass.
///
/// Fields that may legitimately reference out-of-scene nodes (skin joints
/// and skeleton roots, animation channel targets) do not keep nodes alive;
/// after node compaction, surviving references are remapped and stale ones
/// are dropped rather than left aliasing a compacted index.
pub fn remove_all_unused(doc: &mut Document, stats: &mut RemovalStats) {
	let used = refs::used_node_ids(doc);
	let remap = prune(doc, "nodes", &used, stats);
	rewrite_field(doc, "scenes", "nodes", &remap);
	rewrite_field(doc, "nodes", "children", &remap);
	prune_node_references(doc, &used, &remap);

	let used = refs::used_ids(doc, "nodes", "skin");
	let remap = prune(doc, "skins", &used, stats);
	rewrite_field(doc, "nodes", "skin", &remap);

	let used = refs::used_ids(doc, "nodes", "camera");
	let remap = prune(doc, "cameras", &used, stats);
	rewrite_field(doc, "nodes", "camera", &remap);

	let mut used = refs::used_ids(doc, "nodes", "mesh");
	used.extend(refs::used_ids(doc, "nodes", "meshes"));
	let remap = prune(doc, "meshes", &used, stats);
	rewrite_field(doc, "nodes", "mesh", &remap);
	rewrite_field(doc, "nodes", "meshes", &remap);

	let used = refs::used_accessor_ids(doc);
	let remap = prune(doc, "accessors", &used, stats);
	rewrite_primitive_field(doc, "attributes", &remap);
	rewrite_primitive_field(doc, "indices", &remap);
	rewrite_field(doc, "skins", "inverseBindMatrices", &remap);
	rewrite_animation_accessors(doc, &remap);

	let used = refs::used_material_ids(doc);
	let remap = prune(doc, "materials", &used, stats);
	rewrite_primitive_field(doc, "material", &remap);

	let used = refs::used_buffer_view_ids(doc);
	let remap = prune(doc, "bufferViews", &used, stats);
	rewrite_field(doc, "accessors", "bufferView", &remap);
	rewrite_field(doc, "images", "bufferView", &remap);
	rewrite_embedded_views(doc, &remap);

	let used = refs::used_ids(doc, "materials", "technique");
	let remap = prune(doc, "techniques", &used, stats);
	rewrite_field(doc, "materials", "technique", &remap);

	let used = refs::used_texture_ids(doc);
	let remap = prune(doc, "textures", &used, stats);
	rewrite_texture_infos(doc, &remap);

	let used = refs::used_ids(doc, "bufferViews", "buffer");
	let remap = prune(doc, "buffers", &used, stats);
	rewrite_field(doc, "bufferViews", "buffer", &remap);

	let used = refs::used_ids(doc, "techniques", "program");
	let remap = prune(doc, "programs", &used, stats);
	rewrite_field(doc, "techniques", "program", &remap);

	let used = refs::used_ids(doc, "textures", "source");
	let remap = prune(doc, "images", &used, stats);
	rewrite_field(doc, "textures", "source", &remap);

	let used = refs::used_ids(doc, "textures", "sampler");
	let remap = prune(doc, "samplers", &used, stats);
	rewrite_field(doc, "textures", "sampler", &remap);

	let used = refs::used_shader_ids(doc);
	let remap = prune(doc, "shaders", &used, stats);
	rewrite_field(doc, "programs", "fragmentShader", &remap);
	rewrite_field(doc, "programs", "vertexShader", &remap);

	prune_animation_samplers(doc, stats);

	attributes::remove_unused_primitive_attributes(doc);
}

/// Rewrite `category[].field` references through `remap`.
///
/// Handles scalar, list, and mapping field shapes; identity remaps return
/// immediately.
fn rewrite_field(doc: &mut Document, category: &str, field: &str, remap: &IndexRemap) {
	if remap.is_identity() {
		return;
	}
	let Some(collection) = doc.collection_mut(category) else {
		return;
	};
	for element in collection_items_mut(collection) {
		if let Some(value) = element.get_mut(field) {
			remap.apply_all(value);
		}
	}
}

/// Rewrite `meshes[].primitives[].field` references through `remap`.
fn rewrite_primitive_field(doc: &mut Document, field: &str, remap: &IndexRemap) {
	if remap.is_identity() {
		return;
	}
	let Some(collection) = doc.collection_mut("meshes") else {
		return;
	};
	for mesh in collection_items_mut(collection) {
		let Some(Value::Array(primitives)) = mesh.get_mut("primitives") else {
			continue;
		};
		for primitive in primitives {
			if let Some(value) = primitive.get_mut(field) {
				remap.apply_all(value);
			}
		}
	}
}

/// Rewrite accessor references held by animation parameters and samplers.
fn rewrite_animation_accessors(doc: &mut Document, remap: &IndexRemap) {
	if remap.is_identity() {
		return;
	}
	let Some(collection) = doc.collection_mut("animations") else {
		return;
	};
	for animation in collection_items_mut(collection) {
		if let Some(parameters) = animation.get_mut("parameters") {
			remap.apply_all(parameters);
		}
		let Some(samplers) = animation.get_mut("samplers") else {
			continue;
		};
		for sampler in collection_items_mut(samplers) {
			if let Some(input) = sampler.get_mut("input") {
				remap.apply(input);
			}
			if let Some(output) = sampler.get_mut("output") {
				remap.apply(output);
			}
		}
	}
}

/// Rewrite `KHR_binary_glTF` bufferView pointers on images and shaders.
fn rewrite_embedded_views(doc: &mut Document, remap: &IndexRemap) {
	if remap.is_identity() {
		return;
	}
	for category in ["images", "shaders"] {
		let Some(collection) = doc.collection_mut(category) else {
			continue;
		};
		for element in collection_items_mut(collection) {
			let Some(view) = element
				.get_mut("extensions")
				.and_then(|extensions| extensions.get_mut("KHR_binary_glTF"))
				.and_then(|extension| extension.get_mut("bufferView"))
			else {
				continue;
			};
			remap.apply(view);
		}
	}
}

/// Rewrite texture references in the standard material texture-info slots.
///
/// Generation-1 string references are stable keys and never move; only the
/// indexed `index` pointers need rewriting.
fn rewrite_texture_infos(doc: &mut Document, remap: &IndexRemap) {
	if remap.is_identity() {
		return;
	}
	let Some(collection) = doc.collection_mut("materials") else {
		return;
	};
	for material in collection_items_mut(collection) {
		for slot in ["normalTexture", "occlusionTexture", "emissiveTexture"] {
			rewrite_texture_info(material.get_mut(slot), remap);
		}
		if let Some(pbr) = material.get_mut("pbrMetallicRoughness") {
			rewrite_texture_info(pbr.get_mut("baseColorTexture"), remap);
			rewrite_texture_info(pbr.get_mut("metallicRoughnessTexture"), remap);
		}
	}
}

fn rewrite_texture_info(info: Option<&mut Value>, remap: &IndexRemap) {
	if let Some(index) = info.and_then(|info| info.get_mut("index")) {
		remap.apply(index);
	}
}

/// Rewrite or drop node references held outside the reachability walk.
///
/// Skin joints, skeleton roots, and animation channel targets may point at
/// nodes the scene walk never reached. References to surviving nodes are
/// remapped; the rest are dropped, taking the owning channel with them.
fn prune_node_references(doc: &mut Document, used: &UsedIds, remap: &IndexRemap) {
	if let Some(collection) = doc.collection_mut("skins") {
		for skin in collection_items_mut(collection) {
			let keep_skeleton = skin.get("skeleton").is_none_or(|skeleton| node_survives(skeleton, used));
			if keep_skeleton {
				if let Some(skeleton) = skin.get_mut("skeleton") {
					remap.apply(skeleton);
				}
			} else if let Value::Object(fields) = skin {
				fields.remove("skeleton");
			}
			if let Some(Value::Array(joints)) = skin.get_mut("joints") {
				joints.retain(|joint| node_survives(joint, used));
				for joint in joints {
					remap.apply(joint);
				}
			}
		}
	}

	if let Some(collection) = doc.collection_mut("animations") {
		for animation in collection_items_mut(collection) {
			let Some(Value::Array(channels)) = animation.get_mut("channels") else {
				continue;
			};
			channels.retain(|channel| {
				channel
					.get("target")
					.and_then(|target| target.get("node"))
					.is_none_or(|node| node_survives(node, used))
			});
			for channel in channels {
				if let Some(node) = channel.get_mut("target").and_then(|target| target.get_mut("node")) {
					remap.apply(node);
				}
			}
		}
	}
}

fn node_survives(reference: &Value, used: &UsedIds) -> bool {
	ElementId::from_value(reference).is_none_or(|id| used.contains(&id))
}

/// Prune each animation's private sampler collection against its channels.
fn prune_animation_samplers(doc: &mut Document, stats: &mut RemovalStats) {
	let mut removed_total = 0;

	if let Some(collection) = doc.collection_mut("animations") {
		for animation in collection_items_mut(collection) {
			let used = refs::used_animation_sampler_ids(animation);
			let remap = match animation.get_mut("samplers") {
				Some(Value::Array(samplers)) => {
					let (map, removed) = compact_array(samplers, &used);
					removed_total += removed;
					IndexRemap::from_map(map)
				}
				Some(Value::Object(samplers)) => {
					let before = samplers.len();
					samplers.retain(|key, _| used.contains(&ElementId::Name(key.clone())));
					removed_total += before - samplers.len();
					IndexRemap::identity()
				}
				_ => continue,
			};

			if remap.is_identity() {
				continue;
			}
			if let Some(Value::Array(channels)) = animation.get_mut("channels") {
				for channel in channels {
					if let Some(sampler) = channel.get_mut("sampler") {
						remap.apply(sampler);
					}
				}
			}
		}
	}

	stats.add("animationSamplers", removed_total);
}

/// Verify no surviving reference targets a missing element.
///
/// Diagnostic used by tests and the `optimize --check` flow; returns a list
/// of `category[id].field -> target` violation descriptions.
pub fn dangling_references(doc: &Document) -> Vec<String> {
	let mut violations = Vec::new();

	for (id, scene) in doc.elements("scenes") {
		let mut used = UsedIds::new();
		if let Some(roots) = scene.get("nodes") {
			refs::collect_reference_values(roots, &mut used);
		}
		check_targets(doc, &mut violations, "scenes", &id, "nodes", "nodes", &used);
	}

	let flat_edges = [
		("nodes", "children", "nodes"),
		("nodes", "skin", "skins"),
		("nodes", "camera", "cameras"),
		("nodes", "mesh", "meshes"),
		("nodes", "meshes", "meshes"),
		("skins", "skeleton", "nodes"),
		("skins", "joints", "nodes"),
		("skins", "inverseBindMatrices", "accessors"),
		("accessors", "bufferView", "bufferViews"),
		("materials", "technique", "techniques"),
		("bufferViews", "buffer", "buffers"),
		("techniques", "program", "programs"),
		("textures", "source", "images"),
		("textures", "sampler", "samplers"),
		("programs", "fragmentShader", "shaders"),
		("programs", "vertexShader", "shaders"),
	];
	for (source, field, target_category) in flat_edges {
		for (id, element) in doc.elements(source) {
			let mut used = UsedIds::new();
			if let Some(value) = element.get(field) {
				refs::collect_reference_values(value, &mut used);
			}
			check_targets(doc, &mut violations, source, &id, field, target_category, &used);
		}
	}

	for (id, element) in doc.elements("meshes") {
		let mut accessors = UsedIds::new();
		let mut materials = UsedIds::new();
		if let Some(Value::Array(primitives)) = element.get("primitives") {
			for primitive in primitives {
				if let Some(attributes) = primitive.get("attributes") {
					refs::collect_reference_values(attributes, &mut accessors);
				}
				if let Some(indices) = primitive.get("indices") {
					refs::collect_reference_values(indices, &mut accessors);
				}
				if let Some(material) = primitive.get("material") {
					refs::collect_reference_values(material, &mut materials);
				}
			}
		}
		check_targets(doc, &mut violations, "meshes", &id, "primitives.attributes/indices", "accessors", &accessors);
		check_targets(doc, &mut violations, "meshes", &id, "primitives.material", "materials", &materials);
	}

	for (id, animation) in doc.elements("animations") {
		let mut targets = UsedIds::new();
		if let Some(Value::Array(channels)) = animation.get("channels") {
			for channel in channels {
				if let Some(node) = channel.get("target").and_then(|target| target.get("node")) {
					refs::collect_reference_values(node, &mut targets);
				}
			}
		}
		check_targets(doc, &mut violations, "animations", &id, "channels.target.node", "nodes", &targets);

		// Channel samplers resolve against the animation's own collection.
		for sampler_id in refs::used_animation_sampler_ids(animation) {
			let resolved = match (animation.get("samplers"), &sampler_id) {
				(Some(Value::Array(samplers)), ElementId::Index(idx)) => *idx < samplers.len(),
				(Some(Value::Object(samplers)), ElementId::Name(name)) => samplers.contains_key(name),
				_ => false,
			};
			if !resolved {
				violations.push(format!("animations[{id}].channels.sampler -> samplers[{sampler_id}]"));
			}
		}

		// Legacy samplers name entries of the animation's own `parameters`
		// mapping; only that mapping holds accessor references. Current-form
		// samplers reference accessors directly.
		let mut accessors = UsedIds::new();
		if let Some(parameters) = animation.get("parameters") {
			refs::collect_reference_values(parameters, &mut accessors);
			check_targets(doc, &mut violations, "animations", &id, "parameters", "accessors", &accessors);
		} else {
			for sampler in refs::sampler_items(animation.get("samplers")) {
				if let Some(input) = sampler.get("input") {
					refs::collect_reference_values(input, &mut accessors);
				}
				if let Some(output) = sampler.get("output") {
					refs::collect_reference_values(output, &mut accessors);
				}
			}
			check_targets(doc, &mut violations, "animations", &id, "samplers.input/output", "accessors", &accessors);
		}
	}

	violations
}

fn check_targets(
	doc: &Document,
	violations: &mut Vec<String>,
	source: &str,
	id: &ElementId,
	field: &str,
	target_category: &str,
	used: &UsedIds,
) {
	for target in used {
		if doc.element(target_category, target).is_none() {
			violations.push(format!("{source}[{id}].{field} -> {target_category}[{target}]"));
		}
	}
}

fn collection_items_mut(collection: &mut Value) -> Vec<&mut Value> {
	match collection {
		Value::Array(items) => items.iter_mut().collect(),
		Value::Object(map) => map.iter_mut().map(|(_, item)| item).collect(),
		_ => Vec::new(),
	}
}
