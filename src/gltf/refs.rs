use std::collections::HashSet;

use serde_json::Value;

use crate::gltf::{Document, ElementId};

/// Set of element identifiers observed to be referenced.
pub type UsedIds = HashSet<ElementId>;

/// Collect every identifier referenced by `field_name` across all elements
/// of `source_category`.
///
/// The field may hold a scalar reference, a list of references, or a mapping
/// whose values are references; anything else contributes nothing. An absent
/// source collection yields an empty set.
pub fn used_ids(doc: &Document, source_category: &str, field_name: &str) -> UsedIds {
	let mut used = UsedIds::new();
	for (_, element) in doc.elements(source_category) {
		if let Some(value) = element.get(field_name) {
			collect_reference_values(value, &mut used);
		}
	}
	used
}

/// Collect every node reachable from some scene's root list.
///
/// Reachability follows `children` transitively from each root. The walk is
/// an explicit worklist with a visited set, so reference cycles terminate.
pub fn used_node_ids(doc: &Document) -> UsedIds {
	let mut used = UsedIds::new();
	let mut worklist: Vec<ElementId> = Vec::new();

	for (_, scene) in doc.elements("scenes") {
		if let Some(roots) = scene.get("nodes") {
			collect_reference_values(roots, &mut used);
		}
	}
	worklist.extend(used.iter().cloned());

	while let Some(id) = worklist.pop() {
		let Some(node) = doc.element("nodes", &id) else {
			continue;
		};
		let Some(children) = node.get("children") else {
			continue;
		};
		let mut found = UsedIds::new();
		collect_reference_values(children, &mut found);
		for child in found {
			if used.insert(child.clone()) {
				worklist.push(child);
			}
		}
	}

	used
}

/// Collect every accessor referenced by primitives, skins, and animations.
pub fn used_accessor_ids(doc: &Document) -> UsedIds {
	let mut used = UsedIds::new();

	for (_, mesh) in doc.elements("meshes") {
		for primitive in list_items(mesh.get("primitives")) {
			if let Some(attributes) = primitive.get("attributes") {
				collect_reference_values(attributes, &mut used);
			}
			if let Some(indices) = primitive.get("indices") {
				collect_reference_values(indices, &mut used);
			}
		}
	}

	used.extend(used_ids(doc, "skins", "inverseBindMatrices"));

	for (_, animation) in doc.elements("animations") {
		if let Some(parameters) = animation.get("parameters") {
			collect_reference_values(parameters, &mut used);
		}
		for sampler in sampler_items(animation.get("samplers")) {
			if let Some(input) = sampler.get("input") {
				collect_reference_values(input, &mut used);
			}
			if let Some(output) = sampler.get("output") {
				collect_reference_values(output, &mut used);
			}
		}
	}

	used
}

/// Collect every material referenced by a mesh primitive.
pub fn used_material_ids(doc: &Document) -> UsedIds {
	let mut used = UsedIds::new();
	for (_, mesh) in doc.elements("meshes") {
		for primitive in list_items(mesh.get("primitives")) {
			if let Some(material) = primitive.get("material") {
				collect_reference_values(material, &mut used);
			}
		}
	}
	used
}

/// Collect every bufferView referenced by accessors, images, and embedded
/// binary extensions.
pub fn used_buffer_view_ids(doc: &Document) -> UsedIds {
	let mut used = used_ids(doc, "accessors", "bufferView");
	used.extend(used_ids(doc, "images", "bufferView"));
	for category in ["images", "shaders"] {
		for (_, element) in doc.elements(category) {
			if let Some(view) = embedded_buffer_view(element) {
				collect_reference_values(view, &mut used);
			}
		}
	}
	used
}

/// Collect every texture referenced by materials and techniques.
///
/// Generation-1 references are string values inside `materials[].values` and
/// `techniques[].parameters[*].value`; generation-2 references sit behind an
/// `index` field in the standard texture-info slots of a material.
pub fn used_texture_ids(doc: &Document) -> UsedIds {
	let mut used = UsedIds::new();

	for (_, material) in doc.elements("materials") {
		if let Some(Value::Object(values)) = material.get("values") {
			for (_, value) in values {
				collect_texture_reference(value, &mut used);
			}
		}
		for slot in ["normalTexture", "occlusionTexture", "emissiveTexture"] {
			collect_texture_info(material.get(slot), &mut used);
		}
		if let Some(pbr) = material.get("pbrMetallicRoughness") {
			collect_texture_info(pbr.get("baseColorTexture"), &mut used);
			collect_texture_info(pbr.get("metallicRoughnessTexture"), &mut used);
		}
	}

	for (_, technique) in doc.elements("techniques") {
		if let Some(Value::Object(parameters)) = technique.get("parameters") {
			for (_, parameter) in parameters {
				collect_texture_reference(parameter.get("value").unwrap_or(&Value::Null), &mut used);
			}
		}
	}

	used
}

/// Collect every shader referenced by a program.
pub fn used_shader_ids(doc: &Document) -> UsedIds {
	let mut used = used_ids(doc, "programs", "fragmentShader");
	used.extend(used_ids(doc, "programs", "vertexShader"));
	used
}

/// Identifiers referenced by one animation's channels, against its own
/// sampler collection.
pub fn used_animation_sampler_ids(animation: &Value) -> UsedIds {
	let mut used = UsedIds::new();
	for channel in list_items(animation.get("channels")) {
		if let Some(sampler) = channel.get("sampler") {
			collect_reference_values(sampler, &mut used);
		}
	}
	used
}

/// The `KHR_binary_glTF` bufferView pointer of an element, if present.
pub fn embedded_buffer_view(element: &Value) -> Option<&Value> {
	element.get("extensions")?.get("KHR_binary_glTF")?.get("bufferView")
}

/// Insert every identifier held by a scalar, list, or mapping reference
/// field into `used`.
pub fn collect_reference_values(value: &Value, used: &mut UsedIds) {
	match value {
		Value::Array(items) => {
			for item in items {
				if let Some(id) = ElementId::from_value(item) {
					used.insert(id);
				}
			}
		}
		Value::Object(map) => {
			for (_, item) in map {
				if let Some(id) = ElementId::from_value(item) {
					used.insert(id);
				}
			}
		}
		_ => {
			if let Some(id) = ElementId::from_value(value) {
				used.insert(id);
			}
		}
	}
}

fn collect_texture_reference(value: &Value, used: &mut UsedIds) {
	match value {
		Value::String(name) => {
			used.insert(ElementId::Name(name.clone()));
		}
		// Generation-1 parameter values may be wrapped in a one-element list.
		Value::Array(items) => {
			for item in items {
				if let Value::String(name) = item {
					used.insert(ElementId::Name(name.clone()));
				}
			}
		}
		_ => {}
	}
}

fn collect_texture_info(info: Option<&Value>, used: &mut UsedIds) {
	if let Some(index) = info.and_then(|info| info.get("index"))
		&& let Some(id) = ElementId::from_value(index)
	{
		used.insert(id);
	}
}

fn list_items(value: Option<&Value>) -> &[Value] {
	match value {
		Some(Value::Array(items)) => items,
		_ => &[],
	}
}

/// Iterate an animation's samplers in either collection form.
pub fn sampler_items(value: Option<&Value>) -> Vec<&Value> {
	match value {
		Some(Value::Array(items)) => items.iter().collect(),
		Some(Value::Object(map)) => map.values().collect(),
		_ => Vec::new(),
	}
}
