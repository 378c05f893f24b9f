use std::collections::HashSet;

use serde_json::Value;

use crate::gltf::{Document, ElementId};

/// Drop primitive attributes no technique parameter consumes.
///
/// For each primitive whose material resolves to a technique, an attribute
/// survives only if some technique parameter declares its semantic. A
/// primitive with no material, or a material with no resolvable technique,
/// is left untouched: upstream passes may legitimately have removed the
/// element it referenced, so missing targets are skipped, not errors.
pub fn remove_unused_primitive_attributes(doc: &mut Document) {
	let mut keep_per_primitive: Vec<(ElementId, usize, HashSet<String>)> = Vec::new();

	for (mesh_id, mesh) in doc.elements("meshes") {
		for (primitive_idx, primitive) in list_items(mesh.get("primitives")).iter().enumerate() {
			let Some(semantics) = technique_semantics(doc, primitive) else {
				continue;
			};
			keep_per_primitive.push((mesh_id.clone(), primitive_idx, semantics));
		}
	}

	for (mesh_id, primitive_idx, semantics) in keep_per_primitive {
		let Some(mesh) = doc.element_mut("meshes", &mesh_id) else {
			continue;
		};
		let Some(Value::Array(primitives)) = mesh.get_mut("primitives") else {
			continue;
		};
		let Some(primitive) = primitives.get_mut(primitive_idx) else {
			continue;
		};
		if let Some(Value::Object(attributes)) = primitive.get_mut("attributes") {
			attributes.retain(|semantic, _| semantics.contains(semantic));
		}
	}
}

/// The set of attribute semantics consumed by a primitive's technique, or
/// `None` when the material/technique chain does not resolve.
fn technique_semantics(doc: &Document, primitive: &Value) -> Option<HashSet<String>> {
	let material_id = ElementId::from_value(primitive.get("material")?)?;
	let material = doc.element("materials", &material_id)?;
	let technique_id = ElementId::from_value(material.get("technique")?)?;
	let technique = doc.element("techniques", &technique_id)?;
	let Value::Object(parameters) = technique.get("parameters")? else {
		return None;
	};

	let mut semantics = HashSet::new();
	for (_, parameter) in parameters {
		if let Some(Value::String(semantic)) = parameter.get("semantic") {
			semantics.insert(semantic.clone());
		}
	}
	Some(semantics)
}

fn list_items(value: Option<&Value>) -> &[Value] {
	match value {
		Some(Value::Array(items)) => items,
		_ => &[],
	}
}

#[cfg(test)]
mod tests {
	use serde_json::{Value, json};

	use super::remove_unused_primitive_attributes;
	use crate::gltf::{Document, ElementId};

	fn doc(value: Value) -> Document {
		let Value::Object(root) = value else {
			panic!("test document must be an object");
		};
		Document::from_root(root)
	}

	#[test]
	fn attributes_without_a_declared_semantic_are_dropped() {
		let mut doc = doc(json!({
			"meshes": [{
				"primitives": [{
					"material": 0,
					"attributes": {"KEEP_1": 0, "KEEP_2": 1, "DROP_3": 2, "KEEP_4": 3, "DROP_5": 4},
				}],
			}],
			"materials": [{"technique": 0}],
			"techniques": [{
				"parameters": {
					"a": {"semantic": "KEEP_1"},
					"b": {"semantic": "KEEP_2"},
					"c": {"semantic": "KEEP_4"},
					"d": {"type": 35676},
				},
			}],
		}));

		remove_unused_primitive_attributes(&mut doc);

		let mesh = doc.element("meshes", &ElementId::Index(0)).expect("mesh survives");
		let attributes = &mesh["primitives"][0]["attributes"];
		assert_eq!(*attributes, json!({"KEEP_1": 0, "KEEP_2": 1, "KEEP_4": 3}));
	}

	#[test]
	fn primitive_without_resolvable_technique_is_left_untouched() {
		let original = json!({
			"meshes": [{
				"primitives": [
					{"attributes": {"POSITION": 0, "UNUSED": 1}},
					{"material": 7, "attributes": {"POSITION": 0}},
				],
			}],
		});
		let mut doc = doc(original.clone());

		remove_unused_primitive_attributes(&mut doc);

		let mesh = doc.element("meshes", &ElementId::Index(0)).expect("mesh survives");
		assert_eq!(*mesh, original["meshes"][0]);
	}
}
