use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::gltf::{Document, ElementId, PipelineExtras};

/// Concatenate every buffer payload into one backing buffer.
///
/// Payloads are appended in collection iteration order without reordering or
/// padding, so each rebased bufferView offset is exactly
/// `old_offset + cumulative_length_of_preceding_buffers`. Every bufferView
/// is repointed at the merged buffer: by `new_buffer_name` for string-keyed
/// documents, by index 0 for array-indexed ones. A document with fewer than
/// two buffers, or with a buffer whose bytes were never loaded, is returned
/// unchanged.
pub fn merge_buffers(doc: &mut Document, new_buffer_name: &str) {
	let ids = doc.collection_ids("buffers");
	if ids.len() <= 1 {
		return;
	}
	// External buffers whose bytes were never loaded cannot be merged.
	if ids.iter().any(|id| doc.extras("buffers", id).is_none()) {
		return;
	}

	// Running byte offset of each source buffer inside the merged payload.
	let mut base_offsets: HashMap<ElementId, u64> = HashMap::new();
	let mut merged = Vec::new();
	for id in &ids {
		base_offsets.insert(id.clone(), merged.len() as u64);
		if let Some(extras) = doc.take_extras("buffers", id) {
			merged.extend_from_slice(&extras.source);
		}
	}

	let named = matches!(ids.first(), Some(ElementId::Name(_)));
	let merged_id = if named {
		ElementId::Name(new_buffer_name.to_owned())
	} else {
		ElementId::Index(0)
	};
	let merged_ref = merged_id.to_value();

	if let Some(collection) = doc.collection_mut("bufferViews") {
		let views: Vec<&mut Value> = match collection {
			Value::Array(items) => items.iter_mut().collect(),
			Value::Object(map) => map.iter_mut().map(|(_, item)| item).collect(),
			_ => Vec::new(),
		};
		for view in views {
			let Some(buffer) = view.get("buffer").and_then(ElementId::from_value) else {
				continue;
			};
			let base = base_offsets.get(&buffer).copied().unwrap_or(0);
			let old_offset = view.get("byteOffset").and_then(Value::as_u64).unwrap_or(0);
			view["byteOffset"] = Value::from(base + old_offset);
			view["buffer"] = merged_ref.clone();
		}
	}

	let record = merged_buffer_record(doc, &ids, merged.len());
	match doc.collection_mut("buffers") {
		Some(Value::Array(items)) => {
			items.clear();
			items.push(record);
		}
		Some(Value::Object(map)) => {
			map.clear();
			map.insert(new_buffer_name.to_owned(), record);
		}
		_ => {}
	}

	doc.set_extras(
		"buffers",
		merged_id,
		PipelineExtras {
			source: merged,
			extension: Some("bin".to_owned()),
			pipeline_owned: true,
		},
	);
}

/// Build the merged buffer record, carrying over the legacy `type` field
/// when any source buffer declared one.
fn merged_buffer_record(doc: &Document, ids: &[ElementId], byte_length: usize) -> Value {
	let mut record = Map::new();
	record.insert("byteLength".to_owned(), Value::from(byte_length as u64));
	for id in ids {
		if let Some(buffer) = doc.element("buffers", id)
			&& let Some(kind) = buffer.get("type")
		{
			record.insert("type".to_owned(), kind.clone());
			break;
		}
	}
	Value::Object(record)
}
