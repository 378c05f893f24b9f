use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::gltf::{GltfError, Result};

/// Identifier of one element within a collection.
///
/// Generation-1 documents key their collections by stable string names;
/// generation-2 documents use dense array indices. Reference fields hold a
/// JSON string or number accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
	/// Dense array position (generation 2).
	Index(usize),
	/// Stable string key (generation 1).
	Name(String),
}

impl ElementId {
	/// Parse a reference value into an identifier, if it is one.
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Number(number) => number.as_u64().map(|idx| Self::Index(idx as usize)),
			Value::String(name) => Some(Self::Name(name.clone())),
			_ => None,
		}
	}

	/// Render the identifier back into a reference value.
	pub fn to_value(&self) -> Value {
		match self {
			Self::Index(idx) => Value::from(*idx as u64),
			Self::Name(name) => Value::from(name.as_str()),
		}
	}
}

impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Index(idx) => write!(f, "{idx}"),
			Self::Name(name) => write!(f, "{name}"),
		}
	}
}

/// Transient per-element processing payload.
///
/// The serialized document never carries this; it exists only while an asset
/// is being transformed and is dropped by [`Document::strip_pipeline_extras`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineExtras {
	/// Raw source bytes backing the element (buffer payload, shader text,
	/// image file contents).
	pub source: Vec<u8>,
	/// Lowercase file extension of the source bytes, when known.
	pub extension: Option<String>,
	/// Marks extras added by the pipeline itself rather than carried in from
	/// the input document.
	pub pipeline_owned: bool,
}

/// One mutable glTF asset graph plus its out-of-band binary payloads.
#[derive(Debug)]
pub struct Document {
	root: Map<String, Value>,
	extras: HashMap<(String, ElementId), PipelineExtras>,
}

impl Document {
	/// Wrap an already-parsed root object.
	pub fn from_root(root: Map<String, Value>) -> Self {
		Self {
			root,
			extras: HashMap::new(),
		}
	}

	/// Parse a JSON document from raw bytes.
	pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
		let value: Value = serde_json::from_slice(bytes)?;
		let Value::Object(root) = value else {
			return Err(GltfError::InvalidDocument {
				reason: "top-level JSON value is not an object",
			});
		};
		Ok(Self::from_root(root))
	}

	/// Serialize the document root to compact JSON bytes.
	pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(&self.root)?)
	}

	/// Serialize the document root to pretty-printed JSON bytes.
	pub fn to_json_bytes_pretty(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec_pretty(&self.root)?)
	}

	/// Borrow the root object.
	pub fn root(&self) -> &Map<String, Value> {
		&self.root
	}

	/// Mutably borrow the root object.
	pub fn root_mut(&mut self) -> &mut Map<String, Value> {
		&mut self.root
	}

	/// Borrow one named collection, if present.
	pub fn collection(&self, category: &str) -> Option<&Value> {
		self.root.get(category)
	}

	/// Mutably borrow one named collection, if present.
	pub fn collection_mut(&mut self, category: &str) -> Option<&mut Value> {
		self.root.get_mut(category)
	}

	/// Enumerate `(id, element)` pairs of one collection in iteration order.
	///
	/// Works for both the array-indexed and the string-keyed collection
	/// forms; an absent or malformed collection yields no pairs.
	pub fn elements(&self, category: &str) -> Vec<(ElementId, &Value)> {
		match self.root.get(category) {
			Some(Value::Array(items)) => items
				.iter()
				.enumerate()
				.map(|(idx, item)| (ElementId::Index(idx), item))
				.collect(),
			Some(Value::Object(map)) => map.iter().map(|(key, item)| (ElementId::Name(key.clone()), item)).collect(),
			_ => Vec::new(),
		}
	}

	/// Enumerate the identifiers of one collection in iteration order.
	pub fn collection_ids(&self, category: &str) -> Vec<ElementId> {
		self.elements(category).into_iter().map(|(id, _)| id).collect()
	}

	/// Number of elements in one collection.
	pub fn collection_len(&self, category: &str) -> usize {
		match self.root.get(category) {
			Some(Value::Array(items)) => items.len(),
			Some(Value::Object(map)) => map.len(),
			_ => 0,
		}
	}

	/// Look up one element by identifier.
	pub fn element(&self, category: &str, id: &ElementId) -> Option<&Value> {
		match (self.root.get(category)?, id) {
			(Value::Array(items), ElementId::Index(idx)) => items.get(*idx),
			(Value::Object(map), ElementId::Name(name)) => map.get(name),
			_ => None,
		}
	}

	/// Mutably look up one element by identifier.
	pub fn element_mut(&mut self, category: &str, id: &ElementId) -> Option<&mut Value> {
		match (self.root.get_mut(category)?, id) {
			(Value::Array(items), ElementId::Index(idx)) => items.get_mut(*idx),
			(Value::Object(map), ElementId::Name(name)) => map.get_mut(name),
			_ => None,
		}
	}

	/// Attach processing payload to one element.
	pub fn set_extras(&mut self, category: &str, id: ElementId, extras: PipelineExtras) {
		self.extras.insert((category.to_owned(), id), extras);
	}

	/// Borrow the processing payload of one element, if any.
	pub fn extras(&self, category: &str, id: &ElementId) -> Option<&PipelineExtras> {
		self.extras.get(&(category.to_owned(), id.clone()))
	}

	/// Remove and return the processing payload of one element.
	pub fn take_extras(&mut self, category: &str, id: &ElementId) -> Option<PipelineExtras> {
		self.extras.remove(&(category.to_owned(), id.clone()))
	}

	/// Drop payloads of pruned elements and rekey surviving array indices.
	///
	/// Called by the pruner after compacting `category`; `remap` maps old
	/// array positions to new ones and absent positions were removed.
	pub fn remap_extras(&mut self, category: &str, remap: &HashMap<usize, usize>) {
		let stale: Vec<_> = self
			.extras
			.keys()
			.filter(|(cat, id)| cat == category && matches!(id, ElementId::Index(_)))
			.cloned()
			.collect();

		let mut rekeyed = Vec::new();
		for key in stale {
			let extras = self.extras.remove(&key).unwrap_or_default();
			let (cat, ElementId::Index(old)) = key else {
				continue;
			};
			if let Some(new) = remap.get(&old) {
				rekeyed.push(((cat, ElementId::Index(*new)), extras));
			}
		}
		self.extras.extend(rekeyed);
	}

	/// Drop payloads of removed string-keyed elements.
	pub fn retain_extras(&mut self, category: &str, keep: impl Fn(&ElementId) -> bool) {
		self.extras.retain(|(cat, id), _| cat != category || keep(id));
	}

	/// The body bytes destined for the container's binary chunk.
	///
	/// After a merge this is the payload of buffer index 0 (generation 2) or
	/// of the sole remaining named buffer (generation 1).
	pub fn binary_payload(&self) -> Option<&[u8]> {
		if let Some(extras) = self.extras.get(&("buffers".to_owned(), ElementId::Index(0))) {
			return Some(&extras.source);
		}
		self.elements("buffers")
			.into_iter()
			.find_map(|(id, _)| self.extras.get(&("buffers".to_owned(), id)).map(|extras| extras.source.as_slice()))
	}

	/// Remove every serialized processing side channel before final emission.
	///
	/// Deletes any `_pipeline` keys an input document carried. The
	/// out-of-band payload map is runtime state that never serializes, so it
	/// is left alone; the encoder still reads the merged buffer payload from
	/// it.
	pub fn strip_pipeline_extras(&mut self) {
		self.root.remove("_pipeline");
		if let Some(Value::Object(extras)) = self.root.get_mut("extras") {
			extras.remove("_pipeline");
		}
		for (_, value) in self.root.iter_mut() {
			strip_pipeline_keys(value);
		}
	}
}

fn strip_pipeline_keys(value: &mut Value) {
	match value {
		Value::Object(map) => {
			map.remove("_pipeline");
			if let Some(Value::Object(extras)) = map.get_mut("extras") {
				extras.remove("_pipeline");
			}
			for (_, item) in map.iter_mut() {
				strip_pipeline_keys(item);
			}
		}
		Value::Array(items) => {
			for item in items {
				strip_pipeline_keys(item);
			}
		}
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::{Document, ElementId, PipelineExtras};

	#[test]
	fn element_lookup_covers_both_collection_forms() {
		let root = json!({
			"nodes": [{"name": "a"}, {"name": "b"}],
			"buffers": {"main": {"byteLength": 4}},
		});
		let serde_json::Value::Object(root) = root else {
			unreachable!()
		};
		let doc = Document::from_root(root);

		assert_eq!(doc.collection_len("nodes"), 2);
		assert_eq!(doc.collection_len("buffers"), 1);
		assert_eq!(doc.collection_len("meshes"), 0);

		let node = doc.element("nodes", &ElementId::Index(1)).expect("node 1 exists");
		assert_eq!(node["name"], "b");
		let buffer = doc.element("buffers", &ElementId::Name("main".to_owned())).expect("buffer exists");
		assert_eq!(buffer["byteLength"], 4);
		assert!(doc.element("nodes", &ElementId::Name("a".to_owned())).is_none());
	}

	#[test]
	fn strip_removes_serialized_pipeline_keys() {
		let root = json!({
			"buffers": {"main": {"byteLength": 4, "extras": {"_pipeline": {}, "keep": 1}}},
			"images": [{"uri": "a.png", "_pipeline": {}}],
		});
		let serde_json::Value::Object(root) = root else {
			unreachable!()
		};
		let mut doc = Document::from_root(root);
		doc.set_extras(
			"buffers",
			ElementId::Name("main".to_owned()),
			PipelineExtras {
				source: vec![1, 2, 3, 4],
				..Default::default()
			},
		);

		doc.strip_pipeline_extras();

		assert!(doc.extras("buffers", &ElementId::Name("main".to_owned())).is_some(), "runtime payload map survives the strip");
		let buffer = doc.element("buffers", &ElementId::Name("main".to_owned())).expect("buffer survives");
		assert_eq!(buffer["extras"], json!({"keep": 1}));
		let image = doc.element("images", &ElementId::Index(0)).expect("image survives");
		assert!(image.get("_pipeline").is_none());
	}
}
