use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::gltf::refs::UsedIds;
use crate::gltf::{Document, ElementId};

/// Per-category removal counters, kept for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalStats {
	counts: BTreeMap<String, usize>,
}

impl RemovalStats {
	/// Record `removed` removals for `category`.
	pub fn add(&mut self, category: &str, removed: usize) {
		if removed > 0 {
			*self.counts.entry(category.to_owned()).or_insert(0) += removed;
		}
	}

	/// Total removals across all categories.
	pub fn total(&self) -> usize {
		self.counts.values().sum()
	}

	/// Iterate `(category, count)` pairs in category order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.counts.iter().map(|(category, count)| (category.as_str(), *count))
	}
}

/// Old-position to new-position mapping produced by compacting an
/// array-indexed collection.
///
/// String-keyed collections never need remapping; pruning them yields the
/// identity remap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRemap {
	map: Option<HashMap<usize, usize>>,
}

impl IndexRemap {
	/// Remap that leaves every reference unchanged.
	pub fn identity() -> Self {
		Self { map: None }
	}

	/// Remap over explicit old-to-new index pairs.
	pub fn from_map(map: HashMap<usize, usize>) -> Self {
		Self { map: Some(map) }
	}

	/// Whether applying this remap can change anything.
	pub fn is_identity(&self) -> bool {
		match &self.map {
			None => true,
			Some(map) => map.iter().all(|(old, new)| old == new),
		}
	}

	/// Rewrite one scalar reference value in place.
	///
	/// Only integer references move; string references are stable keys. A
	/// reference to a removed position is left untouched, since the caller's
	/// used-set guarantees surviving elements never hold one.
	pub fn apply(&self, reference: &mut Value) {
		let Some(map) = &self.map else {
			return;
		};
		if let Some(old) = reference.as_u64()
			&& let Some(new) = map.get(&(old as usize))
		{
			*reference = Value::from(*new as u64);
		}
	}

	/// Rewrite every reference directly inside a list or mapping field.
	pub fn apply_all(&self, field: &mut Value) {
		if self.map.is_none() {
			return;
		}
		match field {
			Value::Array(items) => {
				for item in items {
					self.apply(item);
				}
			}
			Value::Object(map) => {
				for (_, item) in map.iter_mut() {
					self.apply(item);
				}
			}
			_ => self.apply(field),
		}
	}

	/// Borrow the raw old-to-new mapping, if this remap carries one.
	pub fn as_map(&self) -> Option<&HashMap<usize, usize>> {
		self.map.as_ref()
	}
}

/// Compact an array in place, keeping elements whose index is in `used` and
/// preserving their order.
///
/// Returns the old-to-new index map and the number of removed elements.
pub fn compact_array(items: &mut Vec<Value>, used: &UsedIds) -> (HashMap<usize, usize>, usize) {
	let before = items.len();
	let mut remap = HashMap::new();
	let mut kept = Vec::with_capacity(before);
	for (old, item) in items.drain(..).enumerate() {
		if used.contains(&ElementId::Index(old)) {
			remap.insert(old, kept.len());
			kept.push(item);
		}
	}
	let removed = before - kept.len();
	*items = kept;
	(remap, removed)
}

/// Drop every element of `category` whose identifier is not in `used`.
///
/// Array-indexed collections are compacted preserving order and return the
/// resulting index remap; string-keyed collections filter in place. A
/// missing category is a no-op. Removals are tallied into `stats`.
pub fn prune(doc: &mut Document, category: &str, used: &UsedIds, stats: &mut RemovalStats) -> IndexRemap {
	enum Outcome {
		Untouched,
		Compacted { remap: HashMap<usize, usize>, removed: usize },
		Filtered { removed: usize },
	}

	let outcome = match doc.collection_mut(category) {
		Some(Value::Array(items)) => {
			let (remap, removed) = compact_array(items, used);
			Outcome::Compacted { remap, removed }
		}
		Some(Value::Object(map)) => {
			let before = map.len();
			map.retain(|key, _| used.contains(&ElementId::Name(key.clone())));
			Outcome::Filtered { removed: before - map.len() }
		}
		_ => Outcome::Untouched,
	};

	match outcome {
		Outcome::Untouched => IndexRemap::identity(),
		Outcome::Compacted { remap, removed } => {
			stats.add(category, removed);
			doc.remap_extras(category, &remap);
			IndexRemap::from_map(remap)
		}
		Outcome::Filtered { removed } => {
			stats.add(category, removed);
			doc.retain_extras(category, |id| used.contains(id));
			IndexRemap::identity()
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use serde_json::{Value, json};

	use super::{IndexRemap, RemovalStats, prune};
	use crate::gltf::{Document, ElementId, PipelineExtras};

	fn doc(value: Value) -> Document {
		let Value::Object(root) = value else {
			panic!("test document must be an object");
		};
		Document::from_root(root)
	}

	#[test]
	fn array_prune_compacts_and_reports_remap() {
		let mut doc = doc(json!({"meshes": [{"n": 0}, {"n": 1}, {"n": 2}, {"n": 3}]}));
		let used: HashSet<_> = [ElementId::Index(1), ElementId::Index(3)].into();
		let mut stats = RemovalStats::default();

		let remap = prune(&mut doc, "meshes", &used, &mut stats);

		let Some(Value::Array(items)) = doc.collection("meshes") else {
			panic!("meshes collection survives");
		};
		assert_eq!(items.len(), 2);
		assert_eq!(items[0]["n"], 1);
		assert_eq!(items[1]["n"], 3);

		let map = remap.as_map().expect("array prune yields a map");
		assert_eq!(map.get(&1), Some(&0));
		assert_eq!(map.get(&3), Some(&1));
		assert_eq!(map.get(&0), None);
		assert_eq!(stats.total(), 2);
	}

	#[test]
	fn named_prune_filters_keys_without_remap() {
		let mut doc = doc(json!({"textures": {"a": {}, "b": {}, "c": {}}}));
		let used: HashSet<_> = [ElementId::Name("b".to_owned())].into();
		let mut stats = RemovalStats::default();

		let remap = prune(&mut doc, "textures", &used, &mut stats);

		assert!(remap.is_identity());
		let Some(Value::Object(map)) = doc.collection("textures") else {
			panic!("textures collection survives");
		};
		assert_eq!(map.len(), 1);
		assert!(map.contains_key("b"));
		assert_eq!(stats.total(), 2);
	}

	#[test]
	fn missing_category_is_a_no_op() {
		let mut doc = doc(json!({}));
		let mut stats = RemovalStats::default();
		let remap = prune(&mut doc, "meshes", &HashSet::new(), &mut stats);
		assert!(remap.is_identity());
		assert_eq!(stats.total(), 0);
	}

	#[test]
	fn prune_rekeys_surviving_payloads() {
		let mut doc = doc(json!({"buffers": [{"byteLength": 1}, {"byteLength": 2}]}));
		doc.set_extras(
			"buffers",
			ElementId::Index(1),
			PipelineExtras {
				source: vec![9, 9],
				..Default::default()
			},
		);
		let used: HashSet<_> = [ElementId::Index(1)].into();
		let mut stats = RemovalStats::default();

		prune(&mut doc, "buffers", &used, &mut stats);

		let moved = doc.extras("buffers", &ElementId::Index(0)).expect("payload follows the element");
		assert_eq!(moved.source, vec![9, 9]);
		assert!(doc.extras("buffers", &ElementId::Index(1)).is_none());
	}

	#[test]
	fn remap_rewrites_scalar_list_and_mapping_references() {
		let remap = IndexRemap::from_map([(2_usize, 0_usize), (5, 1)].into());

		let mut scalar = json!(5);
		remap.apply(&mut scalar);
		assert_eq!(scalar, json!(1));

		let mut list = json!([2, 5]);
		remap.apply_all(&mut list);
		assert_eq!(list, json!([0, 1]));

		let mut mapping = json!({"POSITION": 2, "NORMAL": 5});
		remap.apply_all(&mut mapping);
		assert_eq!(mapping, json!({"POSITION": 0, "NORMAL": 1}));

		let mut name = json!("stable");
		remap.apply(&mut name);
		assert_eq!(name, json!("stable"));
	}
}
