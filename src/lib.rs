//! Public library API for packing, unpacking, and pruning glTF assets.

/// Container codec, asset-graph pruning, buffer merging, and stage scheduling.
pub mod gltf;
