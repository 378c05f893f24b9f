mod attributes;
mod bytes;
mod collect;
mod container;
mod document;
mod error;
mod file;
mod media;
mod merge;
mod prune;
mod refs;
mod stage;
mod transport;

/// Primitive attribute sanitation entry point.
pub use attributes::remove_unused_primitive_attributes;
/// Padding helpers shared by codec and embedding paths.
pub use bytes::{pad_bytes, pad_to_4};
/// Whole-graph reachability pruning entry points.
pub use collect::{dangling_references, remove_all_unused};
/// Binary container codec types and entry points.
pub use container::{BINARY_BUFFER_NAME, ContainerVersion, DecodedContainer, decode, embed_binary_payloads, encode, is_container};
/// Asset graph, element identity, and processing side-channel types.
pub use document::{Document, ElementId, PipelineExtras};
/// Error and result aliases.
pub use error::{GltfError, Result};
/// File abstraction and source metadata.
pub use file::{GltfFile, SourceForm};
/// MIME lookup and image dimension probes.
pub use media::{extension_from_mime, mime_from_extension, probe_dimensions};
/// Buffer coalescing entry point.
pub use merge::merge_buffers;
/// Element pruning primitives and removal accounting.
pub use prune::{IndexRemap, RemovalStats, prune};
/// Reference scanning entry points.
pub use refs::{UsedIds, used_ids, used_node_ids};
/// Dependency-ordered stage scheduling types.
pub use stage::{Scheduler, Stage, StageConfig, StageFn, StageRelations};
/// Transport compression detection.
pub use transport::{Transport, decode_bytes};
