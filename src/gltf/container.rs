use serde_json::{Map, Value};

use crate::gltf::bytes::{Cursor, pad_bytes};
use crate::gltf::{Document, ElementId, GltfError, PipelineExtras, Result, media, refs};

/// Leading container magic, `"glTF"` in ASCII.
pub const MAGIC: [u8; 4] = *b"glTF";
/// Version-2 JSON chunk type tag (`0x4E4F534A`, `"JSON"`).
pub const CHUNK_JSON: [u8; 4] = *b"JSON";
/// Version-2 binary chunk type tag (`0x004E4942`, `"BIN\0"`).
pub const CHUNK_BIN: [u8; 4] = [b'B', b'I', b'N', 0];

/// Name of the synthetic buffer backing a version-1 binary body.
pub const BINARY_BUFFER_NAME: &str = "binary_glTF";

/// Container format generation a byte stream was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerVersion {
	/// Legacy 20-byte header with an implicit binary body.
	V1,
	/// Chunked current format.
	V2,
}

impl ContainerVersion {
	/// Render the version as a stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::V1 => "1",
			Self::V2 => "2",
		}
	}
}

/// Result of decoding one binary container.
pub struct DecodedContainer {
	/// The parsed asset graph, binary payload attached out-of-band.
	pub document: Document,
	/// Format generation the input declared.
	pub version: ContainerVersion,
	/// Byte length of the JSON region.
	pub json_length: usize,
	/// Byte length of the binary region, 0 when absent.
	pub binary_length: usize,
}

/// Serialize a document into a version-2 container.
///
/// The JSON chunk is padded with trailing spaces and the binary chunk with
/// trailing zeros, keeping every chunk 4-byte aligned; the declared total
/// length equals the emitted byte count.
pub fn encode(doc: &Document) -> Result<Vec<u8>> {
	let mut json = doc.to_json_bytes()?;
	pad_bytes(&mut json, b' ');

	let binary = doc.binary_payload().map(|payload| {
		let mut body = payload.to_vec();
		pad_bytes(&mut body, 0);
		body
	});

	let mut total = 12 + 8 + json.len();
	if let Some(body) = &binary {
		total += 8 + body.len();
	}

	let mut out = Vec::with_capacity(total);
	out.extend_from_slice(&MAGIC);
	out.extend_from_slice(&2_u32.to_le_bytes());
	out.extend_from_slice(&(total as u32).to_le_bytes());
	out.extend_from_slice(&(json.len() as u32).to_le_bytes());
	out.extend_from_slice(&CHUNK_JSON);
	out.extend_from_slice(&json);
	if let Some(body) = binary {
		out.extend_from_slice(&(body.len() as u32).to_le_bytes());
		out.extend_from_slice(&CHUNK_BIN);
		out.extend_from_slice(&body);
	}

	Ok(out)
}

/// Parse a binary container of either generation.
pub fn decode(bytes: &[u8]) -> Result<DecodedContainer> {
	let mut cursor = Cursor::new(bytes);

	let magic = cursor.read_tag4()?;
	if magic != MAGIC {
		return Err(GltfError::UnknownMagic { magic });
	}

	let version = cursor.read_u32_le()?;
	let declared = cursor.read_u32_le()?;
	if u64::from(declared) != bytes.len() as u64 {
		return Err(GltfError::LengthMismatch {
			declared: u64::from(declared),
			actual: bytes.len() as u64,
		});
	}

	match version {
		1 => decode_v1(&mut cursor),
		2 => decode_v2(&mut cursor),
		other => Err(GltfError::UnsupportedVersion { version: other }),
	}
}

/// Whether a byte stream starts with the container magic.
pub fn is_container(bytes: &[u8]) -> bool {
	bytes.starts_with(&MAGIC)
}

fn decode_v1(cursor: &mut Cursor<'_>) -> Result<DecodedContainer> {
	let scene_length = cursor.read_u32_le()? as usize;
	let scene_format = cursor.read_u32_le()?;
	if scene_format != 0 {
		return Err(GltfError::SceneFormatNotJson { format: scene_format });
	}

	if scene_length > cursor.remaining() {
		return Err(GltfError::ChunkLenOutOfRange {
			at: cursor.pos(),
			len: scene_length as u64,
			rem: cursor.remaining(),
		});
	}

	let json = cursor.read_exact(scene_length)?;
	let mut document = Document::from_json_bytes(json)?;
	let body = cursor.read_exact(cursor.remaining())?;

	if !body.is_empty() {
		attach_v1_body(&mut document, body);
	}

	Ok(DecodedContainer {
		document,
		version: ContainerVersion::V1,
		json_length: scene_length,
		binary_length: body.len(),
	})
}

fn decode_v2(cursor: &mut Cursor<'_>) -> Result<DecodedContainer> {
	let mut json: Option<&[u8]> = None;
	let mut binary: Option<&[u8]> = None;

	while cursor.remaining() > 0 {
		let at = cursor.pos();
		let length = cursor.read_u32_le()? as usize;
		let tag = cursor.read_tag4()?;
		if length > cursor.remaining() {
			return Err(GltfError::ChunkLenOutOfRange {
				at,
				len: length as u64,
				rem: cursor.remaining(),
			});
		}
		let payload = cursor.read_exact(length)?;

		if tag == CHUNK_JSON {
			json.get_or_insert(payload);
		} else if tag == CHUNK_BIN {
			binary.get_or_insert(payload);
		}
		// Unknown chunk types are skipped, per the format's forward
		// compatibility rule.
	}

	let json = json.ok_or(GltfError::MissingJsonChunk)?;
	let mut document = Document::from_json_bytes(json)?;

	let binary_length = binary.map_or(0, <[u8]>::len);
	if let Some(payload) = binary {
		if document.collection_len("buffers") == 0 {
			let mut record = Map::new();
			record.insert("byteLength".to_owned(), Value::from(payload.len() as u64));
			document.root_mut().insert("buffers".to_owned(), Value::Array(vec![Value::Object(record)]));
		}
		document.set_extras(
			"buffers",
			ElementId::Index(0),
			PipelineExtras {
				source: payload.to_vec(),
				extension: Some("bin".to_owned()),
				pipeline_owned: true,
			},
		);
	}

	Ok(DecodedContainer {
		document,
		version: ContainerVersion::V2,
		json_length: json.len(),
		binary_length,
	})
}

/// Attach a version-1 body as the synthetic `binary_glTF` buffer and load
/// the bytes of every element embedded in it.
fn attach_v1_body(doc: &mut Document, body: &[u8]) {
	let buffer_id = ElementId::Name(BINARY_BUFFER_NAME.to_owned());
	if doc.element("buffers", &buffer_id).is_none() {
		let mut record = Map::new();
		record.insert("byteLength".to_owned(), Value::from(body.len() as u64));
		record.insert("type".to_owned(), Value::from("arraybuffer"));
		match doc.root_mut().get_mut("buffers") {
			Some(Value::Object(buffers)) => {
				buffers.insert(BINARY_BUFFER_NAME.to_owned(), Value::Object(record));
			}
			_ => {
				let mut buffers = Map::new();
				buffers.insert(BINARY_BUFFER_NAME.to_owned(), Value::Object(record));
				doc.root_mut().insert("buffers".to_owned(), Value::Object(buffers));
			}
		}
	}
	doc.set_extras(
		"buffers",
		buffer_id,
		PipelineExtras {
			source: body.to_vec(),
			extension: Some("bin".to_owned()),
			pipeline_owned: true,
		},
	);

	resolve_embedded(doc, "shaders", body);
	resolve_embedded(doc, "images", body);
}

/// Load the source bytes of every `KHR_binary_glTF` element of one category
/// out of the shared body.
///
/// Elements whose bufferView does not resolve, or resolves against a buffer
/// other than the synthetic body, are skipped rather than failed: upstream
/// edits may have removed what they point at.
fn resolve_embedded(doc: &mut Document, category: &str, body: &[u8]) {
	let mut loaded: Vec<(ElementId, PipelineExtras)> = Vec::new();

	for (id, element) in doc.elements(category) {
		let Some(view_id) = refs::embedded_buffer_view(element).and_then(ElementId::from_value) else {
			continue;
		};
		let Some(view) = doc.element("bufferViews", &view_id) else {
			continue;
		};
		if view.get("buffer").and_then(Value::as_str) != Some(BINARY_BUFFER_NAME) {
			continue;
		}
		let offset = view.get("byteOffset").and_then(Value::as_u64).unwrap_or(0) as usize;
		let length = view.get("byteLength").and_then(Value::as_u64).unwrap_or(0) as usize;
		let Some(source) = body.get(offset..offset + length) else {
			continue;
		};

		let extension = match category {
			"shaders" => Some("glsl".to_owned()),
			_ => element
				.get("extensions")
				.and_then(|extensions| extensions.get("KHR_binary_glTF"))
				.and_then(|extension| extension.get("mimeType"))
				.and_then(Value::as_str)
				.and_then(media::extension_from_mime)
				.map(str::to_owned),
		};

		loaded.push((
			id,
			PipelineExtras {
				source: source.to_vec(),
				extension,
				pipeline_owned: false,
			},
		));
	}

	for (id, extras) in loaded {
		doc.set_extras(category, id, extras);
	}
}

/// Embed shader and image payloads into the shared binary body.
///
/// The body starts with the (merged) buffer payload; each embedded element
/// gets a fresh bufferView at the running 4-byte-aligned write offset and a
/// `KHR_binary_glTF` extension pointing at it. Images additionally record
/// their mimeType and probed pixel dimensions, except for compressed
/// container formats (ktx, crn) that downstream consumers read without
/// dimension metadata.
pub fn embed_binary_payloads(doc: &mut Document) {
	let mut body = doc.binary_payload().map(<[u8]>::to_vec).unwrap_or_default();
	let buffer_ref = rename_body_buffer(doc);

	embed_category(doc, "shaders", &buffer_ref, &mut body);
	embed_category(doc, "images", &buffer_ref, &mut body);

	let buffer_id = ElementId::from_value(&buffer_ref).unwrap_or(ElementId::Index(0));
	if let Some(record) = doc.element_mut("buffers", &buffer_id) {
		record["byteLength"] = Value::from(body.len() as u64);
	}
	doc.set_extras(
		"buffers",
		buffer_id,
		PipelineExtras {
			source: body,
			extension: Some("bin".to_owned()),
			pipeline_owned: true,
		},
	);
}

/// Rename a string-keyed document's sole buffer to the synthetic body name
/// and repoint every view at it. Indexed documents keep buffer 0.
fn rename_body_buffer(doc: &mut Document) -> Value {
	let ids = doc.collection_ids("buffers");
	match ids.first() {
		Some(ElementId::Name(old_name)) => {
			let old_name = old_name.clone();
			if old_name != BINARY_BUFFER_NAME
				&& let Some(Value::Object(buffers)) = doc.collection_mut("buffers")
				&& let Some(record) = buffers.remove(&old_name)
			{
				buffers.insert(BINARY_BUFFER_NAME.to_owned(), record);
				if let Some(Value::Object(views)) = doc.collection_mut("bufferViews") {
					for (_, view) in views.iter_mut() {
						if view.get("buffer").and_then(Value::as_str) == Some(old_name.as_str()) {
							view["buffer"] = Value::from(BINARY_BUFFER_NAME);
						}
					}
				}
				let old_id = ElementId::Name(old_name);
				if let Some(extras) = doc.take_extras("buffers", &old_id) {
					doc.set_extras("buffers", ElementId::Name(BINARY_BUFFER_NAME.to_owned()), extras);
				}
			}
			Value::from(BINARY_BUFFER_NAME)
		}
		_ => Value::from(0_u64),
	}
}

fn embed_category(doc: &mut Document, category: &str, buffer_ref: &Value, body: &mut Vec<u8>) {
	for id in doc.collection_ids(category) {
		let Some(extras) = doc.extras(category, &id) else {
			continue;
		};
		if extras.source.is_empty() {
			continue;
		}
		let source = extras.source.clone();
		let extension = extras.extension.clone();

		pad_bytes(body, 0);
		let offset = body.len();
		body.extend_from_slice(&source);

		let mut view = Map::new();
		view.insert("buffer".to_owned(), buffer_ref.clone());
		view.insert("byteOffset".to_owned(), Value::from(offset as u64));
		view.insert("byteLength".to_owned(), Value::from(source.len() as u64));
		let view_ref = push_buffer_view(doc, Value::Object(view));

		let mut extension_record = Map::new();
		extension_record.insert("bufferView".to_owned(), view_ref);
		if category == "images" {
			let ext = extension.as_deref().unwrap_or("");
			if let Some(mime) = media::mime_from_extension(ext) {
				extension_record.insert("mimeType".to_owned(), Value::from(mime));
			}
			if !matches!(ext, "ktx" | "crn")
				&& let Some((width, height)) = media::probe_dimensions(&source)
			{
				extension_record.insert("width".to_owned(), Value::from(width));
				extension_record.insert("height".to_owned(), Value::from(height));
			}
		}

		let Some(element) = doc.element_mut(category, &id) else {
			continue;
		};
		if let Value::Object(fields) = element {
			fields.remove("uri");
			let extensions = fields.entry("extensions".to_owned()).or_insert_with(|| Value::Object(Map::new()));
			if let Value::Object(extensions) = extensions {
				extensions.insert("KHR_binary_glTF".to_owned(), Value::Object(extension_record));
			}
		}
	}
}

/// Append one bufferView record, returning the reference value for it.
fn push_buffer_view(doc: &mut Document, record: Value) -> Value {
	match doc.collection_mut("bufferViews") {
		Some(Value::Array(views)) => {
			views.push(record);
			Value::from((views.len() - 1) as u64)
		}
		Some(Value::Object(views)) => {
			let mut n = views.len();
			let mut key = format!("binary_bufferView_{n}");
			while views.contains_key(&key) {
				n += 1;
				key = format!("binary_bufferView_{n}");
			}
			views.insert(key.clone(), record);
			Value::from(key)
		}
		_ => {
			let mut views = Map::new();
			views.insert("binary_bufferView_0".to_owned(), record);
			doc.root_mut().insert("bufferViews".to_owned(), Value::Object(views));
			Value::from("binary_bufferView_0")
		}
	}
}
