/// Look up the MIME type for a lowercase file extension.
pub fn mime_from_extension(extension: &str) -> Option<&'static str> {
	match extension {
		"png" => Some("image/png"),
		"jpg" | "jpeg" => Some("image/jpeg"),
		"gif" => Some("image/gif"),
		"bmp" => Some("image/bmp"),
		"ktx" => Some("image/ktx"),
		"crn" => Some("image/crn"),
		"glsl" | "vert" | "frag" => Some("text/plain"),
		"bin" => Some("application/octet-stream"),
		_ => None,
	}
}

/// Reverse lookup from a MIME type to its canonical extension.
pub fn extension_from_mime(mime: &str) -> Option<&'static str> {
	match mime {
		"image/png" => Some("png"),
		"image/jpeg" => Some("jpg"),
		"image/gif" => Some("gif"),
		"image/bmp" => Some("bmp"),
		"image/ktx" => Some("ktx"),
		"image/crn" => Some("crn"),
		"text/plain" => Some("glsl"),
		_ => None,
	}
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Probe pixel dimensions from raw image bytes.
///
/// Understands PNG and JPEG, the formats the embedding step annotates.
/// Returns `None` for anything else or for truncated data.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
	if bytes.starts_with(&PNG_SIGNATURE) {
		return png_dimensions(bytes);
	}
	if bytes.starts_with(&[0xFF, 0xD8]) {
		return jpeg_dimensions(bytes);
	}
	None
}

/// Width and height from the IHDR chunk, which the PNG format requires to
/// come first.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
	if bytes.get(12..16)? != b"IHDR" {
		return None;
	}
	let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
	let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
	Some((width, height))
}

/// Walk JPEG segments until a start-of-frame marker carries the dimensions.
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
	let mut pos = 2;
	loop {
		if *bytes.get(pos)? != 0xFF {
			return None;
		}
		let marker = *bytes.get(pos + 1)?;
		// Standalone markers carry no length word.
		if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
			pos += 2;
			continue;
		}
		let length = u16::from_be_bytes(bytes.get(pos + 2..pos + 4)?.try_into().ok()?) as usize;
		if is_start_of_frame(marker) {
			let height = u16::from_be_bytes(bytes.get(pos + 5..pos + 7)?.try_into().ok()?);
			let width = u16::from_be_bytes(bytes.get(pos + 7..pos + 9)?.try_into().ok()?);
			return Some((u32::from(width), u32::from(height)));
		}
		pos += 2 + length;
	}
}

fn is_start_of_frame(marker: u8) -> bool {
	matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}
