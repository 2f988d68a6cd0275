use crate::PointerError;

/// Unescapes a JSON Pointer segment.
///
/// Per RFC 6901 §4, `~1` is processed before `~0` so that `~01`
/// unescapes to `~1` and not `/`.
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a key for use as a JSON Pointer segment.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace('/', "~1")
}

/// Parses a JSON Pointer into its unescaped segments.
///
/// The empty pointer refers to the root and yields an empty path. Any
/// other pointer must start with `/`.
pub fn to_path(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::InvalidPointer);
    }
    Ok(pointer[1..].split('/').map(unescape_segment).collect())
}
