use serde_json::Value;

use crate::util::to_path;
use crate::PointerError;

/// Resolves a pointer against a JSON tree, returning the referenced value.
///
/// The empty pointer refers to the root. Any miss along the way (an
/// absent object key, a non-numeric or out-of-range array index, or a
/// scalar where more segments remain) is `PointerError::DoesNotExist`.
pub fn extract<'a>(root: &'a Value, pointer: &str) -> Result<&'a Value, PointerError> {
    let path = to_path(pointer)?;
    let mut current = root;
    for segment in &path {
        current = step(current, segment)?;
    }
    Ok(current)
}

/// Resolves a pointer to the container holding its final location.
///
/// Returns the mutable parent container plus the final unescaped
/// segment. The final segment is not validated against the container;
/// callers interpret it per operation (including the array-append
/// marker `-`). The empty pointer has no parent.
pub fn extract_parent<'a>(
    root: &'a mut Value,
    pointer: &str,
) -> Result<(&'a mut Value, String), PointerError> {
    let mut path = to_path(pointer)?;
    let last = path.pop().ok_or(PointerError::NoParent)?;
    let mut current = root;
    for segment in &path {
        current = step_mut(current, segment)?;
    }
    Ok((current, last))
}

fn step<'a>(current: &'a Value, segment: &str) -> Result<&'a Value, PointerError> {
    match current {
        Value::Object(map) => map.get(segment).ok_or(PointerError::DoesNotExist),
        Value::Array(arr) => {
            let index: usize = segment.parse().map_err(|_| PointerError::DoesNotExist)?;
            arr.get(index).ok_or(PointerError::DoesNotExist)
        }
        _ => Err(PointerError::DoesNotExist),
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &str) -> Result<&'a mut Value, PointerError> {
    match current {
        Value::Object(map) => map.get_mut(segment).ok_or(PointerError::DoesNotExist),
        Value::Array(arr) => {
            let index: usize = segment.parse().map_err(|_| PointerError::DoesNotExist)?;
            arr.get_mut(index).ok_or(PointerError::DoesNotExist)
        }
        _ => Err(PointerError::DoesNotExist),
    }
}
