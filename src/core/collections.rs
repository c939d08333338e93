//! Invariant-preserving accessors for keyed and indexed collections.
//!
//! Collections are manipulated inside guard and action code that must not
//! crash the host process, so every violation is an explicit error: `Get` on
//! a missing key names the key, index accessors bounds-check and name both
//! the index and the length, and a failed remove leaves the collection
//! untouched.

use std::collections::BTreeMap;

use crate::core::error::HelmsmanError;

/// Keyed lookup with a named not-found error: `"<kind> not found: <key>"`.
pub fn keyed_get<'a, V>(
    map: &'a BTreeMap<String, V>,
    kind: &str,
    key: &str,
) -> Result<&'a V, HelmsmanError> {
    map.get(key)
        .ok_or_else(|| HelmsmanError::NotFound(format!("{} not found: {}", kind, key)))
}

pub fn keyed_get_mut<'a, V>(
    map: &'a mut BTreeMap<String, V>,
    kind: &str,
    key: &str,
) -> Result<&'a mut V, HelmsmanError> {
    map.get_mut(key)
        .ok_or_else(|| HelmsmanError::NotFound(format!("{} not found: {}", kind, key)))
}

fn check_index(index: i64, len: usize) -> Result<usize, HelmsmanError> {
    // Negative indices are always out of range; no wrap-around semantics.
    if index < 0 || index as usize >= len {
        return Err(HelmsmanError::NotFound(format!(
            "index out of range: {} (length: {})",
            index, len
        )));
    }
    Ok(index as usize)
}

/// Bounds-checked indexed lookup.
pub fn indexed_get<T>(items: &[T], index: i64) -> Result<&T, HelmsmanError> {
    let i = check_index(index, items.len())?;
    Ok(&items[i])
}

pub fn indexed_get_mut<T>(items: &mut [T], index: i64) -> Result<&mut T, HelmsmanError> {
    let i = check_index(index, items.len())?;
    Ok(&mut items[i])
}

/// Bounds-checked remove. On an out-of-range index the collection length is
/// unchanged and the bounds error is returned.
pub fn indexed_remove<T>(items: &mut Vec<T>, index: i64) -> Result<T, HelmsmanError> {
    let i = check_index(index, items.len())?;
    Ok(items.remove(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> BTreeMap<String, u32> {
        let mut m = BTreeMap::new();
        m.insert("planning".to_string(), 1);
        m
    }

    #[test]
    fn test_keyed_get_names_kind_and_key() {
        let m = sample_map();
        assert_eq!(*keyed_get(&m, "phase", "planning").unwrap(), 1);
        let err = keyed_get(&m, "phase", "review").unwrap_err();
        assert_eq!(err.to_string(), "phase not found: review");
    }

    #[test]
    fn test_keyed_get_on_empty_map() {
        let m: BTreeMap<String, u32> = BTreeMap::new();
        assert!(keyed_get(&m, "phase", "planning").is_err());
    }

    #[test]
    fn test_indexed_get_bounds() {
        let items = vec!["a", "b"];
        assert_eq!(*indexed_get(&items, 0).unwrap(), "a");
        let err = indexed_get(&items, 2).unwrap_err();
        assert!(err.to_string().contains("index out of range: 2 (length: 2)"));
    }

    #[test]
    fn test_negative_index_always_out_of_range() {
        let items = vec!["a", "b"];
        let err = indexed_get(&items, -1).unwrap_err();
        assert!(err.to_string().contains("index out of range: -1 (length: 2)"));
    }

    #[test]
    fn test_indexed_remove_leaves_length_on_error() {
        let mut items = vec![1, 2, 3];
        assert!(indexed_remove(&mut items, 5).is_err());
        assert_eq!(items.len(), 3);
        assert!(indexed_remove(&mut items, -2).is_err());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_indexed_remove_in_range() {
        let mut items = vec![1, 2, 3];
        assert_eq!(indexed_remove(&mut items, 1).unwrap(), 2);
        assert_eq!(items, vec![1, 3]);
    }
}
