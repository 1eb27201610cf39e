//! # Ordering
//!
//! Volume and chapter order is stored as list position. A reorder replaces
//! the whole list with a caller-supplied permutation, which must name every
//! current member exactly once. Partial or stale lists are rejected instead
//! of silently dropping the members they omit.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::errors::{AppError, Result};

/// Checks that `requested` is an exact permutation of `current`.
pub fn validate_permutation<T>(current: &[T], requested: &[T]) -> Result<()>
where
    T: Eq + Hash + Display,
{
    let known: HashSet<&T> = current.iter().collect();
    let mut seen: HashSet<&T> = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id) {
            return Err(AppError::validation(format!(
                "reorder references unknown id {id}"
            )));
        }
        if !seen.insert(id) {
            return Err(AppError::validation(format!("reorder lists id {id} twice")));
        }
    }

    if let Some(missing) = current.iter().find(|id| !seen.contains(id)) {
        return Err(AppError::validation(format!(
            "reorder omits id {missing}; the full list of {} ids is required",
            current.len()
        )));
    }

    Ok(())
}

/// Rearranges `items` into the order given by `requested`.
///
/// `key` extracts the id each item is matched on. The permutation is
/// validated first, so every item is kept.
pub fn apply_permutation<T, K, F>(items: Vec<T>, requested: &[K], key: F) -> Result<Vec<T>>
where
    K: Eq + Hash + Display + Clone,
    F: Fn(&T) -> K,
{
    let current: Vec<K> = items.iter().map(&key).collect();
    validate_permutation(&current, requested)?;

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    for id in requested {
        // validated above: every requested id has exactly one slot
        let index = current
            .iter()
            .position(|k| k == id)
            .ok_or_else(|| AppError::internal(format!("id {id} vanished during reorder")))?;
        let item = slots[index]
            .take()
            .ok_or_else(|| AppError::internal(format!("id {id} taken twice during reorder")))?;
        ordered.push(item);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn accepts_any_exact_permutation() {
        let current = ids(4);
        let reversed: Vec<Uuid> = current.iter().rev().copied().collect();
        assert!(validate_permutation(&current, &reversed).is_ok());
        assert!(validate_permutation(&current, &current).is_ok());
    }

    #[test]
    fn empty_list_is_a_valid_permutation_of_nothing() {
        let current: Vec<Uuid> = Vec::new();
        assert!(validate_permutation(&current, &[]).is_ok());
    }

    #[test]
    fn rejects_strict_subset() {
        let current = ids(3);
        let err = validate_permutation(&current, &current[..2]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("omits")));
    }

    #[test]
    fn rejects_unknown_and_duplicate_ids() {
        let current = ids(2);
        let stranger = Uuid::new_v4();
        assert!(validate_permutation(&current, &[current[0], current[1], stranger]).is_err());
        assert!(validate_permutation(&current, &[current[0], current[0]]).is_err());
    }

    #[test]
    fn apply_reorders_items_by_key() {
        let items = vec![("a", 1), ("b", 2), ("c", 3)];
        let ordered = apply_permutation(items, &["c", "a", "b"], |item| item.0).unwrap();
        assert_eq!(ordered, vec![("c", 3), ("a", 1), ("b", 2)]);
    }

    #[test]
    fn apply_rejects_partial_order() {
        let items = vec![("a", 1), ("b", 2)];
        assert!(apply_permutation(items, &["a"], |item| item.0).is_err());
    }
}
