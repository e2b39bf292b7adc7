//! Property-based tests for PersistentRankedMap.
//!
//! These tests check the structural invariants after arbitrary mutation
//! sequences, persistence of earlier versions, the point-operation laws, and
//! that every rank-addressed operation agrees with a plain sorted vector.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use proptest::prelude::*;
use rankmap::prelude::*;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

/// Keys come from a small domain so that collisions, replacements and
/// removals of present keys are frequent.
fn key() -> impl Strategy<Value = i32> {
    -50..50_i32
}

fn arbitrary_map(max_size: usize) -> impl Strategy<Value = PersistentRankedMap<i32, i32>> {
    prop::collection::vec((key(), any::<i32>()), 0..max_size)
        .prop_map(|entries| entries.into_iter().collect::<PersistentRankedMap<i32, i32>>())
}

#[derive(Clone, Debug)]
enum Operation {
    Set(i32, i32),
    Clear(i32),
    ClearRange(Option<i32>, Option<i32>),
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => (key(), any::<i32>()).prop_map(|(key, value)| Operation::Set(key, value)),
        3 => key().prop_map(Operation::Clear),
        1 => (prop::option::of(key()), prop::option::of(key()))
            .prop_map(|(start, end)| Operation::ClearRange(start, end)),
    ]
}

fn position<'a>(bound: Option<&'a i32>, missing: Position<&'static i32>) -> Position<&'a i32> {
    bound.map_or(missing, Position::Key)
}

fn entries(map: &PersistentRankedMap<i32, i32>) -> Vec<(i32, i32)> {
    map.iter().map(|(key, value)| (*key, *value)).collect()
}

/// Rank of the last key before the boundary, as a sorted key list sees it.
fn expected_boundary(sorted: &[i32], position: Position<&i32>, inclusive: bool) -> isize {
    let before = match position {
        Position::BeforeStart => 0,
        Position::AfterEnd => sorted.len() + 1,
        Position::Key(bound) => sorted
            .iter()
            .filter(|key| if inclusive { *key <= bound } else { *key < bound })
            .count(),
    };
    before as isize - 1
}

fn boundary_position(choice: u8, key: &i32) -> Position<&i32> {
    match choice % 5 {
        0 => Position::BeforeStart,
        1 => Position::AfterEnd,
        _ => Position::Key(key),
    }
}

// =============================================================================
// Invariant Laws
// =============================================================================

proptest! {
    /// Law: every version produced by any operation sequence is a valid
    /// red-black tree with correct subtree counts and ordered keys, and
    /// matches a `BTreeMap` model.
    #[test]
    fn prop_invariants_hold_after_operations(operations in prop::collection::vec(operation(), 0..120)) {
        let mut map = PersistentRankedMap::new();
        let mut model = std::collections::BTreeMap::new();
        for operation in operations {
            map = match operation {
                Operation::Set(key, value) => {
                    model.insert(key, value);
                    map.set(key, value)
                }
                Operation::Clear(key) => {
                    model.remove(&key);
                    map.clear(&key)
                }
                Operation::ClearRange(start, end) => {
                    model.retain(|key, _| {
                        start.is_some_and(|start| *key < start) || end.is_some_and(|end| *key >= end)
                    });
                    map.clear_range(
                        position(start.as_ref(), Position::BeforeStart),
                        position(end.as_ref(), Position::AfterEnd),
                    )
                }
            };
            prop_assert!(map.validate().is_ok(), "{:?}", map.validate());
            prop_assert_eq!(map.len(), model.len());
        }
        let expected: Vec<(i32, i32)> = model.into_iter().collect();
        prop_assert_eq!(entries(&map), expected);
    }

    /// Law: earlier versions never change.
    #[test]
    fn prop_persistence(map in arbitrary_map(40), key in key(), value: i32) {
        let before = entries(&map);
        let _ = map.set(key, value);
        let _ = map.clear(&key);
        let _ = map.clear_range(Position::Key(&key), Position::AfterEnd);
        prop_assert_eq!(entries(&map), before);
    }
}

// =============================================================================
// Point Operation Laws
// =============================================================================

proptest! {
    /// Law: map.set(key, value).get(&key) == Some(&value)
    #[test]
    fn prop_get_set_law(map in arbitrary_map(40), key in key(), value: i32) {
        let updated = map.set(key, value);
        prop_assert_eq!(updated.get(&key), Some(&value));
    }

    /// Law: key1 != key2 => map.set(key1, value).get(&key2) == map.get(&key2)
    #[test]
    fn prop_set_preserves_other_keys(map in arbitrary_map(40), key1 in key(), key2 in key(), value: i32) {
        prop_assume!(key1 != key2);
        let updated = map.set(key1, value);
        prop_assert_eq!(updated.get(&key2), map.get(&key2));
    }

    /// Law: map.clear(&key).clear(&key) == map.clear(&key)
    #[test]
    fn prop_clear_idempotent(map in arbitrary_map(40), key in key()) {
        let once = map.clear(&key);
        let twice = once.clear(&key);
        prop_assert!(twice.ptr_eq(&once));
        prop_assert_eq!(once.get(&key), None);
    }
}

// =============================================================================
// Rank Laws
// =============================================================================

proptest! {
    /// Law: get_key addresses the rank `boundary + offset` of the sorted keys,
    /// collapsing to a sentinel outside them.
    #[test]
    fn prop_get_key_rank_formula(
        map in arbitrary_map(40),
        key in key(),
        choice: u8,
        inclusive: bool,
        offset in -45..45_isize,
    ) {
        let sorted: Vec<i32> = map.keys().copied().collect();
        let position = boundary_position(choice, &key);
        let rank = expected_boundary(&sorted, position, inclusive) + offset;
        let expected = if rank < 0 {
            Position::BeforeStart
        } else {
            sorted.get(rank as usize).map_or(Position::AfterEnd, Position::Key)
        };
        prop_assert_eq!(map.get_key(position, inclusive, offset), expected);
    }

    /// Law: forward_iter is the suffix of the sorted entries starting at the
    /// clamped rank get_key addresses.
    #[test]
    fn prop_forward_iter_is_suffix(
        map in arbitrary_map(40),
        key in key(),
        choice: u8,
        inclusive: bool,
        offset in -45..45_isize,
    ) {
        let all = entries(&map);
        let sorted: Vec<i32> = all.iter().map(|(key, _)| *key).collect();
        let position = boundary_position(choice, &key);
        let start = (expected_boundary(&sorted, position, inclusive) + offset).clamp(0, all.len() as isize);
        let walked: Vec<(i32, i32)> = map
            .forward_iter(position, inclusive, offset)
            .map(|(key, value)| (*key, *value))
            .collect();
        prop_assert_eq!(walked, all[start as usize..].to_vec());
    }

    /// Law: backward_iter is the reversed prefix of the sorted entries ending
    /// at the rank get_key addresses.
    #[test]
    fn prop_backward_iter_is_reversed_prefix(
        map in arbitrary_map(40),
        key in key(),
        choice: u8,
        inclusive: bool,
        offset in -45..45_isize,
    ) {
        let all = entries(&map);
        let sorted: Vec<i32> = all.iter().map(|(key, _)| *key).collect();
        let position = boundary_position(choice, &key);
        let end = (expected_boundary(&sorted, position, inclusive) + offset + 1).clamp(0, all.len() as isize);
        let mut expected = all[..end as usize].to_vec();
        expected.reverse();
        let walked: Vec<(i32, i32)> = map
            .backward_iter(position, inclusive, offset)
            .map(|(key, value)| (*key, *value))
            .collect();
        prop_assert_eq!(walked, expected);
    }

    /// Law: get_range yields the entries between the two resolved ranks,
    /// in either direction, truncated to the limit.
    #[test]
    fn prop_get_range_matches_slice(
        map in arbitrary_map(40),
        start_key in key(),
        end_key in key(),
        start_offset in -3..4_isize,
        end_offset in -3..4_isize,
        inclusive: (bool, bool),
        reverse: bool,
        limit in prop::option::of(0..10_usize),
    ) {
        let all = entries(&map);
        let sorted: Vec<i32> = all.iter().map(|(key, _)| *key).collect();
        let length = all.len() as isize;
        let first = (expected_boundary(&sorted, Position::Key(&start_key), inclusive.0) + start_offset).clamp(0, length);
        let past = (expected_boundary(&sorted, Position::Key(&end_key), inclusive.1) + end_offset).clamp(0, length);

        let mut expected = if first < past { all[first as usize..past as usize].to_vec() } else { Vec::new() };
        if reverse {
            expected.reverse();
        }
        if let Some(limit) = limit {
            expected.truncate(limit);
        }

        let start = Boundary::key(&start_key).inclusive(inclusive.0).offset(start_offset);
        let end = Boundary::key(&end_key).inclusive(inclusive.1).offset(end_offset);
        let found: Vec<(i32, i32)> = map
            .get_range(start, end, RangeOptions { limit, reverse })
            .map(|(key, value)| (*key, *value))
            .collect();
        prop_assert_eq!(found, expected);
    }

    /// Law: clear_range(start, end) removes exactly the keys in [start, end).
    #[test]
    fn prop_clear_range_half_open(map in arbitrary_map(40), start in key(), end in key()) {
        let cleared = map.clear_range(Position::Key(&start), Position::Key(&end));
        let expected: Vec<(i32, i32)> = entries(&map)
            .into_iter()
            .filter(|(key, _)| *key < start || *key >= end)
            .collect();
        prop_assert_eq!(entries(&cleared), expected);
        prop_assert!(cleared.validate().is_ok());
    }
}
