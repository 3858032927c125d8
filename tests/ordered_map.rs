use std::collections::BTreeMap;

use balanced_maps::harness::{riffle_shuffle, sequential_keys};
use balanced_maps::{BasicRedBlackTree, KeyValueRef, LeftLeaningRedBlackTree, OrderedMap, TwoThreeExternalTree};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Keys drawn from a range smaller than `TEST_SIZE` so inserts collide and deletes hit.
fn key_strategy() -> impl Strategy<Value = u32> {
    0u32..600
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u32, u64),
    Delete(u32),
    Lookup(u32),
    ContainsKey(u32),
    First,
    Last,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), any::<u64>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Delete),
        2 => key_strategy().prop_map(MapOp::Lookup),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        1 => Just(MapOp::First),
        1 => Just(MapOp::Last),
    ]
}

/// Replays `ops` on `tree` and a `BTreeMap`, comparing every result and checking
/// invariants after every mutation.
fn replay<T: OrderedMap<u64> + Default>(ops: &[MapOp]) {
    let mut tree = T::default();
    let mut model = BTreeMap::new();

    for op in ops {
        match *op {
            MapOp::Insert(k, v) => {
                assert_eq!(tree.insert(KeyValueRef::new(k, v)), model.insert(k, v), "insert {k}");
                tree.sanity_check();
            }
            MapOp::Delete(k) => {
                assert_eq!(tree.delete(k), model.remove(&k), "delete {k}");
                tree.sanity_check();
            }
            MapOp::Lookup(k) => assert_eq!(tree.lookup(k), model.get(&k).copied(), "lookup {k}"),
            MapOp::ContainsKey(k) => assert_eq!(tree.contains_key(k), model.contains_key(&k)),
            MapOp::First => {
                assert_eq!(tree.first().map(|e| (e.key, e.payload)), model.first_key_value().map(|(&k, &v)| (k, v)));
            }
            MapOp::Last => {
                assert_eq!(tree.last().map(|e| (e.key, e.payload)), model.last_key_value().map(|(&k, &v)| (k, v)));
            }
        }
        assert_eq!(tree.len(), model.len());
    }

    assert_eq!(tree.key_count(), model.len());
    let tree_items: Vec<_> = tree.iter().map(|e| (e.key, e.payload)).collect();
    let model_items: Vec<_> = model.into_iter().collect();
    assert_eq!(tree_items, model_items, "{} contents mismatch", T::NAME);
}

fn shuffled_keys(n: u32, seed: u64) -> Vec<u32> {
    let mut keys = sequential_keys(n);
    riffle_shuffle(&mut keys, 4, &mut SmallRng::seed_from_u64(seed));
    keys
}

fn filled<T: OrderedMap<u32> + Default>(keys: &[u32]) -> T {
    let mut tree = T::default();
    for &k in keys {
        assert_eq!(tree.insert(KeyValueRef::new(k, k * 10)), None);
        tree.sanity_check();
    }
    tree
}

/// Inserts `1..=1000` shuffled, deletes `374..=872` one key at a time, and checks the
/// survivors.
fn thousand_keys_minus_middle<T: OrderedMap<u32> + Default>() {
    let mut tree = filled::<T>(&shuffled_keys(1000, 0x00C0_FFEE));
    assert_eq!(tree.key_count(), 1000);

    for k in 374..=872 {
        assert_eq!(tree.delete(k), Some(k * 10), "{} delete {k}", T::NAME);
        tree.sanity_check();
    }

    for k in 1..=1000 {
        let expected = if (374..=872).contains(&k) { None } else { Some(k * 10) };
        assert_eq!(tree.lookup(k), expected, "{} lookup {k}", T::NAME);
    }
    assert_eq!(tree.key_count(), 1000 - 499);
    assert!(tree.traverse_in_order().eq((1..=373).chain(873..=1000)));
}

/// Ascending, descending and shuffled inserts give identical contents.
fn insertion_order_is_invisible<T: OrderedMap<u32> + Default>() {
    let ascending = sequential_keys(2_000);
    let descending: Vec<_> = ascending.iter().rev().copied().collect();
    let shuffled = shuffled_keys(2_000, 99);

    let expected: Vec<_> = filled::<T>(&ascending).iter().collect();
    assert_eq!(filled::<T>(&descending).iter().collect::<Vec<_>>(), expected);
    assert_eq!(filled::<T>(&shuffled).iter().collect::<Vec<_>>(), expected);
    assert_eq!(expected.len(), 2_000);
}

/// Re-inserting every key replaces payloads without changing the key count.
fn overwrite_keeps_count<T: OrderedMap<u32> + Default>() {
    let keys = shuffled_keys(500, 7);
    let mut tree = filled::<T>(&keys);
    let before = tree.check_invariants().unwrap();

    for &k in &keys {
        assert_eq!(tree.insert(KeyValueRef::new(k, k + 1)), Some(k * 10));
        tree.sanity_check();
    }
    assert_eq!(tree.key_count(), 500);
    assert_eq!(tree.check_invariants().unwrap(), before);
    assert!(tree.iter().all(|e| e.payload == e.key + 1));
}

/// Deleting absent keys changes nothing, on empty and populated trees.
fn absent_deletes_are_noops<T: OrderedMap<u32> + Default>() {
    let mut tree = T::default();
    assert_eq!(tree.delete(1), None);
    assert!(tree.is_empty());
    tree.sanity_check();

    tree = filled(&[10, 20, 30]);
    for k in [0, 15, 25, 31, u32::MAX] {
        assert_eq!(tree.delete(k), None);
        tree.sanity_check();
    }
    assert!(tree.traverse_in_order().eq([10, 20, 30]));
}

/// `free_all` empties the tree and leaves it ready for reuse.
fn free_all_then_reuse<T: OrderedMap<u32> + Default>() {
    let mut tree = filled::<T>(&shuffled_keys(300, 3));
    tree.free_all();
    assert!(tree.is_empty());
    assert_eq!(tree.key_count(), 0);
    assert_eq!(tree.first(), None);
    tree.sanity_check();

    tree.insert(KeyValueRef::new(42, 0));
    assert_eq!(tree.lookup(42), Some(0));
    tree.sanity_check();
}

/// Extreme keys sort correctly.
fn boundary_keys<T: OrderedMap<u32> + Default>() {
    let mut tree = T::default();
    for k in [u32::MAX, 0, u32::MAX - 1, 1] {
        tree.insert(KeyValueRef::new(k, k));
        tree.sanity_check();
    }
    assert_eq!(tree.lookup(u32::MAX), Some(u32::MAX));
    assert!(tree.traverse_in_order().eq([0, 1, u32::MAX - 1, u32::MAX]));
    assert_eq!(tree.first().map(|e| e.key), Some(0));
    assert_eq!(tree.last().map(|e| e.key), Some(u32::MAX));
}

macro_rules! ordered_map_tests {
    ($module:ident, $tree:ident) => {
        mod $module {
            use super::*;

            #[test]
            fn thousand_keys_minus_middle() {
                super::thousand_keys_minus_middle::<$tree<u32>>();
            }

            #[test]
            fn insertion_order_is_invisible() {
                super::insertion_order_is_invisible::<$tree<u32>>();
            }

            #[test]
            fn overwrite_keeps_count() {
                super::overwrite_keeps_count::<$tree<u32>>();
            }

            #[test]
            fn absent_deletes_are_noops() {
                super::absent_deletes_are_noops::<$tree<u32>>();
            }

            #[test]
            fn free_all_then_reuse() {
                super::free_all_then_reuse::<$tree<u32>>();
            }

            #[test]
            fn boundary_keys() {
                super::boundary_keys::<$tree<u32>>();
            }

            #[test]
            fn is_send_sync() {
                static_assertions::assert_impl_all!($tree<u32>: Send, Sync, Clone, Default);
            }

            proptest! {
                #![proptest_config(ProptestConfig::with_cases(16))]

                #[test]
                fn ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
                    replay::<$tree<u64>>(&ops);
                }
            }
        }
    };
}

ordered_map_tests!(llrb, LeftLeaningRedBlackTree);
ordered_map_tests!(basic_rb, BasicRedBlackTree);
ordered_map_tests!(two_three, TwoThreeExternalTree);

/// All three variants agree with each other on the same workload.
#[test]
fn variants_agree() {
    let keys = shuffled_keys(1_500, 11);
    let llrb: LeftLeaningRedBlackTree<u32> = filled(&keys);
    let basic: BasicRedBlackTree<u32> = filled(&keys);
    let two_three: TwoThreeExternalTree<u32> = filled(&keys);

    let expected: Vec<_> = llrb.iter().collect();
    assert_eq!(basic.iter().collect::<Vec<_>>(), expected);
    assert_eq!(two_three.iter().collect::<Vec<_>>(), expected);
}

#[test]
fn debug_formats_as_map() {
    let tree: TwoThreeExternalTree<u32> = [(2, 20), (1, 10)].into_iter().map(KeyValueRef::from).collect();
    assert_eq!(format!("{tree:?}"), "{1: 10, 2: 20}");
}
