//! Behavioral properties of both engines under randomized workloads,
//! checked against simple shadow models.

use grove::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

fn contents(tree: &OrdTree<u32>) -> Vec<u32> {
    tree.iter().copied().collect()
}

#[test]
fn tree_matches_shadow_model_under_random_workload() {
    for seed in [1u64, 42, 0xfeed] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tree: OrdTree<u32> = OrdTree::create(96).unwrap();
        let mut shadow: Vec<u32> = Vec::new();

        for round in 0..3_000 {
            let v = rng.gen_range(0..80u32);
            match rng.gen_range(0..4) {
                0 if !tree.is_full() => {
                    let (_, inserted) = tree.insert_unique(v).unwrap();
                    assert_eq!(inserted, !shadow.contains(&v));
                    if inserted {
                        let at = shadow.partition_point(|x| *x < v);
                        shadow.insert(at, v);
                    }
                }
                1 if !tree.is_full() => {
                    tree.insert_equal(v).unwrap();
                    let at = shadow.partition_point(|x| *x <= v);
                    shadow.insert(at, v);
                }
                2 => {
                    let erased = tree.erase(&v) as usize;
                    let before = shadow.len();
                    shadow.retain(|x| *x != v);
                    assert_eq!(erased, before - shadow.len());
                }
                _ => {
                    assert_eq!(tree.contains(&v), shadow.contains(&v));
                    assert_eq!(
                        tree.count(&v) as usize,
                        shadow.iter().filter(|x| **x == v).count()
                    );
                }
            }

            assert_eq!(tree.len() as usize, shadow.len());
            if round % 101 == 0 {
                tree.check_invariants().unwrap();
                assert_eq!(contents(&tree), shadow);
            }
        }
        tree.check_invariants().unwrap();
        assert_eq!(contents(&tree), shadow);
    }
}

#[test]
fn bounds_agree_with_shadow_model() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut tree: OrdTree<u32> = OrdTree::create(64).unwrap();
    let mut shadow: Vec<u32> = Vec::new();

    for _ in 0..64 {
        let v = rng.gen_range(0..40u32) * 2; // even values only
        if tree.insert_equal(v).is_ok() {
            let at = shadow.partition_point(|x| *x <= v);
            shadow.insert(at, v);
        }
    }

    for probe in 0..82u32 {
        let lb = tree.lower_bound(&probe);
        let ub = tree.upper_bound(&probe);
        let expected_lb = shadow.iter().find(|x| **x >= probe).copied();
        let expected_ub = shadow.iter().find(|x| **x > probe).copied();
        assert_eq!(tree.get(lb).copied(), expected_lb, "lower_bound({probe})");
        assert_eq!(tree.get(ub).copied(), expected_ub, "upper_bound({probe})");

        let (mut lo, hi) = tree.equal_range(&probe);
        let mut span = 0;
        while lo != hi {
            assert_eq!(*tree.get(lo).unwrap(), probe);
            span += 1;
            lo = tree.next(lo);
        }
        assert_eq!(span, shadow.iter().filter(|x| **x == probe).count());
    }
}

#[test]
fn hinted_inserts_are_equivalent_under_fuzzing() {
    let mut rng = StdRng::seed_from_u64(77);

    for _ in 0..200 {
        let mut hinted: OrdTree<u32> = OrdTree::create(48).unwrap();
        let mut plain: OrdTree<u32> = OrdTree::create(48).unwrap();

        for _ in 0..40 {
            let v = rng.gen_range(0..32u32);
            // An arbitrary position: sometimes live, sometimes end(),
            // sometimes a free or out-of-range slot.
            let hint = match rng.gen_range(0..3) {
                0 => hinted.lower_bound(&rng.gen_range(0..32u32)),
                1 => hinted.end(),
                _ => NodeIndex::new(rng.gen_range(0..64u32)),
            };

            if rng.gen_bool(0.5) {
                let a = hinted.insert_unique_hint(hint, v).unwrap();
                let b = plain.insert_unique(v).unwrap();
                assert_eq!(a.1, b.1);
            } else {
                hinted.insert_equal_hint(hint, v).unwrap();
                plain.insert_equal(v).unwrap();
            }

            hinted.check_invariants().unwrap();
            assert_eq!(contents(&hinted), contents(&plain));
        }
    }
}

#[test]
fn full_drain_in_every_direction() {
    // Ascending, descending and alternating erase orders all leave a
    // consistent tree at every step.
    let fill = |tree: &mut OrdTree<u32>| {
        for v in 0..32 {
            tree.insert_unique(v).unwrap();
        }
    };

    let mut tree = OrdTree::create(32).unwrap();
    fill(&mut tree);
    for v in 0..32 {
        assert_eq!(tree.erase(&v), 1);
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());

    fill(&mut tree);
    for v in (0..32).rev() {
        let pos = tree.find(&v).unwrap();
        tree.erase_at(pos).unwrap();
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());

    fill(&mut tree);
    while !tree.is_empty() {
        tree.erase_at(tree.first()).unwrap();
        if !tree.is_empty() {
            tree.erase_at(tree.last()).unwrap();
        }
        tree.check_invariants().unwrap();
    }
}

#[test]
fn capacity_is_a_hard_ceiling() {
    let mut tree: OrdTree<u32> = OrdTree::create(8).unwrap();
    assert_eq!(tree.insert_many_equal(0..100u32), 8);
    assert!(tree.is_full());
    assert_eq!(tree.insert_unique(200).unwrap_err().code(), "E005");

    // Freeing one slot admits exactly one element.
    tree.erase(&0);
    tree.insert_unique(200).unwrap();
    assert_eq!(tree.insert_unique(300).unwrap_err().code(), "E005");
    tree.check_invariants().unwrap();
}

// Payload that counts its drops and cannot be cloned or copied. If an
// erase ever duplicated or double-destroyed a payload, the final count
// would disagree.
static DROPS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct Payload(u32);

impl Drop for Payload {
    fn drop(&mut self) {
        DROPS.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Payload {}
impl PartialOrd for Payload {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Payload {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

#[test]
fn erase_destroys_exactly_one_payload_per_element() {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut tree: OrdTree<Payload> = OrdTree::create(64).unwrap();

    let mut keys: Vec<u32> = (0..64).collect();
    for k in &keys {
        tree.insert_unique(Payload(*k)).unwrap();
    }
    let baseline = DROPS.load(AtomicOrdering::SeqCst);

    // Erase in random order; every erasure drops exactly one payload
    // even when the victim has two children and its successor is
    // relinked across the tree.
    let mut erased = 0;
    while !keys.is_empty() {
        let i = rng.gen_range(0..keys.len());
        let k = keys.swap_remove(i);
        let pos = tree.find(&Payload(k)).unwrap();
        tree.erase_at(pos).unwrap();
        erased += 1;
        // One drop for the element, one for each probe temporary.
        assert_eq!(
            DROPS.load(AtomicOrdering::SeqCst) - baseline,
            erased * 2,
            "after erasing key {k}"
        );
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn lru_engine_matches_tree_semantics() {
    // The list-augmented engine must agree element-for-element with the
    // plain engine under an identical mutation stream.
    let mut rng = StdRng::seed_from_u64(0xabcd);
    let mut plain: OrdTree<u32> = OrdTree::create(64).unwrap();
    let mut lru: LruOrdTree<u32> = LruOrdTree::create(64).unwrap();
    lru.set_lru(true);

    for round in 0..2_000 {
        let v = rng.gen_range(0..50u32);
        match rng.gen_range(0..3) {
            0 if !plain.is_full() => {
                let a = plain.insert_unique(v).unwrap();
                let b = lru.insert_unique(v).unwrap();
                assert_eq!(a.1, b.1);
            }
            1 => {
                assert_eq!(plain.erase(&v), lru.erase(&v));
            }
            _ => {
                // The LRU lookup moves list links but must agree on the
                // outcome.
                assert_eq!(plain.find(&v).is_some(), lru.find(&v).is_some());
            }
        }

        assert_eq!(plain.len(), lru.len());
        if round % 127 == 0 {
            plain.check_invariants().unwrap();
            lru.check_invariants().unwrap();
            let a: Vec<u32> = plain.iter().copied().collect();
            let b: Vec<u32> = lru.iter().copied().collect();
            assert_eq!(a, b);
        }
    }
}

#[test]
fn lru_list_is_exactly_recency_order() {
    let mut rng = StdRng::seed_from_u64(31337);
    let mut cache: LruOrdTree<u32> = LruOrdTree::create(32).unwrap();
    cache.set_lru(true);
    let mut recency: Vec<u32> = Vec::new();

    for _ in 0..1_000 {
        let v = rng.gen_range(0..40u32);
        if rng.gen_bool(0.5) && !cache.is_full() {
            let (_, inserted) = cache.insert_unique(v).unwrap();
            if inserted {
                recency.push(v);
            }
        } else if cache.find(&v).is_some() {
            recency.retain(|x| *x != v);
            recency.push(v);
        }

        // Evict when the cache fills, always through the list head.
        if cache.is_full() {
            let victim = *cache.get(cache.list_first()).unwrap();
            assert_eq!(victim, recency[0]);
            cache.erase_at(cache.list_first()).unwrap();
            recency.remove(0);
        }
    }

    let order: Vec<u32> = cache.list_iter().copied().collect();
    assert_eq!(order, recency);
    cache.check_invariants().unwrap();
}
