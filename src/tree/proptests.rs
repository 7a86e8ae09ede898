use super::*;

use crate::cidr::range_to_cidrs;
use proptest::prelude::*;

/// All generated blocks fall inside 10.0.0.0/24 so a flat array can model them.
const BASE: u32 = 0x0A00_0000;
const PAYLOADS: [&str; 3] = ["A", "B", "C"];

type Model = [Option<&'static str>; 256];

#[derive(Clone, Debug)]
struct Insert {
    offset: u8,
    size: u8,
    payload: &'static str,
    overwrite: bool,
}

impl Insert {
    fn cidr(&self) -> Cidr {
        Cidr::new(BASE | u32::from(self.offset), self.size).unwrap()
    }
}

fn insert_strategy() -> impl Strategy<Value = Insert> {
    (any::<u8>(), 24u8..=32, 0usize..PAYLOADS.len(), any::<bool>()).prop_map(
        |(offset, size, payload, overwrite)| Insert {
            offset,
            size,
            payload: PAYLOADS[payload],
            overwrite,
        },
    )
}

fn apply(model: &mut Model, op: &Insert) {
    let cidr = op.cidr();
    for addr in cidr.first()..=cidr.last() {
        let slot = &mut model[(addr - BASE) as usize];
        if op.overwrite || slot.is_none() {
            *slot = Some(op.payload);
        }
    }
}

fn build(ops: &[Insert]) -> (Tree<&'static str>, Model) {
    let mut tree = Tree::new();
    let mut model = [None; 256];
    for op in ops {
        tree.add(op.cidr(), op.payload, op.overwrite);
        apply(&mut model, op);
        tree.assert_invariants();
    }
    (tree, model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_lookup_matches_model(ops in prop::collection::vec(insert_strategy(), 0..64)) {
        let (tree, model) = build(&ops);
        for (i, expected) in model.iter().enumerate() {
            prop_assert_eq!(tree.lookup(BASE + i as u32).copied(), *expected);
        }
        prop_assert_eq!(tree.lookup(BASE - 1), None);
        prop_assert_eq!(tree.lookup(BASE + 256), None);
    }

    #[test]
    fn prop_dump_covers_model(ops in prop::collection::vec(insert_strategy(), 0..64)) {
        let (tree, model) = build(&ops);
        let mut covered: Model = [None; 256];
        let mut last_end = None;
        tree.walk(|cidr, payload| {
            if let Some(end) = last_end {
                assert!(cidr.first() > end, "blocks out of order");
            }
            last_end = Some(cidr.last());
            for addr in cidr.first()..=cidr.last() {
                covered[(addr - BASE) as usize] = Some(*payload);
            }
        });
        prop_assert_eq!(covered, model);
    }

    #[test]
    fn prop_reinsert_is_idempotent(ops in prop::collection::vec(insert_strategy(), 1..64)) {
        let (mut tree, _) = build(&ops);
        let before = tree.dump();
        let op = &ops[ops.len() - 1];
        tree.add(op.cidr(), op.payload, op.overwrite);
        prop_assert_eq!(tree.dump(), before);
    }

    #[test]
    fn prop_no_overwrite_preserves_existing(
        ops in prop::collection::vec(insert_strategy(), 0..32),
        extra in insert_strategy(),
    ) {
        let (mut tree, model) = build(&ops);
        tree.add(extra.cidr(), extra.payload, false);
        for (i, before) in model.iter().enumerate() {
            if before.is_some() {
                prop_assert_eq!(tree.lookup(BASE + i as u32).copied(), *before);
            }
        }
    }

    #[test]
    fn prop_insertion_order_irrelevant_without_conflicts(
        ops in prop::collection::vec(insert_strategy(), 0..32),
    ) {
        // a single payload never conflicts, so any order gives the same tree
        let same: Vec<Insert> = ops
            .iter()
            .cloned()
            .map(|op| Insert { payload: "A", ..op })
            .collect();
        let mut reversed = same.clone();
        reversed.reverse();
        prop_assert_eq!(build(&same).0.dump(), build(&reversed).0.dump());
    }

    #[test]
    fn prop_range_blocks_are_minimal(low in any::<u32>(), high in any::<u32>()) {
        let blocks = range_to_cidrs(low, high);
        prop_assert_eq!(blocks[0].first(), low.min(high));
        prop_assert_eq!(blocks[blocks.len() - 1].last(), low.max(high));
        prop_assert!(blocks.len() <= 62);

        for pair in blocks.windows(2) {
            prop_assert_eq!(pair[0].last() + 1, pair[1].first());
            let siblings = pair[0].size() == pair[1].size()
                && Cidr::new(pair[0].prefix(), pair[0].size() - 1).unwrap()
                    == Cidr::new(pair[1].prefix(), pair[1].size() - 1).unwrap();
            prop_assert!(!siblings, "{} and {} should have merged", pair[0], pair[1]);
        }

        let tree = Tree::from_records(
            blocks.iter().map(|cidr| Record::new(*cidr, "R")),
            false,
        );
        prop_assert_eq!(tree.len(), blocks.len());
    }
}

/// High bits the wide-block strategy anchors its prefixes on.
const PATTERNS: [u32; 4] = [0x0000_0000, 0x8000_0000, 0xC0A8_0000, 0xFFFF_FF00];

/// An insertion of any size, from `/0` down to a single host.
#[derive(Clone, Debug)]
struct WideInsert {
    cidr: Cidr,
    payload: &'static str,
    overwrite: bool,
}

fn wide_insert_strategy() -> impl Strategy<Value = WideInsert> {
    (
        0usize..PATTERNS.len(),
        any::<u8>(),
        0u8..=ADDRESS_BITS,
        0usize..PAYLOADS.len(),
        any::<bool>(),
    )
        .prop_map(|(pattern, low, size, payload, overwrite)| WideInsert {
            cidr: Cidr::new(PATTERNS[pattern] | u32::from(low), size).unwrap(),
            payload: PAYLOADS[payload],
            overwrite,
        })
}

/// Replay the insertions for a single address.
fn expected_at(ops: &[WideInsert], addr: u32) -> Option<&'static str> {
    ops.iter().fold(None, |slot, op| {
        if op.cidr.contains(addr) && (op.overwrite || slot.is_none()) {
            Some(op.payload)
        } else {
            slot
        }
    })
}

/// Block edges, their neighbours and midpoints, plus a few fixed addresses.
fn sample_points(ops: &[WideInsert]) -> Vec<u32> {
    let mut points = vec![0, 0x4000_0000, 0x7FFF_FFFF, u32::MAX];
    for op in ops {
        let (first, last) = (op.cidr.first(), op.cidr.last());
        points.extend([
            first,
            last,
            first.wrapping_sub(1),
            last.wrapping_add(1),
            first + (last - first) / 2,
        ]);
    }
    points
}

fn build_wide(ops: &[WideInsert]) -> Tree<&'static str> {
    let mut tree = Tree::new();
    for op in ops {
        tree.add(op.cidr, op.payload, op.overwrite);
        tree.assert_invariants();
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_wide_blocks_lookup_matches_replay(
        ops in prop::collection::vec(wide_insert_strategy(), 0..48),
    ) {
        let tree = build_wide(&ops);
        for addr in sample_points(&ops) {
            prop_assert_eq!(tree.lookup(addr).copied(), expected_at(&ops, addr), "at {:#010x}", addr);
        }
    }

    #[test]
    fn prop_wide_blocks_dump_agrees_with_lookup(
        ops in prop::collection::vec(wide_insert_strategy(), 0..48),
    ) {
        let tree = build_wide(&ops);
        let mut blocks = Vec::new();
        tree.walk(|cidr, payload| blocks.push((cidr, *payload)));

        for pair in blocks.windows(2) {
            prop_assert!(pair[0].0.last() < pair[1].0.first(), "blocks out of order");
        }
        for (cidr, payload) in blocks {
            prop_assert_eq!(expected_at(&ops, cidr.first()), Some(payload));
            prop_assert_eq!(expected_at(&ops, cidr.last()), Some(payload));
        }
    }
}
