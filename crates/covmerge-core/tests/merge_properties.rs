use covmerge_core::coverage::{
    CoverageMap, ElementId, Position, Range, RawCoverage, RawFileCoverage,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

type Counts = BTreeMap<
    String,
    (
        BTreeMap<ElementId, u64>,
        BTreeMap<ElementId, u64>,
        BTreeMap<ElementId, Vec<u64>>,
    ),
>;

fn statement_locations() -> BTreeMap<ElementId, Range> {
    (0..4)
        .map(|id| {
            (
                id,
                Range::new(Position::new(id + 1, 0), Position::new(id + 1, 10)),
            )
        })
        .collect()
}

fn file_strategy() -> impl Strategy<Value = RawFileCoverage> {
    (
        prop::collection::btree_map(0u32..4, 0u64..50, 0..4),
        prop::collection::btree_map(0u32..3, 0u64..50, 0..3),
        prop::collection::btree_map(0u32..3, prop::collection::vec(0u64..20, 1..4), 0..3),
    )
        .prop_map(|(s, f, b)| RawFileCoverage {
            statement_map: Some(statement_locations()),
            s: Some(s),
            f: Some(f),
            b: Some(b),
            ..Default::default()
        })
}

fn record_strategy() -> impl Strategy<Value = RawCoverage> {
    prop::collection::btree_map(
        prop::sample::select(vec!["/src/a.js", "/src/b.js", "/src/c.js"]).prop_map(String::from),
        file_strategy(),
        0..3,
    )
}

fn model(record: &RawCoverage) -> CoverageMap {
    let mut map = CoverageMap::new();
    map.merge_raw(record.clone()).unwrap();
    map
}

fn merged(parts: &[&CoverageMap]) -> CoverageMap {
    let mut map = CoverageMap::new();
    for part in parts {
        map.merge(part);
    }
    map
}

/// Counts with trailing zero branch slots dropped, so padding differences do not matter
fn counts(map: &CoverageMap) -> Counts {
    map.iter()
        .map(|(path, fc)| {
            let b = fc
                .b
                .iter()
                .map(|(id, hits)| {
                    let mut hits = hits.clone();
                    while hits.last() == Some(&0) {
                        hits.pop();
                    }
                    (*id, hits)
                })
                .collect();
            (path.to_string(), (fc.s.clone(), fc.f.clone(), b))
        })
        .collect()
}

proptest! {
    #[test]
    fn merge_is_commutative(a in record_strategy(), b in record_strategy()) {
        let (a, b) = (model(&a), model(&b));
        prop_assert_eq!(counts(&merged(&[&a, &b])), counts(&merged(&[&b, &a])));
    }

    #[test]
    fn merge_is_associative(
        a in record_strategy(),
        b in record_strategy(),
        c in record_strategy(),
    ) {
        let (a, b, c) = (model(&a), model(&b), model(&c));
        let left = merged(&[&merged(&[&a, &b]), &c]);
        let right = merged(&[&a, &merged(&[&b, &c])]);
        prop_assert_eq!(counts(&left), counts(&right));
    }

    #[test]
    fn empty_model_is_identity(a in record_strategy()) {
        let a = model(&a);
        prop_assert_eq!(&merged(&[&a, &CoverageMap::new()]), &a);
        prop_assert_eq!(&merged(&[&CoverageMap::new(), &a]), &a);
    }

    #[test]
    fn ingesting_twice_doubles_counts(a in record_strategy()) {
        let mut twice = CoverageMap::new();
        twice.merge_raw(a.clone()).unwrap();
        twice.merge_raw(a.clone()).unwrap();

        let once = model(&a);
        for (path, fc) in once.iter() {
            let doubled = twice.file_coverage_for(path).unwrap();
            for (id, hits) in &fc.s {
                prop_assert_eq!(doubled.s[id], hits * 2);
            }
            for (id, hits) in &fc.b {
                let expected: Vec<u64> = hits.iter().map(|h| h * 2).collect();
                prop_assert_eq!(&doubled.b[id], &expected);
            }
        }
    }

    #[test]
    fn id_sets_stay_consistent(a in record_strategy(), b in record_strategy()) {
        let map = merged(&[&model(&a), &model(&b)]);
        for (_, fc) in map.iter() {
            prop_assert!(fc.statement_map.keys().eq(fc.s.keys()));
            prop_assert!(fc.fn_map.keys().eq(fc.f.keys()));
            prop_assert!(fc.branch_map.keys().eq(fc.b.keys()));
        }
    }
}

#[test]
fn test_concrete_two_file_scenario() {
    let first: RawCoverage = serde_json::from_str(r#"{"a.js":{"s":{"0":3}}}"#).unwrap();
    let second: RawCoverage =
        serde_json::from_str(r#"{"a.js":{"s":{"0":2}},"b.js":{"s":{"0":1}}}"#).unwrap();

    let mut map = CoverageMap::new();
    map.merge_raw(first).unwrap();
    map.merge_raw(second).unwrap();

    let s: BTreeMap<&str, u64> = map.iter().map(|(path, fc)| (path, fc.s[&0])).collect();
    assert_eq!(s, BTreeMap::from([("a.js", 5), ("b.js", 1)]));
}

#[test]
fn test_branch_vectors_zero_pad() {
    let first: RawCoverage = serde_json::from_str(r#"{"a.js":{"b":{"0":[1,2]}}}"#).unwrap();
    let second: RawCoverage = serde_json::from_str(r#"{"a.js":{"b":{"0":[1,1,1]}}}"#).unwrap();

    let mut map = CoverageMap::new();
    map.merge_raw(first).unwrap();
    map.merge_raw(second).unwrap();

    assert_eq!(map.file_coverage_for("a.js").unwrap().b[&0], vec![2, 3, 1]);
}
