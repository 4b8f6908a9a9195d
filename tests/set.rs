use std::collections::BTreeSet;

use ctor::ctor;
use rbmap::OrderedSet;
use rstest::{fixture, rstest};
use test_utils::{assert_valid_set, install_logger, random_ops, Op};

#[ctor]
fn install_backtrace() {
    color_backtrace::install();
}

#[fixture]
fn words() -> OrderedSet<String> {
    install_logger();

    ["pear", "apple", "fig", "kiwi", "banana", "cherry"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[rstest]
fn sorted(words: OrderedSet<String>) {
    assert_valid_set(&words);
    let sorted: Vec<&str> = words.iter().map(String::as_str).collect();
    assert_eq!(
        sorted,
        vec!["apple", "banana", "cherry", "fig", "kiwi", "pear"]
    );
    assert_eq!(words.first().map(String::as_str), Some("apple"));
    assert_eq!(words.last().map(String::as_str), Some("pear"));
}

#[rstest]
fn borrowed_lookups(mut words: OrderedSet<String>) {
    assert!(words.contains("fig"));
    assert!(!words.contains("grape"));
    assert_eq!(words.find("kiwi").key().map(String::as_str), Some("kiwi"));
    assert!(words.find("grape").is_end());
    assert_eq!(
        words.lower_bound("d").key().map(String::as_str),
        Some("fig")
    );
    assert_eq!(
        words.upper_bound("fig").key().map(String::as_str),
        Some("kiwi")
    );

    assert!(words.remove("fig"));
    assert!(!words.remove("fig"));
    assert_eq!(words.take("kiwi"), Some("kiwi".to_string()));
    assert_eq!(words.len(), 4);
    assert_valid_set(&words);
}

#[rstest]
fn erase_by_handle(mut words: OrderedSet<String>) {
    let (handle, inserted) = words.insert("grape".to_string());
    assert!(inserted);
    let cherry = words.find("cherry").handle().unwrap();

    assert_eq!(words.erase(handle), Some("grape".to_string()));
    assert_eq!(words.erase(handle), None);
    assert_eq!(words.cursor(cherry).key().map(String::as_str), Some("cherry"));
}

#[rstest]
fn insert_many(mut words: OrderedSet<String>) {
    let inserted: Vec<bool> = words
        .insert_many(["fig", "lime", "lime"].map(String::from))
        .into_iter()
        .map(|(_, inserted)| inserted)
        .collect();
    assert_eq!(inserted, vec![false, true, false]);
    assert_eq!(words.len(), 7);
}

#[rstest]
fn merge_leaves_shared(mut words: OrderedSet<String>) {
    let mut other: OrderedSet<String> =
        ["fig", "grape", "lime"].into_iter().map(String::from).collect();
    words.merge(&mut other);

    assert_eq!(words.len(), 8);
    assert_eq!(other.len(), 1);
    assert!(other.contains("fig"));
    assert_valid_set(&words);
    assert_valid_set(&other);
}

#[rstest]
fn copy_and_move(words: OrderedSet<String>) {
    let mut copy = words.clone();
    copy.insert("zucchini".to_string());
    assert_eq!(words.len(), 6);
    assert_ne!(copy, words);

    let mut source = copy;
    let moved = std::mem::take(&mut source);
    assert!(source.is_empty());
    assert_eq!(moved.len(), 7);
}

#[rstest]
fn drain_with_pops(mut words: OrderedSet<String>) {
    let mut drained = Vec::new();
    while let Some(first) = words.pop_first() {
        drained.push(first);
        if let Some(last) = words.pop_last() {
            drained.push(last);
        }
        assert_valid_set(&words);
    }
    assert_eq!(drained.len(), 6);
    assert_eq!(drained[0], "apple");
    assert_eq!(drained[1], "pear");
}

#[rstest]
#[case(11)]
#[case(23)]
#[case(97)]
fn random_ops_match_btree_set(#[case] seed: u64) {
    install_logger();

    let mut set = OrderedSet::new();
    let mut expected = BTreeSet::new();
    for op in random_ops(3000, 400, 0.4, seed) {
        match op {
            Op::Insert(key) => {
                assert_eq!(set.insert(key).1, expected.insert(key))
            }
            Op::Remove(key) => {
                assert_eq!(set.remove(&key), expected.remove(&key))
            }
        }
    }
    assert_valid_set(&set);
    assert!(set.iter().eq(expected.iter()));
    assert!(set.iter().rev().eq(expected.iter().rev()));
}

#[rstest]
fn serde_round_trip(words: OrderedSet<String>) {
    let bytes = rmp_serde::to_vec(&words).unwrap();
    let decoded: OrderedSet<String> = rmp_serde::from_slice(&bytes).unwrap();
    assert_eq!(decoded, words);

    let as_vec: Vec<String> = rmp_serde::from_slice(&bytes).unwrap();
    assert!(as_vec.iter().eq(words.iter()));
}
