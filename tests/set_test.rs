//! Set integration tests.

mod common;

use sqlite_object::{Error, SetLike, SqliteSet, StoreConfig};
use std::collections::{BTreeSet, HashSet};

#[test]
fn test_add_remove_discard_sequence() {
    let set: SqliteSet<i64> = SqliteSet::open(StoreConfig::temporary()).unwrap();

    set.add(&1).unwrap();
    set.add(&1).unwrap();
    assert_eq!(set.len().unwrap(), 1);
    assert!(matches!(set.remove(&2), Err(Error::KeyNotFound)));
    set.discard(&2).unwrap();
}

#[test]
fn test_discard_is_idempotent() {
    let set: SqliteSet<String> = SqliteSet::open(StoreConfig::temporary()).unwrap();
    set.update(&["a".to_string(), "b".to_string()]).unwrap();

    set.discard(&"a".to_string()).unwrap();
    let once: BTreeSet<String> = set.iter().collect::<Result<_, _>>().unwrap();
    set.discard(&"a".to_string()).unwrap();
    let twice: BTreeSet<String> = set.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
}

#[test]
fn test_algebra_against_std_and_persistent_sets() {
    let set: SqliteSet<i64> = SqliteSet::open(StoreConfig::temporary()).unwrap();
    set.update(&[1, 2, 3]).unwrap();

    let superset: HashSet<i64> = [1, 2, 3, 4].into();
    let same: BTreeSet<i64> = [3, 2, 1].into();
    let other: SqliteSet<i64> = SqliteSet::open(StoreConfig::temporary()).unwrap();
    other.update(&[7, 8]).unwrap();

    assert!(set.is_strict_subset_of(&superset).unwrap());
    assert!(set.set_eq(&same).unwrap());
    assert!(set.is_subset_of(&same).unwrap());
    assert!(!set.is_strict_superset_of(&same).unwrap());
    assert!(set.is_disjoint_from(&other).unwrap());

    let dynamic: &dyn SetLike<i64> = &other;
    assert!(!set.is_superset_of(dynamic).unwrap());
}

#[test]
fn test_shared_file_with_named_sets() {
    let fixture = common::TestFixture::new();
    let red: SqliteSet<String> = SqliteSet::open(fixture.named("red")).unwrap();
    let blue: SqliteSet<String> = SqliteSet::open(fixture.named("blue")).unwrap();

    red.add(&"apple".to_string()).unwrap();
    blue.add(&"sky".to_string()).unwrap();

    assert_eq!(red.table_name(), "red_set_table");
    assert_eq!(blue.table_name(), "blue_set_table");
    assert!(!red.contains(&"sky".to_string()).unwrap());
    assert_eq!(red.path(), blue.path());
}
