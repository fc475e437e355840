//! List integration tests.

mod common;

use sqlite_object::{Error, Indexable, SliceSpec, SqliteList, StoreConfig};

fn contents<T, C>(list: &SqliteList<T, C>) -> Vec<T>
where
    C: sqlite_object::Coder<T>,
{
    list.iter().collect::<Result<_, _>>().unwrap()
}

#[test]
fn test_append_prepend_pop_sequence() {
    let list: SqliteList<String> = SqliteList::open(StoreConfig::temporary()).unwrap();

    list.append(&"x".into()).unwrap();
    list.append(&"y".into()).unwrap();
    list.prepend(&"w".into()).unwrap();
    assert_eq!(contents(&list), vec!["w", "x", "y"]);
    assert_eq!(list.get(1).unwrap(), "x");

    assert_eq!(list.pop_first().unwrap(), "w");
    assert_eq!(contents(&list), vec!["x", "y"]);
}

#[test]
fn test_length_tracks_every_mutation() {
    let list: SqliteList<i64> = SqliteList::open(StoreConfig::temporary()).unwrap();

    for i in 0..5 {
        let before = list.len().unwrap();
        if i % 2 == 0 {
            list.append(&i).unwrap();
            assert_eq!(list.get(-1).unwrap(), i);
        } else {
            list.prepend(&i).unwrap();
            assert_eq!(list.get(0).unwrap(), i);
        }
        assert_eq!(list.len().unwrap(), before + 1);
    }

    while !list.is_empty().unwrap() {
        let before = list.len().unwrap();
        list.pop_last().unwrap();
        assert_eq!(list.len().unwrap(), before - 1);
    }
    assert!(matches!(list.pop_last(), Err(Error::EmptyContainer)));
}

#[test]
fn test_negative_index_law() {
    let list: SqliteList<i64> = SqliteList::open(StoreConfig::temporary()).unwrap();
    list.extend(&[4, 8, 15, 16, 23, 42]).unwrap();
    list.prepend(&0).unwrap();

    let len = list.len().unwrap() as isize;
    for i in 0..len {
        assert_eq!(list.get(-1 - i).unwrap(), list.get(len - 1 - i).unwrap());
    }
    assert!(matches!(
        list.get(len),
        Err(Error::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        list.get(-len - 1),
        Err(Error::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_slicing() {
    let list: SqliteList<i64> = SqliteList::open(StoreConfig::temporary()).unwrap();
    list.extend(&[10, 20, 30, 40, 50]).unwrap();

    let middle: Vec<i64> = list
        .slice(SliceSpec::new(Some(1), Some(4), Some(1)))
        .unwrap()
        .iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(middle, vec![20, 30, 40]);

    let reversed: Vec<i64> = list
        .slice(SliceSpec::reversed())
        .unwrap()
        .iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(reversed, vec![50, 40, 30, 20, 10]);

    let every_other: Vec<i64> = list
        .slice(SliceSpec::new(None, None, Some(-2)))
        .unwrap()
        .iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(every_other, vec![50, 30, 10]);

    assert!(matches!(
        list.slice(SliceSpec::new(None, None, Some(0))),
        Err(Error::InvalidKeyType(_))
    ));
}

#[test]
fn test_positions_survive_reopen() {
    let fixture = common::TestFixture::new();
    {
        let list: SqliteList<i64> = SqliteList::open(fixture.named("queue")).unwrap();
        list.extend(&[1, 2, 3]).unwrap();
        list.prepend(&0).unwrap();
        list.pop_last().unwrap();
        list.close().unwrap();
    }

    let list: SqliteList<i64> = SqliteList::open(fixture.named("queue")).unwrap();
    assert_eq!(contents(&list), vec![0, 1, 2]);
    list.append(&9).unwrap();
    Indexable::set(&list, 0, &-1).unwrap();
    assert_eq!(contents(&list), vec![-1, 1, 2, 9]);
}
