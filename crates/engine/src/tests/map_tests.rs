use super::helpers::{cfg, page_files};
use crate::*;
use anyhow::Result;
use std::collections::HashMap;
use tempfile::tempdir;

#[test]
fn one_entry_per_page_one_page_in_ram() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, Value> = Dict::open(cfg(dir.path(), "d", 1, 1))?;

    d.set(0, Value::from(1))?;
    d.set(1, Value::from("c"))?;
    d.set(2, Value::from(3.4))?;

    assert_eq!(d.get(&0)?, Value::from(1));
    assert_eq!(d.get(&1)?, Value::from("c"));
    assert_eq!(d.get(&2)?, Value::from(3.4));
    assert_eq!(d.len(), 3);
    assert_eq!(d.store().peak_resident(), 1);
    Ok(())
}

#[test]
fn missing_key_is_not_found() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<String, i64> = Dict::open(cfg(dir.path(), "d", 4, 2))?;
    d.set("present".into(), 1)?;

    let err = d.get(&"absent".to_string()).unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound));
    assert!(err.is_not_found());
    assert!(d.remove(&"absent".to_string()).unwrap_err().is_not_found());
    assert_eq!(d.try_get(&"absent".to_string())?, None);
    assert_eq!(d.get_or(&"absent".to_string(), 9)?, 9);
    assert_eq!(d.get_or(&"present".to_string(), 9)?, 1);
    assert_eq!(d.len(), 1);
    Ok(())
}

#[test]
fn overwrite_keeps_length() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, String> = Dict::open(cfg(dir.path(), "d", 2, 1))?;

    assert_eq!(d.set(5, "one".into())?, None);
    assert_eq!(d.set(5, "two".into())?, Some("one".to_string()));
    assert_eq!(d.len(), 1);
    assert_eq!(d.get(&5)?, "two");
    Ok(())
}

#[test]
fn remove_shrinks_and_forgets() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "d", 3, 2))?;
    for k in 0..10 {
        d.set(k, k * k)?;
    }

    assert_eq!(d.remove(&4)?, 16);
    assert_eq!(d.len(), 9);
    assert!(!d.contains(&4)?);
    assert!(d.contains(&5)?);
    assert!(matches!(d.remove(&4), Err(StoreError::KeyNotFound)));
    assert_eq!(d.len(), 9);
    Ok(())
}

#[test]
fn emptied_page_leaves_no_file() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "d", 1, 1))?;
    d.set(0, 0)?;
    d.set(1, 1)?;
    assert_eq!(page_files(dir.path(), "d"), vec![0]);

    d.remove(&0)?;
    d.close()?;
    assert_eq!(page_files(dir.path(), "d"), vec![1]);
    Ok(())
}

#[test]
fn update_in_place() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<String, Vec<i64>> = Dict::open(cfg(dir.path(), "d", 2, 1))?;
    d.set("xs".into(), vec![1])?;
    d.set("ys".into(), vec![])?;

    d.update(&"xs".to_string(), |xs| xs.push(2))?;
    assert_eq!(d.get(&"xs".to_string())?, vec![1, 2]);
    assert!(matches!(
        d.update(&"zs".to_string(), |xs| xs.clear()),
        Err(StoreError::KeyNotFound)
    ));
    Ok(())
}

#[test]
fn many_string_keys_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<String, u64> = Dict::open(cfg(dir.path(), "words", 4, 2))?;
    for i in 0..200u64 {
        d.set(format!("key-{i}"), i)?;
    }
    assert_eq!(d.len(), 200);
    for i in 0..200u64 {
        assert_eq!(d.get(&format!("key-{i}"))?, i);
    }
    assert!(d.store().peak_resident() <= 2);
    Ok(())
}

#[test]
fn tuple_and_value_keys() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<Value, String> = Dict::open(cfg(dir.path(), "d", 8, 2))?;
    let point = Value::Tuple(vec![Value::from(1), Value::from(2)]);
    let tag = Value::frozenset([Value::from("b"), Value::from("a")]);

    d.set(point.clone(), "point".into())?;
    d.set(tag.clone(), "tag".into())?;
    d.set(Value::Null, "none".into())?;

    assert_eq!(d.get(&point)?, "point");
    assert_eq!(d.get(&tag)?, "tag");
    assert_eq!(d.get(&Value::Null)?, "none");
    Ok(())
}

#[test]
fn reordered_set_key_is_the_same_key() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<Value, i64> = Dict::open(cfg(dir.path(), "d", 1, 1))?;
    let forward = Value::frozenset([Value::from(1), Value::from(2)]);
    let backward = Value::frozenset([Value::from(2), Value::from(1), Value::from(2)]);

    d.set(forward.clone(), 1)?;
    assert_eq!(d.set(backward.clone(), 2)?, Some(1));
    assert_eq!(d.len(), 1);
    assert_eq!(d.get(&forward)?, 2);

    d.set(Value::from(0), 0)?;
    assert_eq!(d.get(&backward)?, 2);
    assert_eq!(d.remove(&forward)?, 2);
    assert!(!d.contains(&backward)?);
    Ok(())
}

#[test]
fn unhashable_key_is_absent_and_cannot_be_stored() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<Value, i64> = Dict::open(cfg(dir.path(), "d", 8, 2))?;
    let list = Value::List(vec![Value::from(1)]);

    assert!(!d.contains(&list)?);
    assert!(matches!(
        d.set(Value::map([]), 1),
        Err(StoreError::Hash(HashError::Unhashable { .. }))
    ));
    assert!(matches!(d.get(&list), Err(StoreError::Hash(_))));
    assert_eq!(d.len(), 0);
    Ok(())
}

// --------------------- Iteration ---------------------

#[test]
fn iteration_visits_every_entry_once() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, String> = Dict::open(cfg(dir.path(), "d", 3, 2))?;
    let mut model = HashMap::new();
    for k in 0..40 {
        d.set(k, k.to_string())?;
        model.insert(k, k.to_string());
    }

    let seen: HashMap<i64, String> = d.iter().collect::<Result<_, _>>()?;
    assert_eq!(seen, model);

    let mut keys = d.keys().collect::<Result<Vec<_>, _>>()?;
    keys.sort_unstable();
    assert_eq!(keys, (0..40).collect::<Vec<_>>());
    assert_eq!(d.values().count(), 40);
    assert!(d.store().peak_resident() <= 2);
    Ok(())
}

#[test]
fn iteration_skips_page_pruned_during_walk() -> Result<()> {
    let dir = tempdir()?;
    let mut d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "d", 1, 1))?;
    d.set(0, 0)?;
    d.set(1, 1)?;
    d.remove(&1)?;

    // Loading page 0 evicts the emptied page 1, which is forgotten.
    let entries: Vec<(i64, i64)> = d.iter().collect::<Result<_, _>>()?;
    assert_eq!(entries, vec![(0, 0)]);
    assert_eq!(d.store().known_addresses(), vec![0]);
    assert!(page_files(dir.path(), "d").is_empty());
    Ok(())
}

#[test]
fn ordered_dict_iterates_in_key_order() -> Result<()> {
    let dir = tempdir()?;
    let mut d: OrderedDict<i64, i64> = OrderedDict::open(cfg(dir.path(), "o", 10, 2))?;
    for k in (0..50).rev() {
        d.set(k, -k)?;
    }

    let keys = d.keys().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(keys, (0..50).collect::<Vec<_>>());
    let first = d.iter().next().transpose()?;
    assert_eq!(first, Some((0, 0)));
    Ok(())
}

// --------------------- Lifecycle ---------------------

#[test]
fn clear_removes_entries_and_files() -> Result<()> {
    let dir = tempdir()?;
    let config = cfg(dir.path(), "d", 1, 2);
    let files = PageFiles::new(&config);
    let mut d: Dict<i64, i64> = Dict::open(config)?;
    for k in 0..6 {
        d.set(k, k)?;
    }
    assert!(!page_files(dir.path(), "d").is_empty());

    d.clear()?;
    assert_eq!(d.len(), 0);
    assert!(d.is_empty());
    assert!(page_files(dir.path(), "d").is_empty());
    assert_eq!(d.iter().count(), 0);
    assert_eq!(files.load_index()?.map(|r| r.length), Some(0));

    d.set(3, 3)?;
    assert_eq!(d.get(&3)?, 3);
    Ok(())
}

#[test]
fn scope_closes_on_success() -> Result<()> {
    let dir = tempdir()?;
    let d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "d", 1, 4))?;

    let len = d.scope(|d| {
        d.set(1, 1)?;
        d.set(2, 2)?;
        Ok(d.len())
    })?;
    assert_eq!(len, 2);
    assert_eq!(page_files(dir.path(), "d"), vec![1, 2]);
    Ok(())
}

#[test]
fn scope_closes_on_error() -> Result<()> {
    let dir = tempdir()?;
    let d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "d", 1, 4))?;

    let out: crate::Result<()> = d.scope(|d| {
        d.set(1, 1)?;
        d.get(&7)?;
        Ok(())
    });
    assert!(matches!(out, Err(StoreError::KeyNotFound)));
    assert_eq!(page_files(dir.path(), "d"), vec![1]);
    Ok(())
}

#[test]
fn display_describes_layout() -> Result<()> {
    let dir = tempdir()?;
    let d: Dict<i64, i64> = Dict::open(cfg(dir.path(), "users", 3, 2))?;
    let expected = format!(
        "Dictionary with values stored to {} (3 per page, 2 in RAM)",
        dir.path().join("users").display()
    );
    assert_eq!(d.to_string(), expected);
    Ok(())
}
