use super::*;

// -------------------- Integral --------------------

#[test]
fn integers_hash_to_themselves() {
    assert_eq!(0u64.fixed_hash().unwrap(), 0);
    assert_eq!(12i32.fixed_hash().unwrap(), 12);
    assert_eq!(10_000_000_000_000_000u64.fixed_hash().unwrap(), 10_000_000_000_000_000);
    assert_eq!(frozen_hash(&Value::Int(12)), 12);
    assert_eq!(true.fixed_hash().unwrap(), 1);
}

#[test]
fn negative_integers_wrap_deterministically() {
    assert_eq!((-1i64).fixed_hash().unwrap(), u64::MAX);
    assert_eq!(frozen_hash(&Value::Int(-1)), u64::MAX);
}

// -------------------- ByteLike --------------------

#[test]
fn strings_use_sha256_prefix() {
    // sha256("a") = ca978112ca1bbdca...
    assert_eq!("a".fixed_hash().unwrap(), 0xca97_8112_ca1b_bdca);
    assert_eq!(hash(&Value::from("a")).unwrap(), 0xca97_8112_ca1b_bdca);
}

#[test]
fn str_and_string_agree() {
    let owned = String::from("123");
    assert_eq!(owned.fixed_hash().unwrap(), "123".fixed_hash().unwrap());
    assert_eq!('x'.fixed_hash().unwrap(), "x".fixed_hash().unwrap());
}

#[test]
fn different_strings_differ() {
    assert_ne!("a".fixed_hash().unwrap(), "b".fixed_hash().unwrap());
}

// -------------------- Composites --------------------

#[test]
fn tuple_value_matches_vec_and_rust_tuple() {
    let v = Value::tuple(vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    let expected = frozen_hash(&v);
    assert_eq!(vec![0i64, 1, 2].fixed_hash().unwrap(), expected);
    assert_eq!((0i64, 1i64, 2i64).fixed_hash().unwrap(), expected);
}

#[test]
fn tuple_order_matters() {
    let a = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
    let b = Value::tuple(vec![Value::Int(2), Value::Int(1)]);
    assert_ne!(frozen_hash(&a), frozen_hash(&b));
}

#[test]
fn sets_are_order_insensitive() {
    let a = Value::frozenset(vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    let b = Value::frozenset(vec![Value::Int(2), Value::Int(0), Value::Int(1)]);
    assert_eq!(frozen_hash(&a), frozen_hash(&b));

    let rust: BTreeSet<i64> = [2, 1, 0].into_iter().collect();
    assert_eq!(rust.fixed_hash().unwrap(), frozen_hash(&a));
    let std_set: HashSet<i64> = [1, 2, 0].into_iter().collect();
    assert_eq!(std_set.fixed_hash().unwrap(), frozen_hash(&a));
}

#[test]
fn reordered_and_repeated_set_members_are_one_value() {
    let a = Value::frozenset(vec![Value::Int(1), Value::Int(2)]);
    let b = Value::frozenset(vec![Value::Int(2), Value::Int(1), Value::Int(1)]);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert_eq!(frozen_hash(&a), frozen_hash(&b));

    let single = Value::frozenset(vec![Value::Int(1)]);
    let repeated = Value::frozenset(vec![Value::Int(1), Value::Int(1)]);
    assert_eq!(single, repeated);
    assert_eq!(frozen_hash(&single), frozen_hash(&repeated));

    let mut std_hashes = HashSet::new();
    std_hashes.insert(a.clone());
    assert!(std_hashes.contains(&b));
}

#[test]
fn reordered_mapping_entries_are_one_value() {
    let a = Value::map(vec![(Value::Int(1), Value::from("x")), (Value::Int(2), Value::from("y"))]);
    let b = Value::map(vec![(Value::Int(2), Value::from("y")), (Value::Int(1), Value::from("x"))]);
    assert_eq!(a, b);
    assert_eq!(frozen_hash(&a), frozen_hash(&b));
}

#[test]
fn sets_display_in_sorted_order() {
    let a = Value::set(vec![Value::Int(3), Value::Int(1), Value::Int(3)]);
    assert_eq!(a.to_string(), "{1, 3}");
}

#[test]
fn mappings_are_order_insensitive() {
    let a = Value::map(vec![
        (Value::Int(0), Value::from("zero")),
        (Value::from("a"), Value::float(1e16)),
    ]);
    let b = Value::map(vec![
        (Value::from("a"), Value::float(1e16)),
        (Value::Int(0), Value::from("zero")),
    ]);
    assert_eq!(frozen_hash(&a), frozen_hash(&b));
}

#[test]
fn rust_maps_match_value_map() {
    let value = Value::map(vec![(Value::Int(1), Value::Int(10)), (Value::Int(2), Value::Int(20))]);
    let mut btree = BTreeMap::new();
    btree.insert(2i64, 20i64);
    btree.insert(1i64, 10i64);
    let mut hashmap = HashMap::new();
    hashmap.insert(1i64, 10i64);
    hashmap.insert(2i64, 20i64);
    assert_eq!(btree.fixed_hash().unwrap(), frozen_hash(&value));
    assert_eq!(hashmap.fixed_hash().unwrap(), frozen_hash(&value));
}

#[test]
fn nested_structures_hash_recursively() {
    let inner_a = Value::set(vec![Value::Int(1), Value::Int(2)]);
    let inner_b = Value::set(vec![Value::Int(2), Value::Int(1)]);
    let a = Value::List(vec![inner_a, Value::from("x")]);
    let b = Value::List(vec![inner_b, Value::from("x")]);
    assert_eq!(frozen_hash(&a), frozen_hash(&b));
}

// -------------------- Opaque --------------------

#[test]
fn floats_use_their_repr() {
    assert_eq!(3.4f64.fixed_hash().unwrap(), frozen_hash(&Value::float(3.4)));
    assert_ne!(3.4f64.fixed_hash().unwrap(), 3.5f64.fixed_hash().unwrap());
    assert_eq!(
        frozen_hash(&Value::Null),
        Option::<i64>::None.fixed_hash().unwrap()
    );
}

#[test]
fn opaque_values_hash_by_type_and_repr() {
    let a = Value::Opaque {
        type_name: "Point".into(),
        repr: "Point(1, 2)".into(),
    };
    let b = Value::Opaque {
        type_name: "Vector".into(),
        repr: "Point(1, 2)".into(),
    };
    assert_ne!(frozen_hash(&a), frozen_hash(&b));
    assert_eq!(a.kind(), Kind::Opaque);
}

// -------------------- Strict vs frozen --------------------

#[test]
fn strict_hash_rejects_mutable_composites() {
    let err = hash(&Value::map(vec![])).unwrap_err();
    assert_eq!(err, HashError::Unhashable { kind: "dict" });
    assert_eq!(err.to_string(), "unhashable type: 'dict'");
    assert!(hash(&Value::List(vec![])).is_err());
    assert!(hash(&Value::set(vec![])).is_err());
    assert!(Value::List(vec![]).fixed_hash().is_err());
}

#[test]
fn frozen_hash_agrees_with_strict_hash_where_defined() {
    let samples = vec![
        Value::Int(0),
        Value::Int(12),
        Value::from("a"),
        Value::from("123"),
        Value::tuple(vec![Value::Int(0), Value::Int(1), Value::Int(2)]),
        Value::frozenset(vec![Value::Int(0), Value::Int(1), Value::Int(2)]),
        Value::float(1e16),
    ];
    for v in &samples {
        assert_eq!(hash(v).unwrap(), frozen_hash(v), "mismatch for {}", v);
    }
}

#[test]
fn kinds_dispatch_as_documented() {
    assert_eq!(Value::Int(1).kind(), Kind::Integral);
    assert_eq!(Value::Bytes(vec![1]).kind(), Kind::ByteLike);
    assert_eq!(Value::set(vec![]).kind(), Kind::SetLike);
    assert_eq!(Value::map(vec![]).kind(), Kind::MappingLike);
    assert_eq!(Value::List(vec![]).kind(), Kind::Iterable);
    assert_eq!(Value::float(1.0).kind(), Kind::Opaque);
}

#[test]
fn display_is_python_like() {
    let v = Value::tuple(vec![Value::Int(1), Value::from("c"), Value::float(3.4)]);
    assert_eq!(v.to_string(), "(1, \"c\", 3.4)");
    assert_eq!(Value::Null.to_string(), "None");
}
