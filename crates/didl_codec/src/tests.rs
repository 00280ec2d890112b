//! Message-level tests: round trips, exact bytes, schema evolution and
//! malformed input.

use std::sync::Once;

use num_bigint::{BigInt, BigUint};

use crate::prelude::*;
use crate::MAX_RECURSION_DEPTH;

static TRACING: Once = Once::new();

/// Route codec logs to the test harness (`RUST_LOG=didl_codec=trace`)
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn profile_type() -> Type {
    let kind = Type::variant([("guest", Type::Null), ("member", Type::Int)]).unwrap();
    Type::record([
        ("name", Type::Text),
        ("tags", Type::vec(Type::Text)),
        ("score", Type::opt(Type::Float64)),
        ("kind", kind),
        ("avatar", Type::vec(Type::Nat8)),
        ("pos", Type::tuple([Type::Nat8, Type::Int16])),
        ("owner", Type::Principal),
        ("balance", Type::Nat),
    ])
    .unwrap()
}

fn profile_value() -> Value {
    Value::record([
        ("name", Value::text("ada")),
        ("tags", Value::Vector(vec![Value::text("x"), Value::text("yz")])),
        ("score", Value::some(Value::Float64(0.5))),
        ("kind", Value::variant("member", Value::Int(BigInt::from(-42)))),
        ("avatar", Value::Blob(vec![0, 1, 2, 255])),
        ("pos", Value::Tuple(vec![Value::Nat8(7), Value::Int16(-300)])),
        ("owner", Value::Principal(Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]))),
        ("balance", Value::Nat(BigUint::from(u64::MAX) * 1000u32)),
    ])
}

fn list_type() -> Type {
    let list = RecursiveType::new();
    let body = Type::record([("head", Type::Int), ("tail", Type::opt(list.as_type()))]).unwrap();
    list.fill(body).unwrap();
    list.as_type()
}

fn list_value(items: &[i64]) -> Value {
    items.iter().rev().fold(Value::none(), |tail, &head| {
        Value::some(Value::record([("head", Value::int(head)), ("tail", tail)]))
    })
}

/// Unwrap the outer `opt` built by `list_value`
fn list_node(items: &[i64]) -> Value {
    match list_value(items) {
        Value::Opt(Some(node)) => *node,
        other => other,
    }
}

#[test]
fn test_roundtrip_nested() {
    init_tracing();
    let ty = profile_type();
    let value = profile_value();
    let bytes = encode(&[ty.clone()], &[value.clone()]).unwrap();
    assert_eq!(decode(&[ty], &bytes).unwrap(), vec![value]);
}

#[test]
fn test_roundtrip_primitives() {
    let cases = vec![
        (Type::Null, Value::Null),
        (Type::Bool, Value::Bool(false)),
        (Type::Nat, Value::nat(0)),
        (Type::Int, Value::Int(BigInt::from(i64::MIN) - 1)),
        (Type::Nat16, Value::Nat16(u16::MAX)),
        (Type::Nat32, Value::Nat32(7)),
        (Type::Nat64, Value::Nat64(u64::MAX)),
        (Type::Int8, Value::Int8(i8::MIN)),
        (Type::Int32, Value::Int32(-1)),
        (Type::Int64, Value::Int64(i64::MIN)),
        (Type::Float32, Value::Float32(-2.25)),
        (Type::Text, Value::text("héllo")),
        (Type::Principal, Value::Principal(Principal::anonymous())),
    ];
    let (types, values): (Vec<Type>, Vec<Value>) = cases.into_iter().unzip();
    let bytes = encode(&types, &values).unwrap();
    assert_eq!(decode(&types, &bytes).unwrap(), values);
}

#[test]
fn test_roundtrip_recursive_list() {
    let ty = list_type();
    let value = list_node(&[1, 2, 3]);
    assert!(ty.is_valid_value(&value));
    let bytes = encode(&[ty.clone()], &[value.clone()]).unwrap();
    assert_eq!(decode(&[ty], &bytes).unwrap(), vec![value]);
}

#[test]
fn test_recursive_types_match_structurally() {
    // Two independently built list types accept each other's messages
    let bytes = encode(&[list_type()], &[list_node(&[5, 6])]).unwrap();
    assert_eq!(decode(&[list_type()], &bytes).unwrap(), vec![list_node(&[5, 6])]);
}

#[test]
fn test_roundtrip_references() {
    let greet = Type::func(vec![Type::Text], vec![Type::Text], vec![FuncMode::Query]);
    let service = Type::service([("greet", greet.clone())]).unwrap();
    let canister = Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
    let types = [greet, service];
    let values = [
        Value::Func(canister.clone(), "greet".into()),
        Value::Service(canister),
    ];
    let bytes = encode(&types, &values).unwrap();
    assert_eq!(decode(&types, &bytes).unwrap(), values.to_vec());
}

#[test]
fn test_exact_bytes() {
    assert_eq!(
        encode(&[Type::Null], &[Value::Null]).unwrap(),
        b"DIDL\x00\x01\x7f".to_vec()
    );
    assert_eq!(
        encode(&[Type::Text], &[Value::text("hi")]).unwrap(),
        b"DIDL\x00\x01\x71\x02hi".to_vec()
    );
    assert_eq!(
        encode(&[Type::opt(Type::Nat)], &[Value::some(Value::nat(1))]).unwrap(),
        b"DIDL\x01\x6e\x7d\x01\x00\x01\x01".to_vec()
    );
    // record { b: nat; a: nat }: a (97) is written before b (98)
    let ty = Type::record([("b", Type::Nat), ("a", Type::Nat)]).unwrap();
    let value = Value::record([("a", Value::nat(1)), ("b", Value::nat(2))]);
    assert_eq!(
        encode(&[ty], &[value]).unwrap(),
        b"DIDL\x01\x6c\x02\x61\x7d\x62\x7d\x01\x00\x01\x02".to_vec()
    );
}

#[test]
fn test_blob_is_canonical_vec_nat8() {
    let ty = Type::vec(Type::Nat8);
    let bytes = encode(&[ty.clone()], &[Value::Vector(vec![Value::Nat8(9), Value::Nat8(8)])]).unwrap();
    assert_eq!(decode(&[ty], &bytes).unwrap(), vec![Value::Blob(vec![9, 8])]);
}

#[test]
fn test_valid_values_survive_round_trip() {
    let bytes_ty = Type::vec(Type::Nat8);
    let items = Value::Vector(vec![Value::Nat8(1), Value::Nat8(2)]);
    let bytes = encode(&[bytes_ty.clone()], &[items.clone()]).unwrap();
    assert_eq!(decode(&[bytes_ty], &bytes).unwrap(), vec![items]);

    let record = Type::record([("a", Type::Nat), ("r", Type::Reserved)]).unwrap();
    let value = Value::record([("a", Value::nat(1)), ("r", Value::Reserved)]);
    let bytes = encode(&[record.clone()], &[value.clone()]).unwrap();
    assert_eq!(decode(&[record.clone()], &bytes).unwrap(), vec![value]);

    // values that could not come back unchanged are refused up front
    let extra = Value::record([
        ("a", Value::nat(1)),
        ("r", Value::Reserved),
        ("b", Value::text("lost")),
    ]);
    assert!(!record.is_valid_value(&extra));
    assert_eq!(
        encode(&[record], &[extra]),
        Err(Error::UnexpectedField("b".into()))
    );
    assert!(matches!(
        encode(&[Type::Reserved], &[Value::text("x")]),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_self_bodied_placeholder_cannot_be_encoded() {
    let rec = RecursiveType::new();
    assert_eq!(rec.fill(rec.as_type()), Err(Error::CyclicType));
    assert_eq!(
        encode(&[rec.as_type()], &[Value::Null]),
        Err(Error::UninitializedType)
    );

    // a long chain of placeholders stops at the depth limit
    let chain: Vec<RecursiveType> = (0..MAX_RECURSION_DEPTH + 8)
        .map(|_| RecursiveType::new())
        .collect();
    chain[chain.len() - 1].fill(Type::Null).unwrap();
    for pair in chain.windows(2) {
        pair[0].fill(pair[1].as_type()).unwrap();
    }
    assert_eq!(
        encode(&[chain[0].as_type()], &[Value::Null]),
        Err(Error::RecursionDepthExceeded(MAX_RECURSION_DEPTH))
    );
    assert_eq!(
        encode(&[chain[chain.len() - 2].as_type()], &[Value::Null]).unwrap(),
        b"DIDL\x00\x01\x7f".to_vec()
    );
}

#[test]
fn test_extra_fields_and_values_are_skipped() {
    let wide = Type::record([
        ("a", Type::Nat),
        ("extra", Type::vec(Type::Text)),
        ("more", Type::opt(list_type())),
    ])
    .unwrap();
    let value = Value::record([
        ("a", Value::nat(3)),
        ("extra", Value::Vector(vec![Value::text("skip"), Value::text("me")])),
        ("more", Value::some(list_node(&[1, 2]))),
    ]);
    let bytes = encode(
        &[wide, Type::Text, profile_type()],
        &[value, Value::text("trailing"), profile_value()],
    )
    .unwrap();

    let narrow = Type::record([("a", Type::Nat)]).unwrap();
    assert_eq!(
        decode(&[narrow], &bytes).unwrap(),
        vec![Value::record([("a", Value::nat(3))])]
    );
    assert!(decode(&[], &bytes).unwrap().is_empty());
}

#[test]
fn test_added_optional_fields() {
    let old = Type::record([("name", Type::Text)]).unwrap();
    let bytes = encode(&[old], &[Value::record([("name", Value::text("ada"))])]).unwrap();

    let new = Type::record([("name", Type::Text), ("nick", Type::opt(Type::Text))]).unwrap();
    assert_eq!(
        decode(&[new], &bytes).unwrap(),
        vec![Value::record([
            ("name", Value::text("ada")),
            ("nick", Value::none())
        ])]
    );
}

#[test]
fn test_reserved_accepts_anything() {
    let bytes = encode(&[profile_type()], &[profile_value()]).unwrap();
    assert_eq!(decode(&[Type::Reserved], &bytes).unwrap(), vec![Value::Reserved]);
}

#[test]
fn test_truncated_prefixes_fail() {
    init_tracing();
    let bytes = encode(
        &[profile_type(), list_type()],
        &[profile_value(), list_node(&[1, -1])],
    )
    .unwrap();
    let types = [profile_type(), list_type()];
    assert!(decode(&types, &bytes).is_ok());
    for len in 1..bytes.len() {
        let err = decode(&types, &bytes[..len]).unwrap_err();
        assert!(err.is_end_of_buffer(), "prefix {len}: {err}");
    }
}

#[test]
fn test_trailing_bytes() {
    let mut bytes = encode(&[Type::Nat], &[Value::nat(1)]).unwrap();
    bytes.push(0);
    assert_eq!(decode(&[Type::Nat], &bytes), Err(Error::TrailingBytes(1)));
}

#[test]
fn test_too_few_arguments() {
    let bytes = encode(&[Type::Nat], &[Value::nat(1)]).unwrap();
    assert_eq!(
        decode(&[Type::Nat, Type::Text], &bytes),
        Err(Error::ArityMismatch {
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn test_error_categories() {
    use crate::ErrorCategory;

    let bytes = encode(&[Type::Nat], &[Value::nat(1)]).unwrap();
    let type_err = decode(&[Type::Text], &bytes).unwrap_err();
    assert_eq!(type_err.category(), ErrorCategory::Type);

    let format_err = decode(&[Type::Nat], b"NOPE\x00\x00").unwrap_err();
    assert_eq!(format_err.category(), ErrorCategory::Format);

    let arity_err = encode(&[Type::Nat], &[]).unwrap_err();
    assert_eq!(arity_err.category(), ErrorCategory::Arity);
}

#[test]
fn test_unfilled_recursive_type() {
    let rec = RecursiveType::new();
    assert_eq!(
        encode(&[rec.as_type()], &[Value::Null]),
        Err(Error::UninitializedType)
    );
    let bytes = encode(&[Type::Null], &[Value::Null]).unwrap();
    assert_eq!(decode(&[rec.as_type()], &bytes), Err(Error::UninitializedType));
}

#[test]
fn test_concurrent_decoding() {
    let ty = profile_type();
    let bytes = encode(&[ty.clone()], &[profile_value()]).unwrap();
    let decoder = Decoder::new();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(
                    decoder.decode(&[ty.clone()], &bytes).unwrap(),
                    vec![profile_value()]
                );
            });
        }
    });
}
