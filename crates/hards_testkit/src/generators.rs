//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use hards_core::Data;
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

/// Strategy for generating valid dataset, datapoint and file names.
pub fn valid_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_-][A-Za-z0-9._-]{0,31}")
        .expect("Invalid regex")
        .prop_filter("Name must not be empty", |s| !s.is_empty())
}

/// Strategy for generating names that break the character rules.
///
/// Every generated name holds at least one character outside the allowed
/// set, such as a path separator or whitespace.
pub fn invalid_name_strategy() -> impl Strategy<Value = String> {
    let bad = prop::sample::select(vec![
        '/', '\\', ' ', '\t', '\n', '\0', '*', '&', '(', ')', ':', '?', '%', '~', '#', 'é', '€',
    ]);
    (
        prop::string::string_regex("[A-Za-z0-9._-]{0,8}").expect("Invalid regex"),
        bad,
        prop::string::string_regex("[A-Za-z0-9._-]{0,8}").expect("Invalid regex"),
    )
        .prop_map(|(prefix, bad, suffix)| format!("{prefix}{bad}{suffix}"))
}

/// Strategy for generating data keys.
pub fn data_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating JSON values of limited depth.
///
/// Floats are quarters, which print and parse back exactly.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        (-4000i32..4000).prop_map(|n| {
            Number::from_f64(f64::from(n) / 4.0).map_or(Value::Null, Value::Number)
        }),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((data_key_strategy(), inner), 0..4)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating data maps to pass to `add_data`.
pub fn data_strategy() -> impl Strategy<Value = Data> {
    prop::collection::vec((data_key_strategy(), json_value_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}
