//! Property-Based Tests for Store Module
//!
//! Uses proptest to check store behavior over generated keys and JSON values.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tokio::runtime::Runtime;

use crate::error::StateError;
use crate::store::{StateStore, ValueType, MAX_VALUE_BYTES};

// == Helpers ==
fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// == Strategies ==
/// Generates valid keys (non-empty, including non-ASCII)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-zA-Z0-9_:./-]{1,64}", "\\PC{1,16}"]
}

/// Generates JSON values of every shape, nested a few levels deep.
///
/// Numbers are integers so they survive a text round-trip exactly.
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        "\\PC{0,32}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Round-trip: set then get returns the same value with the shape tag of that value
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in json_value_strategy()) {
        let rt = runtime();
        let (stored, outcome) = rt.block_on(async {
            let store = StateStore::open_in_memory().await.unwrap();
            let outcome = store.set(&key, &value, None, "prop").await.unwrap();
            (store.get(&key).await.unwrap(), outcome)
        });

        let stored = stored.expect("value should be found");
        prop_assert_eq!(&stored.value, &value);
        prop_assert_eq!(stored.value_type, ValueType::of(&value));
        prop_assert_eq!(outcome.size, serde_json::to_string(&value).unwrap().len());
    }

    // Delete removes the entry and a second delete reports nothing removed
    #[test]
    fn prop_delete_is_idempotent(key in valid_key_strategy(), value in json_value_strategy()) {
        let rt = runtime();
        let (first, second, after) = rt.block_on(async {
            let store = StateStore::open_in_memory().await.unwrap();
            store.set(&key, &value, None, "prop").await.unwrap();
            let first = store.delete(&key).await.unwrap();
            let second = store.delete(&key).await.unwrap();
            (first, second, store.get(&key).await.unwrap())
        });

        prop_assert!(first);
        prop_assert!(!second);
        prop_assert!(after.is_none());
    }

    // Overwrite keeps exactly one entry holding the latest value
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        first in json_value_strategy(),
        second in json_value_strategy(),
    ) {
        let rt = runtime();
        let (stored, count, listed) = rt.block_on(async {
            let store = StateStore::open_in_memory().await.unwrap();
            store.set(&key, &first, None, "one").await.unwrap();
            store.set(&key, &second, None, "two").await.unwrap();
            (
                store.get(&key).await.unwrap(),
                store.count().await.unwrap(),
                store.list().await.unwrap(),
            )
        });

        let stored = stored.expect("value should be found");
        prop_assert_eq!(&stored.value, &second);
        prop_assert_eq!(count, 1);
        prop_assert_eq!(listed.len(), 1);
        prop_assert_eq!(&listed[0].agent, "two");
        prop_assert_eq!(listed[0].value_type, ValueType::of(&second));
    }

    // List returns each distinct live key once, and clear reports that many rows
    #[test]
    fn prop_list_and_clear_counts(keys in prop::collection::vec(valid_key_strategy(), 1..20)) {
        let rt = runtime();
        let (listed, cleared, remaining) = rt.block_on(async {
            let store = StateStore::open_in_memory().await.unwrap();
            for key in &keys {
                store.set(key, &Value::Bool(true), None, "prop").await.unwrap();
            }
            let listed = store.list().await.unwrap();
            let cleared = store.clear().await.unwrap();
            (listed, cleared, store.list().await.unwrap())
        });

        let distinct: HashSet<&String> = keys.iter().collect();
        let listed_keys: HashSet<&String> = listed.iter().map(|e| &e.key).collect();
        prop_assert_eq!(listed.len(), distinct.len());
        prop_assert_eq!(listed_keys, distinct.clone());
        prop_assert_eq!(cleared, distinct.len() as u64);
        prop_assert!(remaining.is_empty());
    }

    // Size limit: accepted exactly when the encoding fits, rejected writes leave no entry
    #[test]
    fn prop_size_limit_enforced(extra in 0usize..4, under in any::<bool>()) {
        // String payload of n chars encodes to n + 2 bytes
        let encoded_len = if under { MAX_VALUE_BYTES - extra } else { MAX_VALUE_BYTES + 1 + extra };
        let value = Value::String("x".repeat(encoded_len - 2));

        let rt = runtime();
        let (result, meta) = rt.block_on(async {
            let store = StateStore::open_in_memory().await.unwrap();
            let result = store.set("big", &value, None, "prop").await;
            (result, store.meta("big").await.unwrap())
        });

        if under {
            prop_assert_eq!(result.unwrap().size, encoded_len);
            prop_assert!(meta.is_some());
        } else {
            let is_size_error = matches!(
                result,
                Err(StateError::ValueTooLarge { size, .. }) if size == encoded_len
            );
            prop_assert!(is_size_error);
            prop_assert!(meta.is_none());
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_covers_every_shape() {
        use proptest::strategy::ValueTree;
        use proptest::test_runner::TestRunner;

        let mut runner = TestRunner::deterministic();
        let strategy = json_value_strategy();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let value = strategy.new_tree(&mut runner).unwrap().current();
            seen.insert(ValueType::of(&value));
        }
        assert_eq!(seen.len(), 6, "generated shapes: {:?}", seen);
    }
}
