//! Nested-key query string encoding.
//!
//! Objects expand to `key[sub]=..`, arrays of strings join with commas,
//! other arrays expand to `key[]=..` per element, and booleans encode as
//! `1`/`0`. Top-level keys are emitted in sorted order.

use courier_core_types::error::service;
use courier_core_types::CourierError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Query escaping keeps unreserved characters plus `/` and `?`, matching
/// the URL query component rules minus the general and sub delimiters.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b'?');

pub(crate) fn escape(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ESCAPE).to_string()
}

/// Encodes `params` (which must serialize to a JSON object) into a query
/// string without the leading `?`.
pub(crate) fn query_string<T: serde::Serialize>(params: &T) -> Result<String, CourierError> {
    let value = serde_json::to_value(params)
        .map_err(|err| service::fields_encoding_failure(&err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(service::fields_encoding_failure(
            "parameters must serialize to a JSON object",
        ));
    };

    let mut components = Vec::new();
    // serde_json maps iterate in sorted key order.
    for (key, value) in &map {
        expand(key, value, &mut components);
    }
    Ok(components
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&"))
}

fn expand(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested, nested_value) in map {
                expand(&format!("{key}[{nested}]"), nested_value, out);
            }
        }
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",");
            out.push((escape(key), escape(&joined)));
        }
        Value::Array(items) => {
            for item in items {
                expand(&format!("{key}[]"), item, out);
            }
        }
        Value::Bool(flag) => out.push((escape(key), String::from(if *flag { "1" } else { "0" }))),
        Value::Number(number) => out.push((escape(key), number.to_string())),
        Value::String(text) => out.push((escape(key), escape(text))),
        Value::Null => out.push((escape(key), String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_come_out_sorted() {
        let query = query_string(&json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(query, "a=1&b=2");
    }

    #[test]
    fn booleans_encode_as_bits() {
        let query = query_string(&json!({"flag": true, "other": false})).unwrap();
        assert_eq!(query, "flag=1&other=0");
    }

    #[test]
    fn nested_objects_use_bracket_keys() {
        let query = query_string(&json!({"outer": {"inner": "v"}})).unwrap();
        assert_eq!(query, "outer%5Binner%5D=v");
    }

    #[test]
    fn string_arrays_join_with_commas() {
        let query = query_string(&json!({"tags": ["a", "b"]})).unwrap();
        assert_eq!(query, "tags=a%2Cb");
    }

    #[test]
    fn mixed_arrays_expand_per_element() {
        let query = query_string(&json!({"n": [1, 2]})).unwrap();
        assert_eq!(query, "n%5B%5D=1&n%5B%5D=2");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let query = query_string(&json!({"q": "a&b=c"})).unwrap();
        assert_eq!(query, "q=a%26b%3Dc");
    }

    #[test]
    fn non_object_parameters_are_rejected() {
        let error = query_string(&json!([1, 2])).unwrap_err();
        assert_eq!(error.code, service::FIELDS_ENCODING_FAILURE);
    }
}
