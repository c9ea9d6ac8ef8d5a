//! Field lookup on loosely typed JSON results

use serde_json::Value;

/// Look up one key. Objects are indexed by name, arrays by position.
pub fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Walk a dotted path such as `meta.description` or `images.0.url`.
///
/// Returns `None` as soon as a segment is missing.
pub fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| lookup(current, segment))
}

/// Text form used for comparisons
///
/// Missing values and null are empty, strings are unquoted, everything
/// else is compact JSON.
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_walk_nested() {
        let v = json!({"meta": {"description": "A site"}, "images": [{"url": "http://i/1.png"}]});
        assert_eq!(walk(&v, "meta.description"), Some(&json!("A site")));
        assert_eq!(walk(&v, "images.0.url"), Some(&json!("http://i/1.png")));
        assert_eq!(walk(&v, "meta.missing.deeper"), None);
        assert_eq!(walk(&v, "images.x"), None);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(None), "");
        assert_eq!(to_text(Some(&Value::Null)), "");
        assert_eq!(to_text(Some(&json!("html"))), "html");
        assert_eq!(to_text(Some(&json!(401))), "401");
        assert_eq!(to_text(Some(&json!(true))), "true");
        assert_eq!(to_text(Some(&json!({"a": 1}))), r#"{"a":1}"#);
    }
}
