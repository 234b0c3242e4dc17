//! String-path property lookup over JSON values.
//!
//! Paths are `.`-separated with optional bracketed indices, so `a[0].b` and
//! `a.0.b` address the same value. A missing segment is a normal outcome and
//! yields `None`.

use serde_json::Value;

/// Split a property path into its segments.
///
/// `[word]` is rewritten to `.word` and a single leading dot is stripped.
/// Brackets holding anything other than word characters are kept literally.
pub fn segments(path: &str) -> Vec<String> {
    let mut normalized = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(open) = rest.find('[') {
        normalized.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) if close > 0 && after[..close].chars().all(is_word_char) => {
                normalized.push('.');
                normalized.push_str(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => {
                normalized.push('[');
                rest = after;
            }
        }
    }
    normalized.push_str(rest);

    let trimmed = normalized.strip_prefix('.').unwrap_or(&normalized);
    trimmed.split('.').map(str::to_string).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Look up one key on a container. Arrays accept decimal indices.
fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Walk pre-split segments from `root`.
pub fn resolve_segments<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| child(current, segment.as_ref()))
}

/// Resolve `path` against `root`, returning `None` when any segment is missing.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    resolve_segments(root, &segments(path))
}

/// Remove the value addressed by pre-split segments, returning it.
pub fn remove_segments<S: AsRef<str>>(root: &mut Value, segments: &[S]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;

    let mut current = root;
    for segment in parents {
        current = match current {
            Value::Object(map) => map.get_mut(segment.as_ref())?,
            Value::Array(items) => items.get_mut(segment.as_ref().parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Object(map) => map.remove(last.as_ref()),
        // Arrays keep their length; the slot is nulled out.
        Value::Array(items) => {
            let slot = items.get_mut(last.as_ref().parse::<usize>().ok()?)?;
            Some(slot.take())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolves_nested_value() {
        let root = json!({ "body": { "g": "tok" } });
        assert_eq!(resolve(&root, "body.g"), Some(&json!("tok")));
    }

    #[test]
    fn test_missing_segment_is_none() {
        let root = json!({});
        assert_eq!(resolve(&root, "body.token"), None);

        let root = json!({ "body": "not-an-object" });
        assert_eq!(resolve(&root, "body.token.deeper"), None);
    }

    #[test]
    fn test_bracket_and_dot_forms_agree() {
        let root = json!({ "a": [{ "b": 7 }], "m": { "0": { "b": 8 } } });
        assert_eq!(resolve(&root, "a[0].b"), Some(&json!(7)));
        assert_eq!(resolve(&root, "a.0.b"), Some(&json!(7)));
        assert_eq!(resolve(&root, "m[0].b"), Some(&json!(8)));
    }

    #[test]
    fn test_leading_dot_is_stripped() {
        let root = json!({ "body": { "x": true } });
        assert_eq!(resolve(&root, ".body.x"), Some(&json!(true)));
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("body.g-recaptcha-response"), vec!["body", "g-recaptcha-response"]);
        assert_eq!(segments("a[0][key].c"), vec!["a", "0", "key", "c"]);
        assert_eq!(segments("a[x-y]"), vec!["a[x-y]"]);
    }

    #[test]
    fn test_deep_path() {
        let root = json!({ "a": { "b": { "c": { "d": { "e": "deep" } } } } });
        assert_eq!(resolve(&root, "a.b.c.d.e"), Some(&json!("deep")));
        assert_eq!(resolve(&root, "a.b.c.x.e"), None);
    }

    #[test]
    fn test_remove_nested() {
        let mut root = json!({ "captcha": { "token": "abc", "keep": 1 } });
        assert_eq!(remove_segments(&mut root, &["captcha", "token"]), Some(json!("abc")));
        assert_eq!(root, json!({ "captcha": { "keep": 1 } }));
        assert_eq!(remove_segments(&mut root, &["captcha", "token"]), None);
    }
}
