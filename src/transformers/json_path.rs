#![allow(clippy::collapsible_if)]
//! JSON path read helpers for response checking
//!
//! Paths are dotted with optional indices: `data[0].code`.

use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum PathSeg {
    Key(String),
    Index(usize),
}

/// Parse a dotted/array path like `a.b[0].c[2]` into segments
pub(super) fn parse_path(path: &str) -> Vec<PathSeg> {
    let mut segs = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            continue;
        }
        let mut key = String::new();
        let mut chars = part.chars().peekable();
        while let Some(&ch) = chars.peek() {
            if ch == '[' {
                break;
            }
            key.push(ch);
            chars.next();
        }
        if !key.is_empty() {
            segs.push(PathSeg::Key(key));
        }
        while let Some(&ch) = chars.peek() {
            if ch != '[' {
                break;
            }
            chars.next();
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d == ']' {
                    break;
                }
                num.push(d);
                chars.next();
            }
            let _ = chars.next();
            if let Ok(idx) = num.parse::<usize>() {
                segs.push(PathSeg::Index(idx));
            }
        }
    }
    segs
}

/// Value at `path`, if every segment resolves.
pub(crate) fn get_path<'a>(v: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = v;
    for seg in parse_path(path) {
        match (seg, cur) {
            (PathSeg::Key(k), Value::Object(map)) => {
                cur = map.get(&k)?;
            }
            (PathSeg::Index(i), Value::Array(arr)) => {
                cur = arr.get(i)?;
            }
            _ => return None,
        }
    }
    Some(cur)
}

/// Scalar rendered for comparison: strings verbatim, numbers and bools via
/// `to_string`, null as empty, containers as compact JSON.
pub(crate) fn scalar_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// `scalar_string` of the value at `path`; empty when absent.
pub(crate) fn string_at(v: &Value, path: &str) -> String {
    get_path(v, path).map(scalar_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn parse_mixed_path() {
        let segs = parse_path("a.b[2].c[0][1]");
        assert!(matches!(&segs[0], PathSeg::Key(k) if k == "a"));
        assert!(matches!(&segs[1], PathSeg::Key(k) if k == "b"));
        assert!(matches!(segs[2], PathSeg::Index(2)));
        assert!(matches!(&segs[3], PathSeg::Key(k) if k == "c"));
        assert!(matches!(segs[4], PathSeg::Index(0)));
        assert!(matches!(segs[5], PathSeg::Index(1)));
    }

    #[test]
    fn reads_nested_values() {
        let v = json!({"data": [{"code": 0}, {"code": 22, "msg": "bad"}], "Code": "OK"});
        assert_eq!(string_at(&v, "Code"), "OK");
        assert_eq!(string_at(&v, "data[1].code"), "22");
        assert_eq!(string_at(&v, "data[1].msg"), "bad");
        assert_eq!(string_at(&v, "data[5].code"), "");
        assert_eq!(string_at(&v, "Code.inner"), "");
    }

    #[test]
    fn scalars_render_like_vendor_literals() {
        assert_eq!(scalar_string(&json!(0)), "0");
        assert_eq!(scalar_string(&json!(200)), "200");
        assert_eq!(scalar_string(&json!("000000")), "000000");
        assert_eq!(scalar_string(&json!(true)), "true");
        assert_eq!(scalar_string(&Value::Null), "");
    }

    proptest! {
        #[test]
        fn prop_index_lookup_matches_array(i in 0usize..8, len in 0usize..8) {
            let arr: Vec<Value> = (0..len).map(|n| json!({"code": n})).collect();
            let v = json!({"data": arr});
            let got = get_path(&v, &format!("data[{i}].code")).and_then(Value::as_u64);
            if i < len {
                prop_assert_eq!(got, Some(i as u64));
            } else {
                prop_assert_eq!(got, None);
            }
        }
    }
}
