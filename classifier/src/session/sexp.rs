//! Plist helpers for the s-expression formats used by config, trace and
//! scene files.

use lexpr::Value;

use crate::gaze::math::{Quat, Vec3};

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` and `Value::Symbol(":key")` forms.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a value as a string: keywords lose their colon, booleans become
/// `t`/`nil`.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "t" } else { "nil" }).to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

pub fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Treats "nil" as false, anything else as true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Numbers of a list value, in order. Non-numeric elements yield `None`.
pub fn get_numbers(value: &Value, key: &str) -> Option<Vec<f32>> {
    let list = get_value(value, key)?;
    flatten_list(list)
        .into_iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
        .collect()
}

/// A three-element list `(x y z)`.
pub fn get_vec3(value: &Value, key: &str) -> Option<Vec3> {
    match get_numbers(value, key)?.as_slice() {
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// A four-element list `(x y z w)`.
pub fn get_quat(value: &Value, key: &str) -> Option<Quat> {
    match get_numbers(value, key)?.as_slice() {
        [x, y, z, w] => Some(Quat::new(*x, *y, *z, *w)),
        _ => None,
    }
}

/// Flatten a possibly nested list into its leaf values.
fn flatten_list(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    fn walk<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
        match v {
            Value::Cons(pair) => {
                walk(pair.car(), out);
                walk(pair.cdr(), out);
            }
            Value::Null => {}
            other => out.push(other),
        }
    }
    walk(value, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_keyword_from_plist() {
        let v = lexpr::from_str("(:mode :auto :count 3)").unwrap();
        assert_eq!(get_keyword(&v, "mode"), Some("auto".to_string()));
        assert_eq!(get_int(&v, "count"), Some(3));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_string_value() {
        let v = lexpr::from_str("(:name \"Cube (1)\")").unwrap();
        assert_eq!(get_keyword(&v, "name"), Some("Cube (1)".to_string()));
    }

    #[test]
    fn test_get_float_and_negative() {
        let v = lexpr::from_str("(:a 0.25 :b -2)").unwrap();
        assert_eq!(get_float(&v, "a"), Some(0.25));
        assert_eq!(get_float(&v, "b"), Some(-2.0));
    }

    #[test]
    fn test_get_bool() {
        let v = lexpr::from_str("(:on t :off nil)").unwrap();
        assert_eq!(get_bool(&v, "on"), Some(true));
        assert_eq!(get_bool(&v, "off"), Some(false));
    }

    #[test]
    fn test_get_vec3() {
        let v = lexpr::from_str("(:pos (1 -2.5 3))").unwrap();
        assert_eq!(get_vec3(&v, "pos"), Some(Vec3::new(1.0, -2.5, 3.0)));
    }

    #[test]
    fn test_get_vec3_wrong_arity() {
        let v = lexpr::from_str("(:pos (1 2))").unwrap();
        assert_eq!(get_vec3(&v, "pos"), None);
        let v = lexpr::from_str("(:pos (1 2 x))").unwrap();
        assert_eq!(get_vec3(&v, "pos"), None);
    }

    #[test]
    fn test_get_quat() {
        let v = lexpr::from_str("(:rot (0 0 0 1))").unwrap();
        assert_eq!(get_quat(&v, "rot"), Some(Quat::IDENTITY));
    }

    #[test]
    fn test_key_without_value() {
        let v = lexpr::from_str("(:dangling)").unwrap();
        assert_eq!(get_value(&v, "dangling"), None);
    }
}
