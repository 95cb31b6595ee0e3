use serde_json::{Map, Value};
use sheetscript_core::CellValue;
use std::cmp::Ordering;

/// The records of a dataset; non-array datasets have none
pub fn records(data: &Value) -> &[Value] {
    data.as_array().map(|v| v.as_slice()).unwrap_or(&[])
}

/// Field lookup on a record; Null for missing keys or non-objects
pub fn field<'a>(record: &'a Value, key: &str) -> &'a Value {
    record.get(key).unwrap_or(&Value::Null)
}

/// A record field rendered as display text ("" for missing fields)
pub fn field_text(record: &Value, key: &str) -> String {
    value_to_cell(field(record, key)).as_text()
}

/// Convert a data value into a cell value
pub fn value_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

/// String form of a value used as a group key (and so as a sheet name)
pub fn value_key(value: &Value) -> String {
    value_to_cell(value).as_text()
}

/// Group the dataset's records by the given column, preserving the
/// order in which key values first appear. Each group's subset is an
/// array of the records carrying that key value.
pub fn group_by(data: &Value, key: &str) -> Vec<(String, Value)> {
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for record in records(data) {
        let group_key = value_key(field(record, key));
        match groups.iter_mut().find(|(k, _)| *k == group_key) {
            Some((_, members)) => members.push(record.clone()),
            None => groups.push((group_key, vec![record.clone()])),
        }
    }
    groups
        .into_iter()
        .map(|(k, members)| (k, Value::Array(members)))
        .collect()
}

/// Deduplicate records by the given key columns: each distinct key
/// combination yields one record reduced to just those columns, first
/// occurrence winning.
pub fn distinct_by(data: &Value, keys: &[String]) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    for record in records(data) {
        let seen = result
            .iter()
            .any(|r| keys.iter().all(|k| values_equal(field(r, k), field(record, k))));
        if !seen {
            let mut reduced = Map::new();
            for k in keys {
                reduced.insert(k.clone(), field(record, k).clone());
            }
            result.push(Value::Object(reduced));
        }
    }
    result
}

/// Compare two data values: numbers numerically, otherwise by their
/// text form
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_key(a).cmp(&value_key(b)),
    }
}

/// Loose equality: numeric values compare numerically even when one
/// side is numeric text
pub fn values_equal(a: &Value, b: &Value) -> bool {
    let numeric = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// The dataset-wide extreme of a column; None for an empty dataset
pub fn column_extreme(data: &Value, key: &str, want_max: bool) -> Option<Value> {
    let mut best: Option<&Value> = None;
    for record in records(data) {
        let value = field(record, key);
        best = match best {
            None => Some(value),
            Some(current) => {
                let ord = compare_values(value, current);
                if (want_max && ord == Ordering::Greater)
                    || (!want_max && ord == Ordering::Less)
                {
                    Some(value)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.cloned()
}

/// Navigate a value by path segments: object keys or array indices.
/// A missing step resolves to Null, never an error.
pub fn navigate(data: &Value, segments: &[&str]) -> Value {
    let mut current = data;
    for segment in segments {
        let next = match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return Value::Null,
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_by_preserves_first_occurrence_order() {
        let data = json!([
            {"region": "south", "v": 1},
            {"region": "north", "v": 2},
            {"region": "south", "v": 3},
        ]);
        let groups = group_by(&data, "region");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "south");
        assert_eq!(records(&groups[0].1).len(), 2);
        assert_eq!(groups[1].0, "north");
        assert_eq!(records(&groups[1].1).len(), 1);
    }

    #[test]
    fn test_distinct_by_reduces_to_key_columns() {
        let data = json!([
            {"a": 1, "b": 2, "extra": "x"},
            {"a": 1, "b": 2, "extra": "y"},
            {"a": 1, "b": 3, "extra": "z"},
        ]);
        let keys = vec!["a".to_string(), "b".to_string()];
        let result = distinct_by(&data, &keys);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], json!({"a": 1, "b": 2}));
        assert_eq!(result[1], json!({"a": 1, "b": 3}));
    }

    #[test]
    fn test_column_extreme() {
        let data = json!([{"v": 1}, {"v": 5}, {"v": 2}]);
        assert_eq!(column_extreme(&data, "v", true), Some(json!(5)));
        assert_eq!(column_extreme(&data, "v", false), Some(json!(1)));
        assert_eq!(column_extreme(&json!([]), "v", true), None);
    }

    #[test]
    fn test_navigate_paths() {
        let data = json!({"orders": [{"id": 7}], "meta": {"year": 2024}});
        assert_eq!(navigate(&data, &["meta", "year"]), json!(2024));
        assert_eq!(navigate(&data, &["orders", "0", "id"]), json!(7));
        assert_eq!(navigate(&data, &["missing", "key"]), Value::Null);
    }

    #[test]
    fn test_values_equal_is_numerically_loose() {
        assert!(values_equal(&json!(5), &json!("5")));
        assert!(values_equal(&json!("a"), &json!("a")));
        assert!(!values_equal(&json!(5), &json!("6")));
        assert!(values_equal(&Value::Null, &Value::Null));
    }
}
