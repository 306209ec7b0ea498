use serde_json::{Map, Value};

/// Key answer fields, most specific first.
const PRIORITY_KEYS: [&str; 9] = [
    "reconciled_total",
    "overall_score",
    "accuracy_grade",
    "mape",
    "total_revenue",
    "totals",
    "revenue",
    "grade",
    "severity",
];

/// Fields naming an element of an array result.
const LABEL_KEYS: [&str; 4] = ["scenario_name", "name", "period_label", "project_id"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(value) {
        println!("{}", line);
    }
}

/// Key answer lines for an envelope or bare value.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field. Array results, and results carrying a `rows` array
/// (scenario comparison), give one line per element.
fn minimal_lines(value: &Value) -> Vec<String> {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => match map.get("rows") {
            Some(Value::Array(rows)) => rows.iter().map(element_line).collect(),
            _ => vec![key_answer(map)],
        },
        Value::Array(items) => items.iter().map(element_line).collect(),
        other => vec![format_minimal(other)],
    }
}

fn element_line(item: &Value) -> String {
    match item {
        Value::Object(map) => match label(map) {
            Some(label) => format!("{}: {}", label, key_answer(map)),
            None => key_answer(map),
        },
        other => format_minimal(other),
    }
}

fn key_answer(map: &Map<String, Value>) -> String {
    for key in &PRIORITY_KEYS {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }
    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn label(map: &Map<String, Value>) -> Option<String> {
    LABEL_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_comparison_rows_one_line_each() {
        let envelope = json!({
            "result": {
                "rows": [
                    {"scenario_name": "Base Case", "total_revenue": "4200", "periods": []},
                    {"scenario_name": "Optimistic", "total_revenue": "5100", "periods": []}
                ],
                "unknown_scenarios": []
            },
            "warnings": []
        });
        assert_eq!(
            minimal_lines(&envelope),
            vec!["Base Case: 4200".to_string(), "Optimistic: 5100".to_string()]
        );
    }

    #[test]
    fn test_priority_key_wins() {
        let envelope = json!({"result": {"records": [], "reconciled_total": "112"}});
        assert_eq!(minimal_lines(&envelope), vec!["112".to_string()]);
    }

    #[test]
    fn test_fallback_to_first_field() {
        let bare = json!({"unmatched_periods": ["2024-04"]});
        assert_eq!(
            minimal_lines(&bare),
            vec![r#"unmatched_periods: ["2024-04"]"#.to_string()]
        );
    }

    #[test]
    fn test_labelled_array_elements() {
        let points = json!([{"period_label": "2025Q1", "revenue": "1050"}, 7]);
        assert_eq!(
            minimal_lines(&points),
            vec!["2025Q1: 1050".to_string(), "7".to_string()]
        );
    }
}
