use serde_json::Value;

/// Print only scalar result fields, one `key=value` per line.
pub fn print_minimal(value: &Value) {
    let result = match value {
        Value::Object(map) => map.get("result").unwrap_or(value),
        _ => value,
    };

    match result {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Array(_) | Value::Object(_) => continue,
                    Value::Null => continue,
                    _ => println!("{}={}", key, scalar(val)),
                }
            }
        }
        _ => println!("{}", scalar(result)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
