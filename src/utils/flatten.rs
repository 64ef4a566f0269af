use serde_json::{Map, Value};

/// Flatten a nested json document into a single-level map, joining the
/// key paths with `separator`, e.g. `outcomes.hospitalized.currently`
/// becomes `outcomes_hospitalized_currently`.
///
/// Anything that is not a json object flattens to an empty map.
pub fn flatten(doc: &Value, separator: &str) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(fields) = doc {
        push_fields(fields, None, separator, &mut flat);
    }
    flat
}

fn push_fields(
    fields: &Map<String, Value>,
    prefix: Option<&str>,
    separator: &str,
    flat: &mut Map<String, Value>,
) {
    for (key, value) in fields {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => push_fields(nested, Some(&path), separator, flat),
            _ => {
                flat.insert(path, value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::flatten;

    #[test]
    fn flatten_nested() {
        let doc = json!({"a": {"b": 1}});
        let flat = flatten(&doc, "_");
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a_b"], json!(1));
    }

    #[test]
    fn flatten_is_identity_on_flat_input() {
        let doc = json!({"date": "2021-01-01", "states": 50, "cases_total": 1000});
        let flat = flatten(&doc, "_");
        assert_eq!(Value::Object(flat), doc);
    }

    #[test]
    fn flatten_three_levels() {
        let doc = json!({
            "outcomes": {
                "hospitalized": {
                    "currently": 23_000,
                    "in_icu": {"currently": 4_500}
                }
            }
        });
        let flat = flatten(&doc, "_");
        assert_eq!(flat["outcomes_hospitalized_currently"], json!(23_000));
        assert_eq!(flat["outcomes_hospitalized_in_icu_currently"], json!(4_500));
    }

    #[test]
    fn flatten_non_object_is_empty() {
        assert!(flatten(&json!([1, 2]), "_").is_empty());
        assert!(flatten(&json!(null), "_").is_empty());
        assert!(flatten(&json!("data"), "_").is_empty());
    }
}
