//! The `Human` record and its wire format.

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the `humans` table.
///
/// The JSON field names `F_name` / `L_name` are part of the public wire
/// format and must not change.
///
/// Deserialization is lenient, matching what clients have always been able
/// to send: every field may be omitted, names may be `null` (both read as
/// empty), and unknown fields are ignored. A body that is not a JSON object
/// at all is still an error.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Human {
    #[serde(default)]
    pub id: i32,
    #[serde(rename = "F_name", default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(rename = "L_name", default, deserialize_with = "null_as_empty")]
    pub last_name: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let h = Human { id: 1, first_name: "John".into(), last_name: "Doe".into() };
        assert_eq!(
            serde_json::to_value(&h).unwrap(),
            json!({"id": 1, "F_name": "John", "L_name": "Doe"})
        );
    }

    #[test]
    fn missing_and_null_fields_read_as_empty() {
        let h: Human = serde_json::from_str(r#"{"F_name": null, "extra": true}"#).unwrap();
        assert_eq!(h, Human::default());
    }

    #[test]
    fn snake_case_names_are_not_accepted_as_aliases() {
        let h: Human = serde_json::from_str(r#"{"first_name": "John"}"#).unwrap();
        assert_eq!(h.first_name, "");
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(serde_json::from_str::<Human>(r#""John Doe""#).is_err());
        assert!(serde_json::from_str::<Human>(r#"{"id": "seven"}"#).is_err());
    }
}
