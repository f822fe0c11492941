//! Deserializers for filter forms that arrive either as query strings or JSON.

use serde::{Deserialize, Deserializer, de};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum FormValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

/// Form fields arrive as strings from query strings and as typed values from
/// JSON bodies. Blank strings count as absent.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = match Option::<FormValue>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(FormValue::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(FormValue::Text(text)) => text.trim().to_string(),
        Some(FormValue::Number(n)) => n.to_string(),
        Some(FormValue::Flag(b)) => b.to_string(),
    };

    raw.parse().map(Some).map_err(de::Error::custom)
}

/// Checkbox-style flag: `true`, `1`, `on` and `yes` are set, anything else is not.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FormValue>::deserialize(deserializer)? {
        None => false,
        Some(FormValue::Flag(b)) => b,
        Some(FormValue::Number(n)) => n != 0,
        Some(FormValue::Text(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "empty_as_none")]
        day: Option<NaiveDate>,
        #[serde(default, deserialize_with = "empty_as_none")]
        id: Option<i32>,
        #[serde(default, deserialize_with = "flag")]
        export: bool,
    }

    #[test]
    fn json_values_are_accepted() {
        let form: Form =
            serde_json::from_str(r#"{"day": "2026-03-01", "id": 4, "export": true}"#).unwrap();
        assert_eq!(form.day, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(form.id, Some(4));
        assert!(form.export);
    }

    #[test]
    fn blank_strings_are_absent() {
        let form: Form = serde_json::from_str(r#"{"day": "", "id": " ", "export": "off"}"#).unwrap();
        assert_eq!(form.day, None);
        assert_eq!(form.id, None);
        assert!(!form.export);
    }

    #[test]
    fn missing_fields_default() {
        let form: Form = serde_json::from_str("{}").unwrap();
        assert_eq!(form.day, None);
        assert!(!form.export);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(serde_json::from_str::<Form>(r#"{"day": "yesterday"}"#).is_err());
    }
}
