//! Field-level validation for request payloads.
//!
//! Request bodies are read through [`Payload`], which performs the type
//! checks (`boolean`, `integer`, `array`, ...) that a typed serde
//! deserialization would otherwise turn into a single opaque error. The
//! resulting DTOs then carry `validator` derive rules for `required`,
//! `max` and `min`, which are folded back into the same [`FieldErrors`]
//! map with [`FieldErrors::merge_validator`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A single rule violation on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Stable rule code (`required`, `max`, `exists`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Violation {
    /// Build a violation with the default message for `code` on `field`.
    pub fn new(field: &str, code: &str) -> Self {
        Self::with_params(field, code, Map::new())
    }

    /// Build a violation carrying rule parameters (e.g. `max`).
    pub fn with_params(field: &str, code: &str, params: Map<String, Value>) -> Self {
        Self {
            code: code.to_string(),
            message: default_message(field, code, &params),
            params,
        }
    }
}

/// Rule parameters for a single `key = value` pair.
pub fn param(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.into());
    map
}

fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

fn default_message(field: &str, code: &str, params: &Map<String, Value>) -> String {
    let attr = attribute(field);
    let p = |key: &str| params.get(key).map(|v| v.to_string()).unwrap_or_default();
    match code {
        "required" => format!("The {attr} field is required."),
        "max" => format!("The {attr} may not be greater than {} characters.", p("max")),
        "min" => format!("The {attr} must be at least {}.", p("min")),
        "string" => format!("The {attr} must be a string."),
        "boolean" => format!("The {attr} field must be true or false."),
        "integer" => format!("The {attr} must be an integer."),
        "array" => format!("The {attr} must be an array."),
        "date_format" => format!("The {attr} does not match the format Y."),
        "in" | "exists" => format!("The selected {attr} is invalid."),
        "genres_has_categories" => {
            format!("Each of the selected {attr} must belong to one of the selected categories.")
        }
        "file" => format!("The {attr} must be a file."),
        "mimetypes" => format!("The {attr} must be a file of type: {}.", p("types")),
        "max_file_size" => format!(
            "The {attr} may not be greater than {} bytes.",
            p("max")
        ),
        other => format!("The {attr} is invalid ({other})."),
    }
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Per-field violations, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<Violation>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn add(&mut self, field: &str, violation: Violation) {
        self.0.entry(field.to_string()).or_default().push(violation);
    }

    /// Record a violation with the default message for `code`.
    pub fn add_code(&mut self, field: &str, code: &str) {
        self.add(field, Violation::new(field, code));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[Violation]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether `field` failed the rule identified by `code`.
    pub fn has_code(&self, field: &str, code: &str) -> bool {
        self.get(field)
            .is_some_and(|violations| violations.iter().any(|v| v.code == code))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fold `validator` derive errors into this map.
    ///
    /// A field that already failed a type rule while being read is skipped,
    /// so an unparsable value reports `integer` rather than `required` too.
    pub fn merge_validator(&mut self, errors: &validator::ValidationErrors) {
        let mut incoming: Vec<_> = errors.field_errors().into_iter().collect();
        incoming.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, field_errors) in incoming {
            if self.contains(&field) {
                continue;
            }
            for err in field_errors {
                let params: Map<String, Value> = err
                    .params
                    .iter()
                    .filter(|(k, _)| k.as_ref() != "value")
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();
                let mut violation = Violation::with_params(&field, &err.code, params);
                if let Some(ref message) = err.message {
                    violation.message = message.to_string();
                }
                self.add(&field, violation);
            }
        }
    }

    /// Append every violation from `other`.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, violations) in other.0 {
            self.0.entry(field).or_default().extend(violations);
        }
    }

    /// `Ok(())` when no violation was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, violations) in &self.0 {
            for v in violations {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {}", v.code)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Typed reader over a JSON object body.
///
/// Every getter returns `None` when the key is absent, `null`, or a blank
/// string, and records a type violation when the value is present but has
/// the wrong shape. Collect the violations with [`Payload::finish`].
pub struct Payload<'a> {
    fields: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Payload<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            errors: FieldErrors::new(),
        }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    fn fail(&mut self, key: &str, code: &str) {
        self.errors.add_code(key, code);
    }

    /// Whether the key was sent at all (even as `null`).
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// A trimmed string value.
    pub fn string(&mut self, key: &str) -> Option<String> {
        match self.present(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            _ => {
                self.fail(key, "string");
                None
            }
        }
    }

    /// A string that may be explicitly cleared.
    ///
    /// `None` when the key is absent, `Some(None)` when it was sent empty or
    /// `null`, `Some(Some(_))` otherwise.
    pub fn nullable_string(&mut self, key: &str) -> Option<Option<String>> {
        if !self.has(key) {
            return None;
        }
        Some(self.string(key))
    }

    /// A boolean, also accepting the `0/1/"true"/"false"` forms browsers
    /// send in multipart forms.
    pub fn boolean(&mut self, key: &str) -> Option<bool> {
        let parsed = match self.present(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.fail(key, "boolean");
        }
        parsed
    }

    /// An integer, from a JSON number or a numeric string.
    pub fn integer(&mut self, key: &str) -> Option<i64> {
        let parsed = match self.present(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.fail(key, "integer");
        }
        parsed
    }

    /// An integer that must also fit `T` (e.g. an `i32` column).
    pub fn integer_as<T: TryFrom<i64>>(&mut self, key: &str) -> Option<T> {
        let n = self.integer(key)?;
        let converted = T::try_from(n).ok();
        if converted.is_none() {
            self.fail(key, "integer");
        }
        converted
    }

    /// A four-digit year (`date_format:Y`).
    pub fn year(&mut self, key: &str) -> Option<i16> {
        let raw = match self.present(key)? {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => String::new(),
        };
        let parsed = if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
            raw.parse::<i16>().ok()
        } else {
            None
        };
        if parsed.is_none() {
            self.errors
                .add(key, Violation::with_params(key, "date_format", param("format", "Y")));
        }
        parsed
    }

    /// A scalar that must be one of `allowed` (compared as strings, so
    /// `10` and `"10"` are the same choice).
    pub fn one_of(&mut self, key: &str, allowed: &[&str]) -> Option<String> {
        let raw = match self.present(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        match raw {
            Some(v) if allowed.contains(&v.as_str()) => Some(v),
            _ => {
                self.errors.add(
                    key,
                    Violation::with_params(key, "in", param("values", allowed.join(","))),
                );
                None
            }
        }
    }

    /// A list of ids. Duplicates are dropped, order is kept.
    ///
    /// Elements that are not UUIDs can never exist, so they report `exists`.
    pub fn id_list(&mut self, key: &str) -> Option<Vec<DbId>> {
        let items = match self.present(key)? {
            Value::Array(items) => items,
            _ => {
                self.fail(key, "array");
                return None;
            }
        };

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str().and_then(|s| s.trim().parse::<DbId>().ok()) {
                Some(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                None => {
                    self.fail(key, "exists");
                    return None;
                }
            }
        }
        Some(ids)
    }

    /// Violations recorded so far.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Consume the reader, returning the recorded type violations.
    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use validator::Validate;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[derive(Validate)]
    struct NameInput {
        #[validate(required(code = "required"), length(max = 255, code = "max"))]
        name: Option<String>,
        #[validate(range(min = 1, code = "min"))]
        duration: Option<i64>,
    }

    #[test]
    fn merge_appends_per_field() {
        let mut errors = FieldErrors::new();
        errors.add_code("title", "required");
        let mut files = FieldErrors::new();
        files.add_code("title", "max");
        files.add_code("thumb_file", "mimetypes");

        errors.merge(files);
        assert!(errors.has_code("title", "required"));
        assert!(errors.has_code("title", "max"));
        assert!(errors.has_code("thumb_file", "mimetypes"));
    }

    #[test]
    fn blank_strings_read_as_absent() {
        let body = object(json!({"name": "   ", "other": null}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.string("name"), None);
        assert_eq!(payload.string("other"), None);
        assert_eq!(payload.string("missing"), None);
        assert!(payload.finish().is_empty());
    }

    #[test]
    fn boolean_accepts_form_values_and_rejects_garbage() {
        let body = object(json!({"a": true, "b": "0", "c": 1, "d": "a"}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.boolean("a"), Some(true));
        assert_eq!(payload.boolean("b"), Some(false));
        assert_eq!(payload.boolean("c"), Some(true));
        assert_eq!(payload.boolean("d"), None);
        let errors = payload.finish();
        assert!(errors.has_code("d", "boolean"));
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn integer_and_year_rules() {
        let body = object(json!({"duration": "a", "year": "20x0", "ok": "2020", "n": 90}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.integer("duration"), None);
        assert_eq!(payload.year("year"), None);
        assert_eq!(payload.year("ok"), Some(2020));
        assert_eq!(payload.integer("n"), Some(90));
        assert_eq!(payload.integer_as::<i8>("n"), Some(90i8));
        let errors = payload.finish();
        assert!(errors.has_code("duration", "integer"));
        assert!(errors.has_code("year", "date_format"));
    }

    #[test]
    fn integer_as_rejects_out_of_range() {
        let body = object(json!({"big": 300}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.integer_as::<i8>("big"), None);
        assert!(payload.finish().has_code("big", "integer"));
    }

    #[test]
    fn one_of_compares_numbers_as_strings() {
        let body = object(json!({"rating": 10, "bad": 0}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.one_of("rating", &["L", "10"]).as_deref(), Some("10"));
        assert_eq!(payload.one_of("bad", &["L", "10"]), None);
        assert!(payload.finish().has_code("bad", "in"));
    }

    #[test]
    fn id_list_requires_array_of_uuids() {
        let id = uuid::Uuid::new_v4();
        let body = object(json!({
            "ok": [id.to_string(), id.to_string()],
            "scalar": "a",
            "numbers": [100],
        }));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.id_list("ok"), Some(vec![id]));
        assert_eq!(payload.id_list("scalar"), None);
        assert_eq!(payload.id_list("numbers"), None);
        let errors = payload.finish();
        assert!(errors.has_code("scalar", "array"));
        assert!(errors.has_code("numbers", "exists"));
    }

    #[test]
    fn nullable_string_distinguishes_absent_from_cleared() {
        let body = object(json!({"description": null, "name": "x"}));
        let mut payload = Payload::new(&body);
        assert_eq!(payload.nullable_string("description"), Some(None));
        assert_eq!(payload.nullable_string("name"), Some(Some("x".into())));
        assert_eq!(payload.nullable_string("missing"), None);
    }

    #[test]
    fn validator_errors_merge_with_params() {
        let input = NameInput {
            name: Some("a".repeat(256)),
            duration: Some(0),
        };
        let mut errors = FieldErrors::new();
        errors.merge_validator(&input.validate().unwrap_err());

        assert!(errors.has_code("name", "max"));
        let max = &errors.get("name").unwrap()[0];
        assert_eq!(max.params.get("max"), Some(&json!(255)));
        assert!(!max.params.contains_key("value"));
        assert!(errors.has_code("duration", "min"));
    }

    #[test]
    fn merge_skips_fields_with_type_errors() {
        let input = NameInput {
            name: None,
            duration: None,
        };
        let mut errors = FieldErrors::new();
        errors.add_code("name", "string");
        errors.merge_validator(&input.validate().unwrap_err());

        assert!(errors.has_code("name", "string"));
        assert!(!errors.has_code("name", "required"));
    }

    #[test]
    fn display_lists_field_codes() {
        let mut errors = FieldErrors::new();
        errors.add_code("name", "required");
        errors.add_code("categories", "exists");
        assert_eq!(errors.to_string(), "categories: exists; name: required");
    }

    #[test]
    fn required_message_uses_readable_attribute() {
        let v = Violation::new("year_launched", "required");
        assert_eq!(v.message, "The year launched field is required.");
    }
}
