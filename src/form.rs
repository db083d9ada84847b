//! Login body decoding and validation.
//!
//! A submitted body is decoded into a [`FieldMap`] whose values can have any
//! shape. [`LoginInput::from_fields`] then checks that `username` and
//! `password` are both present and both strings before anything else looks
//! at them.

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::SecretString;

/// Decoded request body: string keys, values of unknown shape.
pub type FieldMap = Map<String, Value>;

pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";

/// Why a login body was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    Missing(&'static str),
    NotAString(&'static str),
}

impl MalformedReason {
    /// The offending field.
    pub fn field(self) -> &'static str {
        match self {
            MalformedReason::Missing(field) | MalformedReason::NotAString(field) => field,
        }
    }
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::Missing(field) => write!(f, "missing field `{field}`"),
            MalformedReason::NotAString(field) => write!(f, "field `{field}` is not a string"),
        }
    }
}

/// A well-formed username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Result of validating a login body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginInput {
    Valid(Credentials),
    Invalid(MalformedReason),
}

impl LoginInput {
    /// Validates the decoded fields. `username` is checked before `password`.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let username = match string_field(fields, USERNAME_FIELD) {
            Ok(username) => username,
            Err(reason) => return LoginInput::Invalid(reason),
        };
        let password = match string_field(fields, PASSWORD_FIELD) {
            Ok(password) => password,
            Err(reason) => return LoginInput::Invalid(reason),
        };

        LoginInput::Valid(Credentials {
            username: username.to_owned(),
            password: SecretString::new(password),
        })
    }

    /// Decodes and validates a raw request body in one step.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Self {
        Self::from_fields(&decode_body(content_type, body))
    }
}

fn string_field<'a>(fields: &'a FieldMap, name: &'static str) -> Result<&'a str, MalformedReason> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(MalformedReason::Missing(name)),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(MalformedReason::NotAString(name)),
    }
}

/// Decodes a request body into a [`FieldMap`].
///
/// `application/json` bodies must be a JSON object. Anything else is read as
/// `application/x-www-form-urlencoded`; a key that appears more than once
/// becomes an array of its values. A body that cannot be decoded yields an
/// empty map, which later fails validation as a missing field.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> FieldMap {
    if is_json(content_type) {
        return match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                log::debug!(target: "gatehouse", "msg=\"json login body is not an object\"");
                FieldMap::new()
            }
            Err(err) => {
                log::debug!(target: "gatehouse", "msg=\"undecodable json login body\" error=\"{err}\"");
                FieldMap::new()
            }
        };
    }

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        Ok(pairs) => collect_pairs(pairs),
        Err(err) => {
            log::debug!(target: "gatehouse", "msg=\"undecodable form login body\" error=\"{err}\"");
            FieldMap::new()
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn collect_pairs(pairs: Vec<(String, String)>) -> FieldMap {
    let mut fields = FieldMap::new();
    for (key, value) in pairs {
        match fields.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Value::String(value));
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(values) => values.push(Value::String(value)),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            },
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_valid_credentials() {
        let input = LoginInput::from_fields(&fields(json!({
            "username": "alice",
            "password": "hunter2"
        })));

        let LoginInput::Valid(credentials) = input else {
            panic!("expected valid input");
        };
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password.expose_secret(), "hunter2");
    }

    #[test]
    fn test_empty_strings_are_well_formed() {
        let input = LoginInput::from_fields(&fields(json!({ "username": "", "password": "" })));
        assert!(matches!(input, LoginInput::Valid(_)));
    }

    #[test]
    fn test_missing_fields() {
        let input = LoginInput::from_fields(&fields(json!({ "password": "x" })));
        assert_eq!(input, LoginInput::Invalid(MalformedReason::Missing("username")));

        let input = LoginInput::from_fields(&fields(json!({ "username": "alice" })));
        assert_eq!(input, LoginInput::Invalid(MalformedReason::Missing("password")));

        let input = LoginInput::from_fields(&fields(json!({ "username": null, "password": "x" })));
        assert_eq!(input, LoginInput::Invalid(MalformedReason::Missing("username")));
    }

    #[test]
    fn test_non_string_fields() {
        let input = LoginInput::from_fields(&fields(json!({ "username": 123, "password": "x" })));
        assert_eq!(input, LoginInput::Invalid(MalformedReason::NotAString("username")));

        let input = LoginInput::from_fields(&fields(json!({
            "username": "alice",
            "password": { "nested": true }
        })));
        assert_eq!(input, LoginInput::Invalid(MalformedReason::NotAString("password")));
    }

    #[test]
    fn test_username_checked_first() {
        let input = LoginInput::from_fields(&FieldMap::new());
        assert_eq!(input.clone(), LoginInput::Invalid(MalformedReason::Missing("username")));
        let LoginInput::Invalid(reason) = input else {
            panic!("expected invalid input");
        };
        assert_eq!(reason.field(), "username");
        assert_eq!(reason.to_string(), "missing field `username`");
    }

    #[test]
    fn test_decode_form_body() {
        let decoded = decode_body(
            Some("application/x-www-form-urlencoded"),
            b"username=alice&password=p%40ss+word",
        );
        assert_eq!(decoded["username"], json!("alice"));
        assert_eq!(decoded["password"], json!("p@ss word"));
    }

    #[test]
    fn test_decode_without_content_type_reads_form() {
        let decoded = decode_body(None, b"username=alice&password=x");
        assert_eq!(decoded["username"], json!("alice"));
    }

    #[test]
    fn test_repeated_form_key_becomes_array() {
        let decoded = decode_body(None, b"username=a&username=b&username=c&password=x");
        assert_eq!(decoded["username"], json!(["a", "b", "c"]));

        let input = LoginInput::from_fields(&decoded);
        assert_eq!(input, LoginInput::Invalid(MalformedReason::NotAString("username")));
    }

    #[test]
    fn test_decode_json_body() {
        let decoded = decode_body(
            Some("application/json; charset=utf-8"),
            br#"{"username":123,"password":"x"}"#,
        );
        assert_eq!(decoded["username"], json!(123));
    }

    #[test]
    fn test_undecodable_bodies_are_empty() {
        assert!(decode_body(Some("application/json"), b"{not json").is_empty());
        assert!(decode_body(Some("application/json"), b"[1,2]").is_empty());
        assert!(decode_body(None, b"").is_empty());
    }

    #[test]
    fn test_from_body_form() {
        let input = LoginInput::from_body(None, b"username=alice&password=secret");
        assert!(matches!(input, LoginInput::Valid(ref c) if c.username == "alice"));
    }
}
