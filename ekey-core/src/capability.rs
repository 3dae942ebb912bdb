//! The `cap` claim: what an E-Key authorizes.

use serde::{Deserialize, Serialize};

/// Default and bounds on [`Capability::limit`].
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 10;
pub const DEFAULT_LIMIT: u32 = 1;

/// What an E-Key authorizes: a single `METHOD:/path` action, an optional
/// human label, a consumption limit, and an opaque, verifier-uninterpreted
/// `subcap` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scope: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subcap: Option<Vec<String>>,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// A successfully parsed `action`: an uppercase HTTP method and a path.
/// Only the first `:` in `action` is the delimiter, so `path` may itself
/// contain `:` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action<'a> {
    pub method: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("action is missing the ':' delimiter between method and path")]
    MissingDelimiter,
    #[error("action's method must be one or more uppercase ASCII letters")]
    InvalidMethod,
    #[error("action's path must start with '/' and contain no whitespace")]
    InvalidPath,
}

/// Parse `action` as `METHOD:/path`, validating the grammar from the spec:
/// method is non-empty uppercase ASCII letters, path is non-empty, starts
/// with `/`, and contains no whitespace.
pub fn parse_action(action: &str) -> Result<Action<'_>, ActionError> {
    let (method, path) =
        action.split_once(':').ok_or(ActionError::MissingDelimiter)?;

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ActionError::InvalidMethod);
    }
    if path.is_empty() || !path.starts_with('/') || path.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(ActionError::InvalidPath);
    }

    Ok(Action { method, path })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("invalid action: {0}")]
    Action(#[from] ActionError),
    #[error("limit must be in [{MIN_LIMIT}, {MAX_LIMIT}]")]
    LimitOutOfRange,
}

impl Capability {
    /// Validate `action` grammar and `limit` bounds. `max_limit` is the
    /// configured ceiling (spec §6's `max_limit`, itself bounded by the
    /// crate-wide [`MAX_LIMIT`]); callers outside a configured `Issuer`
    /// that just want the crate-wide bounds can pass [`MAX_LIMIT`].
    pub fn validate(&self, max_limit: u32) -> Result<(), CapabilityError> {
        parse_action(&self.action)?;
        let max_limit = max_limit.min(MAX_LIMIT);
        if self.limit < MIN_LIMIT || self.limit > max_limit {
            return Err(CapabilityError::LimitOutOfRange);
        }
        Ok(())
    }

    pub fn parsed_action(&self) -> Result<Action<'_>, ActionError> {
        parse_action(&self.action)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_action() {
        let a = parse_action("POST:/payments").unwrap();
        assert_eq!(a.method, "POST");
        assert_eq!(a.path, "/payments");
    }

    #[test]
    fn path_may_contain_colons_after_first_delimiter() {
        let a = parse_action("GET:/foo:bar/baz").unwrap();
        assert_eq!(a.method, "GET");
        assert_eq!(a.path, "/foo:bar/baz");
    }

    #[test]
    fn missing_delimiter_rejected() {
        assert_eq!(parse_action("POST/payments"), Err(ActionError::MissingDelimiter));
    }

    #[test]
    fn lowercase_method_rejected() {
        assert_eq!(parse_action("post:/payments"), Err(ActionError::InvalidMethod));
    }

    #[test]
    fn empty_method_rejected() {
        assert_eq!(parse_action(":/payments"), Err(ActionError::InvalidMethod));
    }

    #[test]
    fn path_without_leading_slash_rejected() {
        assert_eq!(parse_action("GET:payments"), Err(ActionError::InvalidPath));
    }

    #[test]
    fn whitespace_in_path_rejected() {
        assert_eq!(parse_action("GET:/pay ments"), Err(ActionError::InvalidPath));
    }

    #[test]
    fn limit_bounds() {
        let mut cap = Capability {
            action: "GET:/x".to_string(),
            scope: None,
            limit: 0,
            subcap: None,
        };
        assert_eq!(cap.validate(MAX_LIMIT), Err(CapabilityError::LimitOutOfRange));
        cap.limit = 1;
        assert!(cap.validate(MAX_LIMIT).is_ok());
        cap.limit = 10;
        assert!(cap.validate(MAX_LIMIT).is_ok());
        cap.limit = 11;
        assert_eq!(cap.validate(MAX_LIMIT), Err(CapabilityError::LimitOutOfRange));
    }

    #[test]
    fn a_tighter_configured_max_limit_is_enforced() {
        let cap = Capability { action: "GET:/x".to_string(), scope: None, limit: 5, subcap: None };
        assert!(cap.validate(10).is_ok());
        assert_eq!(cap.validate(4), Err(CapabilityError::LimitOutOfRange));
    }

    #[test]
    fn default_limit_is_one() {
        let json = r#"{"action":"GET:/x"}"#;
        let cap: Capability = serde_json::from_str(json).unwrap();
        assert_eq!(cap.limit, 1);
    }

    proptest::proptest! {
        #[test]
        fn parse_action_roundtrips_on_well_formed_input(
            method in "[A-Z]{1,10}",
            path_tail in "[a-zA-Z0-9/_-]{0,40}",
        ) {
            let action = format!("{method}:/{path_tail}");
            let parsed = parse_action(&action).unwrap();
            proptest::prop_assert_eq!(parsed.method, method.as_str());
            proptest::prop_assert_eq!(parsed.path, format!("/{path_tail}"));
        }

        #[test]
        fn parse_action_first_colon_is_always_the_delimiter(
            method in "[A-Z]{1,10}",
            path_tail in "[a-zA-Z0-9:/_-]{0,40}",
        ) {
            let action = format!("{method}:/{path_tail}");
            let parsed = parse_action(&action).unwrap();
            proptest::prop_assert_eq!(parsed.method, method.as_str());
            proptest::prop_assert_eq!(parsed.path, format!("/{path_tail}"));
        }
    }
}
