use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"));

/// Outcome of checking an agent name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameValidation {
    pub status: bool,
    pub message: String,
    /// The name with every run of disallowed characters replaced by `_`.
    pub sanitized: String,
}

/// Check that `input` is usable as an agent name and produce a sanitised form.
///
/// Agent names end up as identifiers in generated code, so only ASCII letters,
/// digits, `_` and `-` are accepted.
pub fn check_and_sanitize_input(input: &str) -> NameValidation {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return NameValidation {
            status: false,
            message: "Name is required".to_string(),
            sanitized: String::new(),
        };
    }

    let sanitized = INVALID_NAME_CHARS.replace_all(trimmed, "_").into_owned();
    if sanitized == input {
        NameValidation {
            status: true,
            message: String::new(),
            sanitized,
        }
    } else {
        NameValidation {
            status: false,
            message: "Name can only contain letters, digits, underscores and dashes".to_string(),
            sanitized,
        }
    }
}
