// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Type-aware input validation with bounded retries.
//!
//! Type-intrinsic checks (email shape, numeric parse) run even without an
//! explicit validation record; explicit validation overrides the message
//! and retry cap and adds regex and numeric bounds.

use regex::Regex;
use tracing::warn;

use wagate_core::flow::{coerce_f64, coerce_i64, InputKind, StepValidation};

/// Default retry cap when the step does not configure one.
pub const DEFAULT_MAX_RETRIES: i64 = 3;

const DEFAULT_MESSAGE: &str = "Invalid input. Please try again.";
const EMAIL_MESSAGE: &str = "Please enter a valid email address.";
const NUMBER_MESSAGE: &str = "Please enter a valid number.";

/// The effective outcome of validating one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    pub error_message: String,
    pub max_retries: i64,
}

impl Verdict {
    /// A passing verdict for nodes with nothing to validate.
    pub fn pass() -> Self {
        Self {
            ok: true,
            error_message: DEFAULT_MESSAGE.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Validate `input` against an input step's kind and optional validation
/// record. First failure wins; the custom error message (when configured)
/// replaces whichever default applied.
pub fn validate(input: &str, kind: InputKind, validation: Option<&StepValidation>) -> Verdict {
    let mut ok = true;
    let mut message = DEFAULT_MESSAGE.to_string();

    // Type-intrinsic checks run even without explicit validation.
    match kind {
        InputKind::Email => {
            if !input.contains('@') || !input.contains('.') {
                ok = false;
                message = EMAIL_MESSAGE.to_string();
            }
        }
        InputKind::Number => {
            if !parses_as_finite_number(input) {
                ok = false;
                message = NUMBER_MESSAGE.to_string();
            }
        }
        InputKind::Text => {}
    }

    let mut max_retries = DEFAULT_MAX_RETRIES;
    if let Some(validation) = validation {
        if let Some(configured) = validation.max_retries.as_ref().and_then(coerce_i64) {
            max_retries = configured;
        }
        if !validation.error_message.is_empty() {
            message = validation.error_message.clone();
        }
        if !check_explicit(input, kind, validation) {
            ok = false;
        }
    }

    Verdict {
        ok,
        error_message: message,
        max_retries,
    }
}

/// Regex and numeric-bound checks from an explicit validation record.
fn check_explicit(input: &str, kind: InputKind, validation: &StepValidation) -> bool {
    if !validation.regex.is_empty() {
        match Regex::new(&validation.regex) {
            Ok(re) => {
                if !re.is_match(input) {
                    return false;
                }
            }
            // A broken author-supplied pattern never rejects input.
            Err(e) => warn!(pattern = validation.regex.as_str(), error = %e, "invalid validation regex"),
        }
    }

    if kind == InputKind::Number {
        let Ok(value) = input.trim().parse::<f64>() else {
            return false;
        };
        if let Some(min) = validation.min.as_ref().and_then(coerce_f64) {
            if value < min {
                return false;
            }
        }
        if let Some(max) = validation.max.as_ref().and_then(coerce_f64) {
            if value > max {
                return false;
            }
        }
    }

    true
}

fn parses_as_finite_number(input: &str) -> bool {
    input.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(json: &str) -> StepValidation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn email_intrinsic_check_runs_without_validation() {
        let verdict = validate("not-an-email", InputKind::Email, None);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_message, EMAIL_MESSAGE);
        assert_eq!(verdict.max_retries, DEFAULT_MAX_RETRIES);

        assert!(validate("a@b.com", InputKind::Email, None).ok);
    }

    #[test]
    fn number_intrinsic_check_rejects_non_numbers() {
        let verdict = validate("abc", InputKind::Number, None);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_message, NUMBER_MESSAGE);

        assert!(validate("3.5", InputKind::Number, None).ok);
        assert!(validate(" 42 ", InputKind::Number, None).ok);
        assert!(!validate("inf", InputKind::Number, None).ok);
    }

    #[test]
    fn text_input_passes_without_validation() {
        assert!(validate("anything", InputKind::Text, None).ok);
    }

    #[test]
    fn custom_message_and_retries_override_defaults() {
        let v = validation(r#"{"maxRetries": 2, "errorMessage": "nope"}"#);
        let verdict = validate("bad", InputKind::Email, Some(&v));
        assert!(!verdict.ok);
        assert_eq!(verdict.error_message, "nope");
        assert_eq!(verdict.max_retries, 2);
    }

    #[test]
    fn max_retries_accepts_numeric_strings() {
        let v = validation(r#"{"maxRetries": "5"}"#);
        let verdict = validate("a@b.c", InputKind::Email, Some(&v));
        assert!(verdict.ok);
        assert_eq!(verdict.max_retries, 5);
    }

    #[test]
    fn regex_must_match_when_configured() {
        let v = validation(r#"{"regex": "^[A-Z]{3}$"}"#);
        assert!(validate("ABC", InputKind::Text, Some(&v)).ok);
        assert!(!validate("abc", InputKind::Text, Some(&v)).ok);
    }

    #[test]
    fn broken_regex_never_rejects() {
        let v = validation(r#"{"regex": "["}"#);
        assert!(validate("anything", InputKind::Text, Some(&v)).ok);
    }

    #[test]
    fn number_bounds_accept_numbers_and_strings() {
        let v = validation(r#"{"min": 1, "max": "10", "errorMessage": "1-10 only"}"#);

        assert!(validate("7", InputKind::Number, Some(&v)).ok);
        assert!(validate("1", InputKind::Number, Some(&v)).ok);
        assert!(validate("10", InputKind::Number, Some(&v)).ok);

        let low = validate("0", InputKind::Number, Some(&v));
        assert!(!low.ok);
        assert_eq!(low.error_message, "1-10 only");

        assert!(!validate("11", InputKind::Number, Some(&v)).ok);

        // Non-numeric input surfaces the same custom message.
        let bad = validate("abc", InputKind::Number, Some(&v));
        assert!(!bad.ok);
        assert_eq!(bad.error_message, "1-10 only");
    }

    #[test]
    fn pass_verdict_uses_defaults() {
        let verdict = Verdict::pass();
        assert!(verdict.ok);
        assert_eq!(verdict.max_retries, DEFAULT_MAX_RETRIES);
    }
}
