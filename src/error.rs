//! Rich diagnostic error types for mailmark.
//!
//! Two subsystems, two error enums: `InputError` for everything wrong with
//! the files an operator hands us, `LabelError` for invariant violations
//! inside the labeling engine itself. Both carry miette `#[diagnostic]`
//! derives with error codes and help text, and roll up into the top-level
//! `MailmarkError`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for mailmark.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the operator.
#[derive(Debug, Error, Diagnostic)]
pub enum MailmarkError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Label(#[from] LabelError),
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Fatal configuration errors: a category, input, or output file that does
/// not meet its contract. No partial output is written when one of these
/// occurs.
#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("unable to read {}: {source}", path.display())]
    #[diagnostic(
        code(mailmark::input::read),
        help(
            "Check that the file exists, is readable, and that the path is \
             spelled correctly. Relative paths resolve against the current \
             working directory."
        )
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write {}: {source}", path.display())]
    #[diagnostic(
        code(mailmark::input::write),
        help(
            "Check directory permissions and free disk space. The labeled \
             output is written next to the input file."
        )
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {message}", path.display())]
    #[diagnostic(
        code(mailmark::input::json),
        help(
            "The file is not valid JSON for its expected shape. The category \
             file must be a list of strings; the input file must be a list of \
             email objects with exactly the six string fields date, from, \
             subject, priority, category, body."
        )
    )]
    Json { path: PathBuf, message: String },

    #[error("category file must contain a non-empty JSON list of strings")]
    #[diagnostic(
        code(mailmark::input::empty_categories),
        help(
            "At minimum the category list must include the special categories \
             \"Junk\" and \"Archive\"."
        )
    )]
    EmptyCategorySet,

    #[error("email record {index}: field '{field}' may not be empty")]
    #[diagnostic(
        code(mailmark::input::empty_field),
        help(
            "All fields except 'category' and 'priority' must be non-empty \
             strings before labeling. Fix the record in the input file."
        )
    )]
    EmptyField { index: usize, field: &'static str },
}

// ---------------------------------------------------------------------------
// Labeling errors
// ---------------------------------------------------------------------------

/// Fatal labeling errors: a category set the engine cannot work with, or an
/// invariant violation in the engine's own selection logic.
#[derive(Debug, Error, Diagnostic)]
pub enum LabelError {
    #[error("category set is missing the special category '{name}'")]
    #[diagnostic(
        code(mailmark::label::missing_special),
        help(
            "The rule cascade needs both 'Junk' (for junk detection) and \
             'Archive' (for low-confidence fallback). Add the missing name \
             to the category file."
        )
    )]
    MissingSpecial { name: String },

    #[error("selected category '{category}' is not in the category set")]
    #[diagnostic(
        code(mailmark::label::category_not_in_set),
        help(
            "The engine selected a category outside the configured set. This \
             is a selection-logic bug; it usually means the learned samples \
             were built against a different category list."
        )
    )]
    CategoryNotInSet { category: String },

    #[error("labeled priority '{value}' is not one of 'high' or 'normal'")]
    #[diagnostic(
        code(mailmark::label::invalid_priority),
        help("This is an internal invariant violation; please file a bug report.")
    )]
    InvalidPriority { value: String },

    #[error("only category/priority may change; field '{field}' was modified")]
    #[diagnostic(
        code(mailmark::label::field_drift),
        help(
            "Labeling must leave date, from, subject, and body untouched. \
             This is an internal invariant violation; please file a bug report."
        )
    )]
    FieldDrift { field: &'static str },

    #[error("labeled field '{field}' must be a non-empty string")]
    #[diagnostic(
        code(mailmark::label::empty_label),
        help(
            "Both category and priority must be set to non-empty strings by \
             the labeling engine. This is an internal invariant violation."
        )
    )]
    EmptyLabel { field: &'static str },
}

/// Convenience alias for functions returning mailmark results.
pub type MailmarkResult<T> = std::result::Result<T, MailmarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_converts_to_mailmark_error() {
        let err = InputError::EmptyCategorySet;
        let top: MailmarkError = err.into();
        assert!(matches!(top, MailmarkError::Input(InputError::EmptyCategorySet)));
    }

    #[test]
    fn label_error_converts_to_mailmark_error() {
        let err = LabelError::MissingSpecial {
            name: "Junk".into(),
        };
        let top: MailmarkError = err.into();
        assert!(matches!(
            top,
            MailmarkError::Label(LabelError::MissingSpecial { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = LabelError::CategoryNotInSet {
            category: "Finance".into(),
        };
        assert!(format!("{err}").contains("Finance"));

        let err = InputError::EmptyField {
            index: 3,
            field: "subject",
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains("subject"));
    }
}
