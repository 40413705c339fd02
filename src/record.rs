//! Email record and category-set data model.
//!
//! The six-field email record mirrors the on-disk JSON exactly; the category
//! set wraps the ordered list from the category file and knows about the two
//! special categories the rule cascade depends on.

use serde::{Deserialize, Serialize};

use crate::error::{InputError, LabelError};

/// Category assigned by junk detection.
pub const JUNK: &str = "Junk";

/// Fallback category for low-confidence decisions.
pub const ARCHIVE: &str = "Archive";

/// Mailbox-mechanics categories excluded from scoring candidacy and from
/// learned-pattern eligibility.
pub const OPERATIONAL_SKIP: [&str; 4] = ["Inbox", "Drafts", "Sent", "Trash"];

/// Whether a category denotes mailbox mechanics rather than a topic.
pub fn is_operational_skip(name: &str) -> bool {
    OPERATIONAL_SKIP.contains(&name)
}

// ── EmailRecord ─────────────────────────────────────────────────────────

/// One email as it appears in the input and output batch files.
///
/// Exactly these six string fields; extra keys are rejected at parse time.
/// `category` and `priority` are placeholders before labeling and the only
/// fields labeling may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailRecord {
    pub date: String,
    pub from: String,
    pub subject: String,
    pub priority: String,
    pub category: String,
    pub body: String,
}

impl EmailRecord {
    /// The non-label fields, paired with their JSON names.
    ///
    /// These must be non-empty on input and unchanged through labeling.
    pub fn immutable_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("date", self.date.as_str()),
            ("from", self.from.as_str()),
            ("subject", self.subject.as_str()),
            ("body", self.body.as_str()),
        ]
    }
}

// ── Priority ────────────────────────────────────────────────────────────

/// Priority assigned by the labeling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

impl Priority {
    /// The string written into the labeled record.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── CategorySet ─────────────────────────────────────────────────────────

/// The ordered category list loaded once per run from the category file.
///
/// Order matters: the keyword fallback keeps file order for tied scores, and
/// the learned cache is keyed by the exact sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    /// Wrap a validated category list. Fails on an empty list; duplicates
    /// are not rejected.
    pub fn new(names: Vec<String>) -> Result<Self, InputError> {
        if names.is_empty() {
            return Err(InputError::EmptyCategorySet);
        }
        Ok(Self { names })
    }

    /// Fail unless both special categories the cascade depends on are present.
    pub fn require_specials(&self) -> Result<(), LabelError> {
        for name in [JUNK, ARCHIVE] {
            if !self.contains(name) {
                return Err(LabelError::MissingSpecial { name: name.into() });
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ── Label drift enforcement ─────────────────────────────────────────────

/// Verify that labeling changed nothing but `category`/`priority`, and that
/// both labels ended up as valid non-empty strings.
///
/// The record type already pins the key set, so this checks value drift on
/// the immutable fields plus the label post-conditions.
pub fn ensure_only_labels_changed(
    original: &EmailRecord,
    labeled: &EmailRecord,
) -> Result<(), LabelError> {
    for ((field, before), (_, after)) in original
        .immutable_fields()
        .into_iter()
        .zip(labeled.immutable_fields())
    {
        if before != after {
            return Err(LabelError::FieldDrift { field });
        }
    }

    if labeled.category.is_empty() {
        return Err(LabelError::EmptyLabel { field: "category" });
    }
    match labeled.priority.as_str() {
        "high" | "normal" => {}
        "" => return Err(LabelError::EmptyLabel { field: "priority" }),
        other => {
            return Err(LabelError::InvalidPriority {
                value: other.to_string(),
            });
        }
    }

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EmailRecord {
        EmailRecord {
            date: "2024-05-01".into(),
            from: "Alice <alice@example.com>".into(),
            subject: "Hello".into(),
            priority: String::new(),
            category: String::new(),
            body: "Body text".into(),
        }
    }

    #[test]
    fn record_rejects_unknown_fields() {
        let raw = r#"{
            "date": "d", "from": "f", "subject": "s",
            "priority": "", "category": "", "body": "b",
            "cc": "extra@example.com"
        }"#;
        let parsed: Result<EmailRecord, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn record_requires_all_fields() {
        let raw = r#"{"date": "d", "from": "f", "subject": "s"}"#;
        let parsed: Result<EmailRecord, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn priority_strings() {
        assert_eq!(Priority::High.as_str(), "high");
        assert_eq!(Priority::Normal.to_string(), "normal");
    }

    #[test]
    fn category_set_rejects_empty() {
        assert!(CategorySet::new(Vec::new()).is_err());
    }

    #[test]
    fn category_set_requires_specials() {
        let missing = CategorySet::new(vec!["Finance".into(), "Archive".into()]).unwrap();
        let err = missing.require_specials().unwrap_err();
        assert!(matches!(err, LabelError::MissingSpecial { ref name } if name == "Junk"));

        let ok = CategorySet::new(vec!["Junk".into(), "Archive".into()]).unwrap();
        assert!(ok.require_specials().is_ok());
    }

    #[test]
    fn operational_skip_names() {
        assert!(is_operational_skip("Inbox"));
        assert!(is_operational_skip("Trash"));
        assert!(!is_operational_skip("Finance"));
        assert!(!is_operational_skip("inbox")); // case-sensitive
    }

    #[test]
    fn drift_check_accepts_label_changes() {
        let original = record();
        let mut labeled = original.clone();
        labeled.category = "Archive".into();
        labeled.priority = "normal".into();
        assert!(ensure_only_labels_changed(&original, &labeled).is_ok());
    }

    #[test]
    fn drift_check_rejects_modified_subject() {
        let original = record();
        let mut labeled = original.clone();
        labeled.category = "Archive".into();
        labeled.priority = "normal".into();
        labeled.subject = "Tampered".into();
        let err = ensure_only_labels_changed(&original, &labeled).unwrap_err();
        assert!(matches!(err, LabelError::FieldDrift { field: "subject" }));
    }

    #[test]
    fn drift_check_rejects_empty_labels() {
        let original = record();
        let mut labeled = original.clone();
        labeled.priority = "normal".into();
        let err = ensure_only_labels_changed(&original, &labeled).unwrap_err();
        assert!(matches!(err, LabelError::EmptyLabel { field: "category" }));
    }

    #[test]
    fn drift_check_rejects_bad_priority() {
        let original = record();
        let mut labeled = original.clone();
        labeled.category = "Archive".into();
        labeled.priority = "urgent".into();
        let err = ensure_only_labels_changed(&original, &labeled).unwrap_err();
        assert!(matches!(err, LabelError::InvalidPriority { .. }));
    }
}
