//! # mailmark
//!
//! Deterministic batch email labeling: a rule cascade assigns each record a
//! category and priority from text heuristics, with optional overrides
//! learned from historical sender/domain statistics.
//!
//! ## Architecture
//!
//! - **Classification core** (`classify`): sender normalization, learned
//!   pattern store, weighted keyword scorer, and the decision engine
//! - **Data model** (`record`): the six-field email record, category set,
//!   and label-drift enforcement
//! - **Diagnostics** (`trace`): best-effort append-only trace sinks
//! - **Batch runs** (`batch`): JSON I/O, validation, and the all-or-nothing
//!   labeling loop
//!
//! ## Library usage
//!
//! ```
//! use mailmark::classify::{Classifier, ClassifierConfig};
//! use mailmark::record::{CategorySet, EmailRecord};
//! use mailmark::trace::NoopSink;
//!
//! let categories = CategorySet::new(vec![
//!     "Junk".into(), "Archive".into(), "Finance".into(),
//! ]).unwrap();
//! let email = EmailRecord {
//!     date: "2024-05-01".into(),
//!     from: "Billing <billing@finance.example>".into(),
//!     subject: "Invoice enclosed".into(),
//!     priority: String::new(),
//!     category: String::new(),
//!     body: "Your finance statement is attached.".into(),
//! };
//! let classifier = Classifier::new(ClassifierConfig::default(), &NoopSink);
//! let decision = classifier.label(&email, &categories, None).unwrap();
//! assert_eq!(decision.category, "Finance");
//! ```

pub mod batch;
pub mod classify;
pub mod error;
pub mod record;
pub mod trace;
