//! Batch labeling runs: JSON I/O, input validation, the sequential labeling
//! loop, and the all-or-nothing output write.
//!
//! A run either labels every record and writes one output file, or aborts
//! before the output file exists. There is no partial output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::classify::{Classifier, ClassifierConfig, LearnedCache, load_samples};
use crate::error::{InputError, MailmarkResult};
use crate::record::{CategorySet, EmailRecord, ensure_only_labels_changed};
use crate::trace::TraceSink;

// ── JSON helpers ────────────────────────────────────────────────────────

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let raw = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|err| InputError::Json {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Serialize `value` as pretty-printed JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), InputError> {
    let mut payload = serde_json::to_string_pretty(value).map_err(|err| InputError::Json {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    payload.push('\n');
    fs::write(path, payload).map_err(|source| InputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// The sibling output path: the input's extension replaced by
/// `.labeled.json` (`inbox.json` becomes `inbox.labeled.json`).
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}.labeled.json"))
}

// ── Loading & validation ────────────────────────────────────────────────

/// Load the category file: a non-empty JSON list of strings.
pub fn load_categories(path: &Path) -> Result<CategorySet, InputError> {
    let names: Vec<String> = read_json(path)?;
    CategorySet::new(names)
}

/// Load the input batch: a JSON list of six-field email objects, with all
/// non-label fields non-empty.
pub fn load_emails(path: &Path) -> Result<Vec<EmailRecord>, InputError> {
    let emails: Vec<EmailRecord> = read_json(path)?;
    for (index, email) in emails.iter().enumerate() {
        for (field, value) in email.immutable_fields() {
            if value.is_empty() {
                return Err(InputError::EmptyField { index, field });
            }
        }
    }
    Ok(emails)
}

// ── Batch run ───────────────────────────────────────────────────────────

/// File inputs of one labeling run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Input batch file.
    pub input: PathBuf,
    /// Category list file.
    pub categories: PathBuf,
    /// Optional historical samples file for learned overrides.
    pub samples: Option<PathBuf>,
}

/// Label every record in the input batch and write the sibling output file.
///
/// Returns the output path. Any fatal error aborts before the output file
/// is written.
pub fn run(
    options: &BatchOptions,
    config: &ClassifierConfig,
    sink: &dyn TraceSink,
) -> MailmarkResult<PathBuf> {
    sink.record("-------------------------"); // run separator
    sink.record("startup");
    println!("Starting labeling run...");

    let categories = load_categories(&options.categories)?;
    sink.record(&format!(
        "loaded {} categories from {}",
        categories.len(),
        options.categories.display()
    ));

    let emails = load_emails(&options.input)?;
    sink.record(&format!(
        "loaded {} input emails from {}",
        emails.len(),
        options.input.display()
    ));

    println!("Loaded {} categories", categories.len());
    println!("Loaded {} emails", emails.len());

    let mut cache = LearnedCache::new();
    let classifier = Classifier::new(config.clone(), sink);

    let mut labeled_emails = Vec::with_capacity(emails.len());
    for (index, email) in emails.iter().enumerate() {
        sink.record(&format!("email {} start", index + 1));

        let learned = if config.learned_overrides {
            let maps = cache.get_or_build(&categories, || match &options.samples {
                Some(path) => load_samples(path, sink),
                None => Vec::new(),
            });
            Some(maps)
        } else {
            None
        };

        let decision = classifier.label(email, &categories, learned)?;

        let mut updated = email.clone();
        updated.category = decision.category;
        updated.priority = decision.priority.as_str().to_string();

        ensure_only_labels_changed(email, &updated)?;
        labeled_emails.push(updated);
        sink.record(&format!("email {} end", index + 1));
    }

    let output = output_path(&options.input);
    write_json(&output, &labeled_emails)?;
    sink.record(&format!("wrote output to {}", output.display()));

    println!("Wrote labeled output to {}", output.display());
    Ok(output)
}

/// Validate the category and input files without labeling or writing.
///
/// Returns the (category, email) counts on success.
pub fn check(categories_path: &Path, input_path: &Path) -> MailmarkResult<(usize, usize)> {
    let categories = load_categories(categories_path)?;
    categories.require_specials()?;
    let emails = load_emails(input_path)?;
    Ok((categories.len(), emails.len()))
}

// ── Tests ───────────────────────────────────────────────────────────────
