//! Learned sender/domain statistics built from historical labeled samples.
//!
//! Aggregates per-sender and per-domain category counts from a list of
//! previously labeled records. A missing or corrupt samples file degrades
//! to empty maps, logged but never raised: the cascade then simply runs
//! without learned overrides.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::record::{CategorySet, is_operational_skip};
use crate::trace::TraceSink;

use super::normalize::SenderIdentity;

// ── SampleRecord ────────────────────────────────────────────────────────

/// One historical labeled record. Only `from` and `category` matter;
/// other fields in the samples file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    pub from: String,
    pub category: String,
}

// ── Learned entries ─────────────────────────────────────────────────────

/// Winning category for one sender email, with its sample count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderEntry {
    pub category: String,
    pub hits: u64,
}

/// Winning category for one sender domain, with its share of the domain's
/// samples and the domain total.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEntry {
    pub category: String,
    pub ratio: f64,
    pub total: u64,
}

// ── LearnedMaps ─────────────────────────────────────────────────────────

/// The two lookup tables the cascade's learned overrides consult.
#[derive(Debug, Clone, Default)]
pub struct LearnedMaps {
    by_sender: HashMap<String, SenderEntry>,
    by_domain: HashMap<String, DomainEntry>,
}

impl LearnedMaps {
    /// Aggregate samples into sender and domain tables.
    ///
    /// Samples whose category is absent from `categories` or is an
    /// operational-skip category are ignored. Within a sender or domain,
    /// the winning category is the one with the highest count; ties go to
    /// the lexicographically smallest name.
    pub fn build(samples: &[SampleRecord], categories: &CategorySet) -> Self {
        let mut sender_counts: HashMap<String, BTreeMap<String, u64>> = HashMap::new();
        let mut domain_counts: HashMap<String, BTreeMap<String, u64>> = HashMap::new();

        for sample in samples {
            if !categories.contains(&sample.category) || is_operational_skip(&sample.category) {
                continue;
            }
            let identity = SenderIdentity::parse(&sample.from);
            if !identity.email.is_empty() {
                *sender_counts
                    .entry(identity.email.clone())
                    .or_default()
                    .entry(sample.category.clone())
                    .or_default() += 1;
            }
            if !identity.domain.is_empty() {
                *domain_counts
                    .entry(identity.domain)
                    .or_default()
                    .entry(sample.category.clone())
                    .or_default() += 1;
            }
        }

        let by_sender = sender_counts
            .into_iter()
            .map(|(email, counts)| {
                let (category, hits, _total) = winning_category(&counts);
                (email, SenderEntry { category, hits })
            })
            .collect();

        let by_domain = domain_counts
            .into_iter()
            .map(|(domain, counts)| {
                let (category, hits, total) = winning_category(&counts);
                let ratio = hits as f64 / total as f64;
                (
                    domain,
                    DomainEntry {
                        category,
                        ratio,
                        total,
                    },
                )
            })
            .collect();

        Self {
            by_sender,
            by_domain,
        }
    }

    /// Learned entry for an exact lower-cased sender email.
    pub fn sender(&self, email: &str) -> Option<&SenderEntry> {
        self.by_sender.get(email)
    }

    /// Learned entry for a lower-cased sender domain.
    pub fn domain(&self, domain: &str) -> Option<&DomainEntry> {
        self.by_domain.get(domain)
    }

    pub fn is_empty(&self) -> bool {
        self.by_sender.is_empty() && self.by_domain.is_empty()
    }

    /// Number of (sender, domain) entries, for diagnostics.
    pub fn sizes(&self) -> (usize, usize) {
        (self.by_sender.len(), self.by_domain.len())
    }
}

/// Pick the highest-count category from a name-ordered count table.
///
/// The BTreeMap iterates in ascending name order and only a strictly
/// greater count replaces the leader, so ties resolve to the smallest name.
fn winning_category(counts: &BTreeMap<String, u64>) -> (String, u64, u64) {
    let mut best_name = "";
    let mut best_count = 0;
    let mut total = 0;
    for (name, &count) in counts {
        total += count;
        if count > best_count {
            best_count = count;
            best_name = name;
        }
    }
    (best_name.to_string(), best_count, total)
}

// ── load_samples ────────────────────────────────────────────────────────

/// Read a historical samples file.
///
/// Missing file, unreadable file, invalid JSON, and any shape other than a
/// list of objects with string `from`/`category` all degrade to an empty
/// list; the failure is logged and traced, never raised.
pub fn load_samples(path: &Path, sink: &dyn TraceSink) -> Vec<SampleRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("samples file {} unreadable: {err}", path.display());
            sink.record(&format!(
                "samples file {} unreadable, continuing without learned patterns",
                path.display()
            ));
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<SampleRecord>>(&raw) {
        Ok(samples) => samples,
        Err(err) => {
            tracing::warn!("samples file {} malformed: {err}", path.display());
            sink.record(&format!(
                "samples file {} malformed, continuing without learned patterns",
                path.display()
            ));
            Vec::new()
        }
    }
}

// ── LearnedCache ────────────────────────────────────────────────────────

/// Rebuild-on-change cache for [`LearnedMaps`], keyed by an exact snapshot
/// of the category list (order-sensitive, since learned eligibility depends
/// on which categories are currently valid).
///
/// Owned by the batch runner and passed by reference wherever maps are
/// needed; there is no process-global state.
#[derive(Debug, Default)]
pub struct LearnedCache {
    entry: Option<(Vec<String>, LearnedMaps)>,
}

impl LearnedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The maps for `categories`, rebuilding via `load` only when the
    /// category snapshot differs from the cached one.
    pub fn get_or_build(
        &mut self,
        categories: &CategorySet,
        load: impl FnOnce() -> Vec<SampleRecord>,
    ) -> &LearnedMaps {
        let stale = !self
            .entry
            .as_ref()
            .is_some_and(|(key, _)| key == categories.names());
        if stale {
            let maps = LearnedMaps::build(&load(), categories);
            self.entry = Some((categories.names().to_vec(), maps));
        }
        let (_, maps) = self
            .entry
            .get_or_insert_with(|| (categories.names().to_vec(), LearnedMaps::default()));
        maps
    }

    /// Drop the cached maps; the next lookup rebuilds.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{MemorySink, NoopSink};

    fn categories() -> CategorySet {
        CategorySet::new(vec![
            "Junk".into(),
            "Archive".into(),
            "Finance".into(),
            "Travel".into(),
            "Inbox".into(),
        ])
        .unwrap()
    }

    fn sample(from: &str, category: &str) -> SampleRecord {
        SampleRecord {
            from: from.into(),
            category: category.into(),
        }
    }

    #[test]
    fn build_counts_per_sender() {
        let samples = vec![
            sample("billing@acme.com", "Finance"),
            sample("Billing <billing@acme.com>", "Finance"),
            sample("billing@acme.com", "Travel"),
        ];
        let maps = LearnedMaps::build(&samples, &categories());

        let entry = maps.sender("billing@acme.com").unwrap();
        assert_eq!(entry.category, "Finance");
        assert_eq!(entry.hits, 2);
    }

    #[test]
    fn sender_ties_break_to_smallest_name() {
        let samples = vec![
            sample("a@x.com", "Travel"),
            sample("a@x.com", "Finance"),
        ];
        let maps = LearnedMaps::build(&samples, &categories());
        assert_eq!(maps.sender("a@x.com").unwrap().category, "Finance");
    }

    #[test]
    fn domain_entry_carries_ratio_and_total() {
        let samples = vec![
            sample("a@acme.com", "Finance"),
            sample("b@acme.com", "Finance"),
            sample("c@acme.com", "Finance"),
            sample("d@acme.com", "Travel"),
        ];
        let maps = LearnedMaps::build(&samples, &categories());

        let entry = maps.domain("acme.com").unwrap();
        assert_eq!(entry.category, "Finance");
        assert_eq!(entry.total, 4);
        assert!((entry.ratio - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_and_operational_categories_are_ignored() {
        let samples = vec![
            sample("a@x.com", "Inbox"),
            sample("a@x.com", "Shopping"), // not in the set
            sample("a@x.com", "Trash"),
        ];
        let maps = LearnedMaps::build(&samples, &categories());
        assert!(maps.is_empty());
    }

    #[test]
    fn samples_without_domain_skip_the_domain_table() {
        let samples = vec![sample("postmaster", "Finance")];
        let maps = LearnedMaps::build(&samples, &categories());
        assert!(maps.sender("postmaster").is_some());
        assert_eq!(maps.sizes(), (1, 0));
    }

    #[test]
    fn load_samples_missing_file_degrades_and_traces() {
        let sink = MemorySink::new();
        let samples = load_samples(Path::new("/nonexistent/samples.json"), &sink);
        assert!(samples.is_empty());
        assert!(sink.contains("continuing without learned patterns"));
    }

    #[test]
    fn load_samples_malformed_json_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        let sink = MemorySink::new();
        assert!(load_samples(&path, &sink).is_empty());
        assert!(sink.contains("malformed"));
    }

    #[test]
    fn load_samples_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        std::fs::write(
            &path,
            r#"[{"from": "a@x.com", "category": "Finance", "subject": "ignored"}]"#,
        )
        .unwrap();

        let samples = load_samples(&path, &NoopSink);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].category, "Finance");
    }

    #[test]
    fn cache_rebuilds_only_when_categories_change() {
        let cats_a = categories();
        let cats_b = CategorySet::new(vec!["Junk".into(), "Archive".into()]).unwrap();
        let mut cache = LearnedCache::new();
        let mut builds = 0;

        for _ in 0..3 {
            cache.get_or_build(&cats_a, || {
                builds += 1;
                vec![sample("a@x.com", "Finance")]
            });
        }
        assert_eq!(builds, 1);

        cache.get_or_build(&cats_b, || {
            builds += 1;
            Vec::new()
        });
        assert_eq!(builds, 2);

        // Switching back is another rebuild: the cache holds one snapshot.
        cache.get_or_build(&cats_a, || {
            builds += 1;
            Vec::new()
        });
        assert_eq!(builds, 3);
    }

    #[test]
    fn cache_invalidate_forces_rebuild() {
        let cats = categories();
        let mut cache = LearnedCache::new();
        let mut builds = 0;

        cache.get_or_build(&cats, || {
            builds += 1;
            Vec::new()
        });
        cache.invalidate();
        cache.get_or_build(&cats, || {
            builds += 1;
            Vec::new()
        });
        assert_eq!(builds, 2);
    }
}
