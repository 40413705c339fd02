//! The labeling rule cascade.
//!
//! Strict priority order, first match wins:
//!
//! 1. Category-set validation (`Junk`/`Archive` must be present)
//! 2. Junk detection (unsubscribe+promo, scam phrases, link density)
//! 3. Learned sender-email override
//! 4. Learned domain override
//! 5. Keyword-scoring fallback with low-confidence archiving
//! 6. Priority rule (skipped entirely when junk short-circuits)
//! 7. Post-condition checks on the selected label
//!
//! One engine serves both the minimal and the learned-override mode; the
//! learned steps are gated by [`ClassifierConfig::learned_overrides`].

use crate::error::LabelError;
use crate::record::{ARCHIVE, CategorySet, EmailRecord, JUNK, Priority, is_operational_skip};
use crate::trace::TraceSink;

use super::learned::LearnedMaps;
use super::normalize::{SenderIdentity, body_snippet};
use super::score::score_category;

// ── Constants ───────────────────────────────────────────────────────────

/// Promotional words that mark a message as junk when paired with
/// "unsubscribe".
const PROMO_WORDS: [&str; 9] = [
    "deal",
    "limited time",
    "offer",
    "sale",
    "discount",
    "coupon",
    "promo",
    "save now",
    "shop now",
];

/// Phrases that mark a message as junk on their own.
const SCAM_PHRASES: [&str; 8] = [
    "urgent action required",
    "verify your account",
    "suspended account",
    "wire transfer",
    "claim your prize",
    "you have won",
    "bitcoin payment",
    "gift card",
];

/// Phrases that raise priority to high.
const URGENCY_PHRASES: [&str; 7] = [
    "please respond",
    "asap",
    "urgent",
    "deadline",
    "confirm",
    "action required",
    "need your",
];

/// Combined "http"/"www" occurrences at or above this mark a message as junk.
const LINK_DENSITY_THRESHOLD: usize = 3;

/// Minimum top score for a confident keyword classification.
const MIN_CATEGORY_SCORE: i64 = 3;

/// Minimum lead over the runner-up for a confident keyword classification.
const MIN_CATEGORY_MARGIN: i64 = 2;

/// Default minimum sample hits before a sender-email override applies.
pub const MIN_FROM_HITS: u64 = 3;

/// Default minimum domain sample total before a domain override is considered.
pub const MIN_DOMAIN_HITS: u64 = 5;

/// Default minimum winning-category share for a domain override.
pub const MIN_DOMAIN_RATIO: f64 = 0.8;

/// Number of scored candidates reported in decision metadata and traces.
const TOP_CANDIDATES: usize = 3;

// ── ClassifierConfig ────────────────────────────────────────────────────

/// Tunable knobs of the rule cascade.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Enable the learned sender/domain override steps.
    pub learned_overrides: bool,
    /// Minimum sample hits before a sender-email override applies.
    pub min_from_hits: u64,
    /// Minimum domain sample total before a domain override is considered.
    pub min_domain_hits: u64,
    /// Minimum winning-category share for a domain override.
    pub min_domain_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            learned_overrides: true,
            min_from_hits: MIN_FROM_HITS,
            min_domain_hits: MIN_DOMAIN_HITS,
            min_domain_ratio: MIN_DOMAIN_RATIO,
        }
    }
}

// ── Confidence / Method ─────────────────────────────────────────────────

/// How strongly the evidence supported the chosen category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which branch of the cascade produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Junk detection or keyword scoring.
    Heuristic,
    /// Learned sender-email override.
    LearnedFrom,
    /// Learned domain override.
    LearnedDomain,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::LearnedFrom => "heuristic+learned_from",
            Self::LearnedDomain => "heuristic+learned_domain",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Decision ────────────────────────────────────────────────────────────

/// Outcome of labeling one email: the label plus decision metadata.
///
/// Ephemeral; only `category` and `priority` reach the output file.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub category: String,
    pub priority: Priority,
    pub method: Method,
    pub confidence: Confidence,
    /// Human-readable justification of the category choice.
    pub reason: String,
    /// Highest-scoring fallback candidates with their scores; empty when an
    /// earlier cascade step decided.
    pub top_candidates: Vec<(String, i64)>,
}

// ── Classifier ──────────────────────────────────────────────────────────

/// The rule-cascade decision engine.
///
/// Owns no persistent state. Learned maps are supplied per call so that
/// cache ownership stays with the batch runner.
pub struct Classifier<'a> {
    config: ClassifierConfig,
    sink: &'a dyn TraceSink,
}

impl<'a> Classifier<'a> {
    pub fn new(config: ClassifierConfig, sink: &'a dyn TraceSink) -> Self {
        Self { config, sink }
    }

    /// Label one email against the category set.
    ///
    /// `learned` is consulted only when learned overrides are enabled;
    /// passing `None` runs the reduced cascade.
    pub fn label(
        &self,
        email: &EmailRecord,
        categories: &CategorySet,
        learned: Option<&LearnedMaps>,
    ) -> Result<Decision, LabelError> {
        categories.require_specials()?;

        let identity = SenderIdentity::parse(&email.from);
        let subject = email.subject.to_lowercase();
        let snippet = body_snippet(&email.body);
        let combined = format!("{subject} {snippet}");

        // Junk short-circuits everything, including the priority rule.
        if let Some(reason) = junk_reason(&combined) {
            self.sink.record(&format!("junk verdict: {reason}"));
            let decision = Decision {
                category: JUNK.to_string(),
                priority: Priority::Normal,
                method: Method::Heuristic,
                confidence: Confidence::High,
                reason,
                top_candidates: Vec::new(),
            };
            return self.finish(categories, decision, "junk short-circuit");
        }
        self.sink.record("junk verdict: clean");

        let (priority, priority_reason) = priority_for(&subject, &snippet, &combined);

        if self.config.learned_overrides {
            if let Some(maps) = learned {
                if let Some(entry) = maps.sender(&identity.email) {
                    if entry.hits >= self.config.min_from_hits {
                        let reason = format!(
                            "learned sender {} -> {} ({} hits)",
                            identity.email, entry.category, entry.hits
                        );
                        self.sink.record(&format!("learned override: {reason}"));
                        let decision = Decision {
                            category: entry.category.clone(),
                            priority,
                            method: Method::LearnedFrom,
                            confidence: Confidence::High,
                            reason,
                            top_candidates: Vec::new(),
                        };
                        return self.finish(categories, decision, &priority_reason);
                    }
                }
                if let Some(entry) = maps.domain(&identity.domain) {
                    if entry.total >= self.config.min_domain_hits
                        && entry.ratio >= self.config.min_domain_ratio
                    {
                        let reason = format!(
                            "learned domain {} -> {} (ratio {:.2} over {} samples)",
                            identity.domain, entry.category, entry.ratio, entry.total
                        );
                        self.sink.record(&format!("learned override: {reason}"));
                        let decision = Decision {
                            category: entry.category.clone(),
                            priority,
                            method: Method::LearnedDomain,
                            confidence: Confidence::High,
                            reason,
                            top_candidates: Vec::new(),
                        };
                        return self.finish(categories, decision, &priority_reason);
                    }
                }
            }
        }

        // Keyword-scoring fallback over the topical categories.
        let mut scored: Vec<(&str, i64)> = categories
            .iter()
            .filter(|name| !is_operational_skip(name) && *name != JUNK && *name != ARCHIVE)
            .map(|name| (name, score_category(name, &identity, &subject, &snippet)))
            .collect();
        // Stable sort: tied scores keep category-file order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let top_candidates: Vec<(String, i64)> = scored
            .iter()
            .take(TOP_CANDIDATES)
            .map(|&(name, score)| (name.to_string(), score))
            .collect();
        if top_candidates.is_empty() {
            self.sink.record("candidate scores: none");
        } else {
            let summary = top_candidates
                .iter()
                .map(|(name, score)| format!("{name}={score}"))
                .collect::<Vec<_>>()
                .join(", ");
            self.sink.record(&format!("candidate scores: {summary}"));
        }

        let (category, confidence, reason) = match scored.first() {
            None => (
                ARCHIVE.to_string(),
                Confidence::Low,
                "no scorable candidates".to_string(),
            ),
            Some(&(best_name, best)) => {
                let second = scored.get(1).map(|&(_, score)| score).unwrap_or(0);
                let margin = best - second;
                if best < MIN_CATEGORY_SCORE {
                    (
                        ARCHIVE.to_string(),
                        Confidence::Low,
                        format!(
                            "best score {best} for {best_name} below minimum {MIN_CATEGORY_SCORE}"
                        ),
                    )
                } else if margin < MIN_CATEGORY_MARGIN {
                    (
                        ARCHIVE.to_string(),
                        Confidence::Low,
                        format!(
                            "margin {margin} between {best_name} and runner-up below minimum \
                             {MIN_CATEGORY_MARGIN}"
                        ),
                    )
                } else {
                    (
                        best_name.to_string(),
                        Confidence::High,
                        format!("top score {best} with margin {margin}"),
                    )
                }
            }
        };

        let decision = Decision {
            category,
            priority,
            method: Method::Heuristic,
            confidence,
            reason,
            top_candidates,
        };
        self.finish(categories, decision, &priority_reason)
    }

    /// Post-condition checks and final trace lines.
    fn finish(
        &self,
        categories: &CategorySet,
        decision: Decision,
        priority_reason: &str,
    ) -> Result<Decision, LabelError> {
        if !categories.contains(&decision.category) {
            return Err(LabelError::CategoryNotInSet {
                category: decision.category,
            });
        }
        self.sink.record(&format!(
            "category {} ({} confidence): {}",
            decision.category, decision.confidence, decision.reason
        ));
        self.sink
            .record(&format!("priority {}: {priority_reason}", decision.priority));
        Ok(decision)
    }
}

// ── Rule helpers ────────────────────────────────────────────────────────

/// The junk verdict for the combined lower-cased subject + body snippet.
fn junk_reason(combined: &str) -> Option<String> {
    if combined.contains("unsubscribe") {
        if let Some(word) = PROMO_WORDS.iter().find(|w| combined.contains(*w)) {
            return Some(format!(
                "contains \"unsubscribe\" with promotional word \"{word}\""
            ));
        }
    }
    if let Some(phrase) = SCAM_PHRASES.iter().find(|p| combined.contains(*p)) {
        return Some(format!("contains scam phrase \"{phrase}\""));
    }
    let links = combined.matches("http").count() + combined.matches("www").count();
    if links >= LINK_DENSITY_THRESHOLD {
        return Some(format!(
            "link density {links} at or above {LINK_DENSITY_THRESHOLD}"
        ));
    }
    None
}

/// The priority rule: high on a question mark in subject or body snippet,
/// or an urgency phrase anywhere in the combined text.
fn priority_for(subject: &str, snippet: &str, combined: &str) -> (Priority, String) {
    if subject.contains('?') || snippet.contains('?') {
        return (
            Priority::High,
            "question mark in subject or body".to_string(),
        );
    }
    if let Some(phrase) = URGENCY_PHRASES.iter().find(|p| combined.contains(*p)) {
        return (Priority::High, format!("urgency phrase \"{phrase}\""));
    }
    (Priority::Normal, "no urgency signals".to_string())
}

// ── Tests ───────────────────────────────────────────────────────────────
