//! The classification core: sender normalization, learned sender/domain
//! statistics, weighted keyword scoring, and the rule-cascade decision
//! engine that ties them together.

pub mod engine;
pub mod learned;
pub mod normalize;
pub mod score;

pub use engine::{
    Classifier, ClassifierConfig, Confidence, Decision, MIN_DOMAIN_HITS, MIN_DOMAIN_RATIO,
    MIN_FROM_HITS, Method,
};
pub use learned::{
    DomainEntry, LearnedCache, LearnedMaps, SampleRecord, SenderEntry, load_samples,
};
pub use normalize::{BODY_SNIPPET_CHARS, SenderIdentity, body_snippet};
pub use score::{boundary_match, score_category};
