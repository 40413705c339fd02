//! Weighted token-boundary scoring of category names against message fields.

use super::normalize::SenderIdentity;

/// Weight when the category name appears in the sender display, email, or
/// identifier tokens.
pub const W_FROM: i64 = 4;

/// Weight when the category name appears in the sender domain.
pub const W_DOMAIN: i64 = 5;

/// Weight when the category name appears in the subject.
pub const W_SUBJECT: i64 = 2;

/// Weight when the category name appears in the body snippet.
pub const W_BODY: i64 = 1;

// ── boundary_match ──────────────────────────────────────────────────────

/// Case-insensitive substring match constrained to token boundaries: the
/// matched text may not be adjacent to other alphanumeric characters, so
/// "cat" does not match inside "category".
pub fn boundary_match(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() || haystack.is_empty() {
        return false;
    }
    let hay = haystack.to_lowercase();
    let nee = needle.to_lowercase();

    let mut start = 0;
    while let Some(offset) = hay[start..].find(&nee) {
        let at = start + offset;
        let end = at + nee.len();

        let clear_before = hay[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let clear_after = hay[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if clear_before && clear_after {
            return true;
        }

        // Advance past the first character of this match and keep looking.
        start = at
            + nee
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    false
}

// ── score_category ──────────────────────────────────────────────────────

/// Weighted boundary-match score of one candidate category name against the
/// sender identity, subject, and body snippet.
///
/// The three sender-text fields share one weight: a hit on any of display,
/// email, or joined tokens scores [`W_FROM`] exactly once.
pub fn score_category(
    category: &str,
    identity: &SenderIdentity,
    subject: &str,
    body_snippet: &str,
) -> i64 {
    let mut score = 0;

    if boundary_match(&identity.display, category)
        || boundary_match(&identity.email, category)
        || boundary_match(&identity.token_joined, category)
    {
        score += W_FROM;
    }
    if boundary_match(&identity.domain, category) {
        score += W_DOMAIN;
    }
    if boundary_match(subject, category) {
        score += W_SUBJECT;
    }
    if boundary_match(body_snippet, category) {
        score += W_BODY;
    }

    score
}

// ── Tests ───────────────────────────────────────────────────────────────
