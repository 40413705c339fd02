//! Sender identity extraction from raw `From` headers.
//!
//! Never errors: malformed headers degrade to best-effort substrings, so a
//! hostile input file can skew a score but not stop a run.

/// Number of body characters considered by junk detection and scoring.
///
/// Truncation bounds scoring cost and keeps long bodies from outweighing
/// the header signals.
pub const BODY_SNIPPET_CHARS: usize = 280;

// ── SenderIdentity ──────────────────────────────────────────────────────

/// The four derived strings the cascade and scorer work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Display name before the angle-bracket address, quotes and whitespace
    /// stripped, lower-cased. Without angle brackets the whole header is
    /// both display and email candidate.
    pub display: String,
    /// Address between `<` and the first following `>`, trimmed and
    /// lower-cased; the whole trimmed header when no brackets are present.
    pub email: String,
    /// Substring after the first `@` of `email`; empty without one.
    pub domain: String,
    /// Space-joined de-duplicated identifier tokens from the display name
    /// and the email local part (camelCase split, letter/digit runs split).
    pub token_joined: String,
}

impl SenderIdentity {
    /// Parse a raw `From` header into its derived parts.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        let (display_part, email_part) = match trimmed.find('<') {
            Some(open) => {
                let after = &trimmed[open + 1..];
                let email = match after.find('>') {
                    Some(close) => &after[..close],
                    None => after,
                };
                (&trimmed[..open], email)
            }
            None => (trimmed, trimmed),
        };

        let display_raw = display_part.trim().trim_matches(['"', '\'']).trim();
        let email = email_part.trim().to_lowercase();
        let domain = match email.find('@') {
            Some(at) => email[at + 1..].to_string(),
            None => String::new(),
        };

        // Tokenization needs the original casing for camelCase boundaries,
        // so it runs on the raw display and local part, not the lowered email.
        let local_raw = email_part.trim();
        let local_raw = match local_raw.find('@') {
            Some(at) => &local_raw[..at],
            None => local_raw,
        };

        let mut tokens: Vec<String> = Vec::new();
        for source in [display_raw, local_raw] {
            for token in identifier_tokens(source) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }

        Self {
            display: display_raw.to_lowercase(),
            email,
            domain,
            token_joined: tokens.join(" "),
        }
    }
}

// ── body_snippet ────────────────────────────────────────────────────────

/// The first [`BODY_SNIPPET_CHARS`] characters of the body, lower-cased.
pub fn body_snippet(body: &str) -> String {
    body.chars()
        .take(BODY_SNIPPET_CHARS)
        .collect::<String>()
        .to_lowercase()
}

// ── Tokenization helpers ────────────────────────────────────────────────

/// Lower-case identifier tokens of `text`: camelCase boundaries become
/// separators, then each alphanumeric run is split into pure-letter and
/// pure-digit pieces.
fn identifier_tokens(text: &str) -> Vec<String> {
    let spaced = split_camel_boundaries(text);
    let mut out = Vec::new();
    for run in spaced
        .split(|c: char| !c.is_alphanumeric())
        .filter(|r| !r.is_empty())
    {
        for piece in split_letter_digit(run) {
            out.push(piece.to_lowercase());
        }
    }
    out
}

/// Insert a space at each lowercase-to-uppercase transition.
fn split_camel_boundaries(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev_lower = false;
    for ch in text.chars() {
        if prev_lower && ch.is_uppercase() {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase();
        out.push(ch);
    }
    out
}

/// Split an alphanumeric run into maximal pure-letter and pure-digit pieces.
fn split_letter_digit(run: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;
    for ch in run.chars() {
        let is_digit = ch.is_numeric();
        if !current.is_empty() && is_digit != current_is_digit {
            pieces.push(std::mem::take(&mut current));
        }
        current_is_digit = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_email_from_bracketed_header() {
        let id = SenderIdentity::parse("Jane Doe <Jane.Doe@Newsletter.Example.Com>");
        assert_eq!(id.display, "jane doe");
        assert_eq!(id.email, "jane.doe@newsletter.example.com");
        assert_eq!(id.domain, "newsletter.example.com");
        assert_eq!(id.token_joined, "jane doe");
    }

    #[test]
    fn quoted_display_is_stripped() {
        let id = SenderIdentity::parse("\"Billing Team\" <billing@acme.com>");
        assert_eq!(id.display, "billing team");
        assert_eq!(id.email, "billing@acme.com");
        assert_eq!(id.token_joined, "billing team");
    }

    #[test]
    fn bare_address_is_display_and_email() {
        let id = SenderIdentity::parse("  jane@example.com ");
        assert_eq!(id.display, "jane@example.com");
        assert_eq!(id.email, "jane@example.com");
        assert_eq!(id.domain, "example.com");
    }

    #[test]
    fn missing_at_yields_empty_domain() {
        let id = SenderIdentity::parse("Postmaster <postmaster>");
        assert_eq!(id.email, "postmaster");
        assert_eq!(id.domain, "");
    }

    #[test]
    fn camel_case_local_part_is_split() {
        let id = SenderIdentity::parse("JohnSmith <JSmith42@corp.io>");
        assert_eq!(id.token_joined, "john smith jsmith 42");
    }

    #[test]
    fn tokens_are_deduplicated_in_first_seen_order() {
        let id = SenderIdentity::parse("Support Desk <support.desk@support.example.com>");
        assert_eq!(id.token_joined, "support desk");
    }

    #[test]
    fn unclosed_bracket_degrades_gracefully() {
        let id = SenderIdentity::parse("Ops <ops@internal");
        assert_eq!(id.display, "ops");
        assert_eq!(id.email, "ops@internal");
        assert_eq!(id.domain, "internal");
    }

    #[test]
    fn empty_header() {
        let id = SenderIdentity::parse("");
        assert_eq!(id.display, "");
        assert_eq!(id.email, "");
        assert_eq!(id.domain, "");
        assert_eq!(id.token_joined, "");
    }

    #[test]
    fn body_snippet_truncates_characters_and_lowercases() {
        let long = "A".repeat(300);
        let snippet = body_snippet(&long);
        assert_eq!(snippet.chars().count(), BODY_SNIPPET_CHARS);
        assert!(snippet.chars().all(|c| c == 'a'));

        // Character truncation, not byte truncation.
        let accented = "É".repeat(300);
        assert_eq!(body_snippet(&accented).chars().count(), BODY_SNIPPET_CHARS);
    }

    #[test]
    fn body_snippet_short_body_is_untouched() {
        assert_eq!(body_snippet("Short BODY"), "short body");
    }
}
