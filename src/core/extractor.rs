use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::core::error::MatchError;
use crate::core::text::{is_alphanumeric_mix, tokenize};
use crate::core::vocabulary::{Lexicon, PhraseTable, Vocabulary};
use crate::models::{AttributeSet, UNKNOWN_CATEGORY};

const EMAIL_PATTERN: &str = r"[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}";

/// Digit groups separated only by spaces or hyphens ("01712-345678")
const DIGIT_GROUPS_PATTERN: &str = r"\b\d(?:[ \-]*\d)*\b";

/// Salt mixed into every identifier hash; bump it to invalidate stored sets
const IDENTIFIER_SALT: &str = "LFv1:";

/// Pattern rules for identifier extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRules {
    /// Minimum length of a token mixing letters and digits
    #[serde(default = "default_min_identifier_len")]
    pub min_identifier_len: usize,
    /// Minimum length of a digit run (phone and ID numbers), separators removed
    #[serde(default = "default_min_digit_run")]
    pub min_digit_run: usize,
    #[serde(default = "default_true")]
    pub detect_emails: bool,
    /// Calling codes rewritten to a trunk `0` ("880 1712..." -> "01712...")
    #[serde(default = "default_country_codes")]
    pub country_codes: Vec<String>,
    /// Extra regular expressions run against the lower-cased raw text
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Values matching any of these in full are never identifiers, e.g.
    /// product model codes shared by many physical items
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_min_identifier_len() -> usize { 5 }
fn default_min_digit_run() -> usize { 10 }
fn default_true() -> bool { true }
fn default_country_codes() -> Vec<String> { vec!["880".to_string()] }

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            min_identifier_len: default_min_identifier_len(),
            min_digit_run: default_min_digit_run(),
            detect_emails: true,
            country_codes: default_country_codes(),
            patterns: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Everything the extractor needs, supplied as configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default)]
    pub identifiers: IdentifierRules,
}

/// Kind prefix of a stored identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentifierKind {
    Code,
    Number,
    Email,
    Pattern,
}

impl IdentifierKind {
    fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Code => "code",
            IdentifierKind::Number => "num",
            IdentifierKind::Email => "email",
            IdentifierKind::Pattern => "pattern",
        }
    }
}

/// Opaque form of an identifier: kind prefix plus a salted SHA-256 digest
///
/// Equal values hash equally, so matching still works while the stored
/// attribute set never holds the phone number, e-mail or serial itself.
pub fn hash_identifier(kind: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(IDENTIFIER_SALT.as_bytes());
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}:{}", kind, &digest[..16])
}

fn compile_pattern(source: &str, anchored: bool) -> Result<Regex, MatchError> {
    let full = if anchored { format!("^(?:{})$", source) } else { source.to_string() };
    Regex::new(&full)
        .map_err(|e| MatchError::InvalidConfig(format!("identifier pattern '{}': {}", source, e)))
}

fn compile_patterns(sources: &[String], anchored: bool) -> Result<Vec<Regex>, MatchError> {
    sources.iter().map(|source| compile_pattern(source, anchored)).collect()
}

#[derive(Debug, Clone)]
struct CompiledRules {
    min_identifier_len: usize,
    min_digit_run: usize,
    country_codes: Vec<String>,
    digit_groups: Regex,
    email: Option<Regex>,
    patterns: Vec<Regex>,
    ignore: Vec<Regex>,
}

impl CompiledRules {
    fn compile(rules: &IdentifierRules) -> Result<Self, MatchError> {
        if rules.min_identifier_len == 0 || rules.min_digit_run == 0 {
            return Err(MatchError::InvalidConfig(
                "identifier minimum lengths must be at least 1".to_string(),
            ));
        }
        if let Some(code) = rules
            .country_codes
            .iter()
            .find(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_digit()))
        {
            return Err(MatchError::InvalidConfig(format!(
                "country code '{}' must be digits only",
                code
            )));
        }

        let email = if rules.detect_emails {
            Some(compile_pattern(EMAIL_PATTERN, false)?)
        } else {
            None
        };

        Ok(Self {
            min_identifier_len: rules.min_identifier_len,
            min_digit_run: rules.min_digit_run,
            country_codes: rules.country_codes.clone(),
            digit_groups: compile_pattern(DIGIT_GROUPS_PATTERN, false)?,
            email,
            patterns: compile_patterns(&rules.patterns, false)?,
            ignore: compile_patterns(&rules.ignore_patterns, true)?,
        })
    }

    #[inline]
    fn is_ignored(&self, value: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(value))
    }

    /// Single token that would be kept as an identifier
    fn is_identifier_token(&self, token: &str) -> bool {
        let len = token.chars().count();
        let shaped = if is_alphanumeric_mix(token) {
            len >= self.min_identifier_len
        } else {
            token.chars().all(|c| c.is_ascii_digit()) && len >= self.min_digit_run
        };
        shaped && !self.is_ignored(token)
    }

    /// Canonical digit string, with a leading calling code replaced by `0`
    fn canonical_number(&self, digits: &str) -> String {
        for code in &self.country_codes {
            if let Some(rest) = digits.strip_prefix(code.as_str()) {
                if rest.len() + 1 >= self.min_digit_run {
                    return if rest.starts_with('0') {
                        rest.to_string()
                    } else {
                        format!("0{}", rest)
                    };
                }
            }
        }
        digits.to_string()
    }
}

/// Attribute extractor
///
/// Turns free report text into an [`AttributeSet`]. Extraction is pure and
/// deterministic and never fails; text with nothing recognisable yields an
/// empty set with an "unknown" category. Identifiers are stored hashed.
#[derive(Debug, Clone)]
pub struct Extractor {
    lexicon: Lexicon,
    rules: CompiledRules,
}

impl Extractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, MatchError> {
        Ok(Self {
            lexicon: Lexicon::compile(&config.vocabulary),
            rules: CompiledRules::compile(&config.identifiers)?,
        })
    }

    /// Extractor with the built-in vocabularies and identifier rules
    pub fn with_defaults() -> Self {
        Self::new(&ExtractionConfig::default()).expect("built-in extraction rules are valid")
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn extract(&self, text: &str) -> AttributeSet {
        let tokens = tokenize(text);

        // Colors are resolved first; a token taken by a color is not
        // available to the brand or mark lookups.
        let mut color_claimed = vec![false; tokens.len()];
        let colors = collect_colors(&self.lexicon, &tokens, &mut color_claimed);

        let category = first_match(&self.lexicon.categories, &tokens, &color_claimed)
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
        let brand = first_match(&self.lexicon.brands, &tokens, &color_claimed);

        let mut mark_claimed = color_claimed.clone();
        let marks = collect_all(&self.lexicon.marks, &tokens, &mut mark_claimed);

        let identifiers = self.identifiers(text, &tokens);

        AttributeSet {
            category,
            colors,
            brand,
            identifiers,
            marks,
        }
    }

    /// Tokens that carry meaning no structured attribute accounts for
    ///
    /// Stopwords, single characters, vocabulary words and identifier-shaped
    /// tokens are dropped so free-text similarity does not re-count signals
    /// the structured attributes already score.
    pub fn content_tokens(&self, text: &str) -> BTreeSet<String> {
        tokenize(text)
            .into_iter()
            .filter(|t| t.chars().count() > 1)
            .filter(|t| !self.lexicon.is_stopword(t))
            .filter(|t| !self.lexicon.is_claimed(t))
            .filter(|t| !self.rules.is_identifier_token(t))
            .collect()
    }

    fn identifiers(&self, text: &str, tokens: &[String]) -> BTreeSet<String> {
        let rules = &self.rules;
        let mut found = BTreeSet::new();
        let mut keep = |kind: IdentifierKind, value: &str| {
            if !rules.is_ignored(value) {
                found.insert(hash_identifier(kind.as_str(), value));
            }
        };

        for token in tokens.iter().filter(|t| rules.is_identifier_token(t)) {
            if is_alphanumeric_mix(token) {
                keep(IdentifierKind::Code, token);
            } else {
                keep(IdentifierKind::Number, &rules.canonical_number(token));
            }
        }

        let lowered = text.to_lowercase();

        // Numbers written in groups count once their separators are removed
        for m in rules.digit_groups.find_iter(&lowered) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() >= rules.min_digit_run {
                keep(IdentifierKind::Number, &rules.canonical_number(&digits));
            }
        }

        if let Some(email) = &rules.email {
            for m in email.find_iter(&lowered) {
                keep(IdentifierKind::Email, m.as_str());
            }
        }

        for pattern in &rules.patterns {
            for m in pattern.find_iter(&lowered) {
                keep(IdentifierKind::Pattern, m.as_str());
            }
        }

        found
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Colors in reading order; a shade word directly before a color (or
/// joined to it) keeps the shaded phrase as well as the base color
fn collect_colors(lexicon: &Lexicon, tokens: &[String], claimed: &mut [bool]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];

        if lexicon.is_shade(token) {
            if let Some((color, len)) = lexicon.colors.match_at(tokens, i + 1) {
                found.insert(format!("{} {}", token, color));
                found.insert(color.to_string());
                claimed[i..i + 1 + len].iter_mut().for_each(|c| *c = true);
                i += 1 + len;
                continue;
            }
        }

        if let Some((shade, color)) = lexicon.split_joined_shade(token) {
            found.insert(format!("{} {}", shade, color));
            found.insert(color.to_string());
            claimed[i] = true;
            i += 1;
            continue;
        }

        match lexicon.colors.match_at(tokens, i) {
            Some((color, len)) => {
                found.insert(color.to_string());
                claimed[i..i + len].iter_mut().for_each(|c| *c = true);
                i += len;
            }
            None => i += 1,
        }
    }
    found
}

/// First vocabulary hit in reading order wins
fn first_match(table: &PhraseTable, tokens: &[String], claimed: &[bool]) -> Option<String> {
    let mut i = 0;
    while i < tokens.len() {
        if claimed[i] {
            i += 1;
            continue;
        }
        if let Some((canonical, len)) = table.match_at(tokens, i) {
            if !claimed[i..i + len].iter().any(|c| *c) {
                return Some(canonical.to_string());
            }
        }
        i += 1;
    }
    None
}

/// Every vocabulary hit is collected; matched tokens are marked as claimed
fn collect_all(table: &PhraseTable, tokens: &[String], claimed: &mut [bool]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut i = 0;
    while i < tokens.len() {
        if claimed[i] {
            i += 1;
            continue;
        }
        match table.match_at(tokens, i) {
            Some((canonical, len)) if !claimed[i..i + len].iter().any(|c| *c) => {
                found.insert(canonical.to_string());
                claimed[i..i + len].iter_mut().for_each(|c| *c = true);
                i += len;
            }
            _ => i += 1,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocabulary::VocabularyEntry;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ids(items: &[(&str, &str)]) -> BTreeSet<String> {
        items.iter().map(|(kind, value)| hash_identifier(kind, value)).collect()
    }

    #[test]
    fn test_extract_full_description() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("Black leather wallet, brand Gucci, serial AB1234");

        assert_eq!(attrs.category, "wallet");
        assert_eq!(attrs.colors, set(&["black"]));
        assert_eq!(attrs.brand.as_deref(), Some("gucci"));
        assert_eq!(attrs.identifiers, ids(&[("code", "ab1234")]));
        assert!(attrs.marks.is_empty());
    }

    #[test]
    fn test_empty_and_garbage_text() {
        let extractor = Extractor::with_defaults();

        assert_eq!(extractor.extract(""), AttributeSet::empty());
        assert_eq!(extractor.extract("?!?! ... ###"), AttributeSet::empty());
    }

    #[test]
    fn test_multiple_colors_collected() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("black and red backpack, grey straps");

        assert_eq!(attrs.colors, set(&["black", "red", "gray"]));
        assert_eq!(attrs.category, "bag");
    }

    #[test]
    fn test_multi_word_color_phrase() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("space grey iphone in a rose gold case");

        assert_eq!(attrs.colors, set(&["gray", "gold"]));
        assert_eq!(attrs.category, "phone");
        assert_eq!(attrs.brand.as_deref(), Some("apple"));
    }

    #[test]
    fn test_category_synonyms() {
        let extractor = Extractor::with_defaults();

        assert_eq!(extractor.extract("lost my cell phone").category, "phone");
        assert_eq!(extractor.extract("samsung mobile").category, "phone");
        assert_eq!(extractor.extract("two sets of keychains").category, "keys");
        assert_eq!(extractor.extract("a very nice thing").category, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_first_category_wins() {
        let extractor = Extractor::with_defaults();
        assert_eq!(extractor.extract("wallet inside a backpack").category, "wallet");
        assert_eq!(extractor.extract("backpack with a wallet inside").category, "bag");
    }

    #[test]
    fn test_color_beats_brand() {
        let config = ExtractionConfig {
            vocabulary: Vocabulary {
                brands: vec![VocabularyEntry::new("orange", &[]), VocabularyEntry::new("nike", &[])],
                ..Vocabulary::default()
            },
            ..ExtractionConfig::default()
        };
        let extractor = Extractor::new(&config).unwrap();

        let attrs = extractor.extract("orange umbrella");
        assert_eq!(attrs.colors, set(&["orange"]));
        assert_eq!(attrs.brand, None);

        let attrs = extractor.extract("orange nike cap");
        assert_eq!(attrs.brand.as_deref(), Some("nike"));
    }

    #[test]
    fn test_identifier_rules() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract(
            "IMEI 356938035643809, tag XK22Q and code a1, call 01712345678 or me@example.com",
        );

        assert_eq!(
            attrs.identifiers,
            ids(&[
                ("num", "356938035643809"),
                ("num", "01712345678"),
                ("code", "xk22q"),
                ("email", "me@example.com"),
            ])
        );
    }

    #[test]
    fn test_identifiers_deduplicated() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("serial AB1234 (ab1234 printed on back)");
        assert_eq!(attrs.identifiers, ids(&[("code", "ab1234")]));
    }

    #[test]
    fn test_custom_identifier_pattern() {
        let config = ExtractionConfig {
            identifiers: IdentifierRules {
                patterns: vec![r"[a-z]{2}-\d{4}".to_string()],
                ..IdentifierRules::default()
            },
            ..ExtractionConfig::default()
        };
        let extractor = Extractor::new(&config).unwrap();

        let attrs = extractor.extract("plate reads KL-2291");
        assert_eq!(attrs.identifiers, ids(&[("pattern", "kl-2291")]));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = ExtractionConfig {
            identifiers: IdentifierRules {
                patterns: vec!["([unclosed".to_string()],
                ..IdentifierRules::default()
            },
            ..ExtractionConfig::default()
        };
        assert!(matches!(Extractor::new(&config), Err(MatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_marks_collected() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("phone with cracked screen and a sticker on the back");
        assert_eq!(attrs.marks, set(&["crack", "sticker"]));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = Extractor::with_defaults();
        let text = "Blue Samsung galaxy, cracked, stickers, serial ZX9981, near library";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn test_content_tokens_exclude_structured_words() {
        let extractor = Extractor::with_defaults();
        let tokens = extractor.content_tokens("Lost my black leather wallet, Gucci, serial AB1234 near library");
        assert_eq!(tokens, set(&["leather", "library"]));
    }

    #[test]
    fn test_separated_numbers_join() {
        let extractor = Extractor::with_defaults();
        let plain = extractor.extract("call 01712345678").identifiers;

        assert_eq!(plain, ids(&[("num", "01712345678")]));
        assert_eq!(extractor.extract("call 01712-345678").identifiers, plain);
        assert_eq!(extractor.extract("call 017 1234 5678").identifiers, plain);
        assert_eq!(extractor.extract("call +880 1712 345678").identifiers, plain);
        assert_eq!(extractor.extract("call +8801712345678").identifiers, plain);
    }

    #[test]
    fn test_short_number_groups_stay_below_run() {
        let extractor = Extractor::with_defaults();
        assert!(extractor.extract("room 12-34, bus 42 on 2024-06-01").identifiers.is_empty());
    }

    #[test]
    fn test_identifiers_never_hold_raw_values() {
        let extractor = Extractor::with_defaults();
        let attrs = extractor.extract("my email is alice.smith@example.com phone 01712345678, serial XK22Q9");
        let json = serde_json::to_string(&attrs).unwrap();

        assert_eq!(attrs.identifiers.len(), 3);
        assert!(!json.contains("alice"));
        assert!(!json.contains("01712345678"));
        assert!(!json.contains("xk22q9"));
        assert!(attrs.identifiers.iter().any(|id| id.starts_with("email:")));
        assert!(attrs.identifiers.iter().all(|id| id.split(':').nth(1).map(str::len) == Some(16)));
    }

    #[test]
    fn test_ignored_model_codes() {
        let config = ExtractionConfig {
            identifiers: IdentifierRules {
                ignore_patterns: vec![r"g9\d{2}[a-z]".to_string()],
                ..IdentifierRules::default()
            },
            ..ExtractionConfig::default()
        };
        let extractor = Extractor::new(&config).unwrap();

        let attrs = extractor.extract("galaxy SM-G991B, IMEI 356938035643809");
        assert_eq!(attrs.identifiers, ids(&[("num", "356938035643809")]));
        assert!(extractor.content_tokens("galaxy SM-G991B").contains("g991b"));
    }

    #[test]
    fn test_invalid_country_code_rejected() {
        let config = ExtractionConfig {
            identifiers: IdentifierRules {
                country_codes: vec!["+880".to_string()],
                ..IdentifierRules::default()
            },
            ..ExtractionConfig::default()
        };
        assert!(matches!(Extractor::new(&config), Err(MatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_shaded_colors_keep_base() {
        let extractor = Extractor::with_defaults();

        assert_eq!(extractor.extract("light blue umbrella").colors, set(&["light blue", "blue"]));
        assert_eq!(extractor.extract("a lightblue umbrella").colors, set(&["light blue", "blue"]));
        assert_eq!(extractor.extract("dark grey and red bag").colors, set(&["dark gray", "gray", "red"]));
        assert_eq!(extractor.extract("light laptop").colors, BTreeSet::new());
    }
}
