//! Vocabulary tables used by attribute extraction.
//!
//! A [`Vocabulary`] is plain configuration data (canonical terms and their
//! synonyms). It is compiled once into a [`Lexicon`] of [`PhraseTable`]s that
//! the extractor and scorer share read-only.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::text::normalize_text;

/// A canonical term and the words or phrases that map to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub canonical: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl VocabularyEntry {
    pub fn new(canonical: &str, synonyms: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Mapping tables for every vocabulary-driven attribute
///
/// Entry order matters: when two entries claim the same synonym the earlier
/// entry keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default = "default_categories")]
    pub categories: Vec<VocabularyEntry>,
    #[serde(default = "default_colors")]
    pub colors: Vec<VocabularyEntry>,
    #[serde(default = "default_brands")]
    pub brands: Vec<VocabularyEntry>,
    #[serde(default = "default_marks")]
    pub marks: Vec<VocabularyEntry>,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    /// Modifiers kept alongside a following color ("light blue")
    #[serde(default = "default_shades")]
    pub shades: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            colors: default_colors(),
            brands: default_brands(),
            marks: default_marks(),
            stopwords: default_stopwords(),
            shades: default_shades(),
        }
    }
}

/// Lookup table from normalized phrases to canonical terms
///
/// Phrases may span several words; lookups at a token position try the
/// longest phrase first.
#[derive(Debug, Clone, Default)]
pub struct PhraseTable {
    phrases: HashMap<String, String>,
    words: HashSet<String>,
    max_words: usize,
    plural_fallback: bool,
}

impl PhraseTable {
    pub fn from_entries(entries: &[VocabularyEntry]) -> Self {
        let mut table = Self::default();

        for entry in entries {
            let canonical = normalize_text(&entry.canonical);
            if canonical.is_empty() {
                continue;
            }

            for term in std::iter::once(&entry.canonical).chain(entry.synonyms.iter()) {
                let key = normalize_text(term);
                if key.is_empty() {
                    continue;
                }

                let word_count = key.split(' ').count();
                table.max_words = table.max_words.max(word_count);
                table.words.extend(key.split(' ').map(str::to_string));
                table.phrases.entry(key).or_insert_with(|| canonical.clone());
            }
        }

        table
    }

    /// Also accept a trailing-`s` plural of any single-word synonym
    pub fn with_plural_fallback(mut self) -> Self {
        self.plural_fallback = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Longest phrase starting at `start`, as (canonical, words consumed)
    pub fn match_at(&self, tokens: &[String], start: usize) -> Option<(&str, usize)> {
        if start >= tokens.len() {
            return None;
        }

        let longest = self.max_words.min(tokens.len() - start);
        for len in (1..=longest).rev() {
            let key = tokens[start..start + len].join(" ");
            if let Some(canonical) = self.phrases.get(&key) {
                return Some((canonical.as_str(), len));
            }
        }

        if self.plural_fallback {
            if let Some(canonical) = singular(&tokens[start]).and_then(|s| self.phrases.get(s)) {
                return Some((canonical.as_str(), 1));
            }
        }

        None
    }

    /// Whether the word appears anywhere in this table's phrases
    pub fn claims_word(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        self.plural_fallback && singular(word).is_some_and(|s| self.words.contains(s))
    }
}

#[inline]
fn singular(word: &str) -> Option<&str> {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        Some(&word[..word.len() - 1])
    } else {
        None
    }
}

/// Compiled form of a [`Vocabulary`]
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    pub categories: PhraseTable,
    pub colors: PhraseTable,
    pub brands: PhraseTable,
    pub marks: PhraseTable,
    stopwords: HashSet<String>,
    shades: Vec<String>,
}

impl Lexicon {
    pub fn compile(vocabulary: &Vocabulary) -> Self {
        Self {
            categories: PhraseTable::from_entries(&vocabulary.categories).with_plural_fallback(),
            colors: PhraseTable::from_entries(&vocabulary.colors),
            brands: PhraseTable::from_entries(&vocabulary.brands),
            marks: PhraseTable::from_entries(&vocabulary.marks),
            stopwords: vocabulary
                .stopwords
                .iter()
                .map(|w| normalize_text(w))
                .filter(|w| !w.is_empty())
                .collect(),
            shades: vocabulary
                .shades
                .iter()
                .map(|w| normalize_text(w))
                .filter(|w| !w.is_empty() && !w.contains(' '))
                .collect(),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn is_shade(&self, word: &str) -> bool {
        self.shades.iter().any(|s| s == word)
    }

    /// Split a joined shade and color such as "lightblue" into
    /// ("light", "blue")
    pub fn split_joined_shade<'a>(&'a self, word: &str) -> Option<(&'a str, &'a str)> {
        self.shades.iter().find_map(|shade| {
            let rest = word.strip_prefix(shade.as_str())?;
            if rest.is_empty() {
                return None;
            }
            self.colors
                .match_at(std::slice::from_ref(&rest.to_string()), 0)
                .map(|(color, _)| (shade.as_str(), color))
        })
    }

    /// Whether any attribute vocabulary already accounts for this word
    pub fn is_claimed(&self, word: &str) -> bool {
        self.colors.claims_word(word)
            || self.categories.claims_word(word)
            || self.brands.claims_word(word)
            || self.marks.claims_word(word)
            || self.is_shade(word)
            || self.split_joined_shade(word).is_some()
    }
}

fn default_categories() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new("documents", &[
            "document", "paper", "papers", "file", "files", "certificate", "passport",
            "ticket", "receipt", "letter", "birth certificate", "admit card", "national id",
        ]),
        VocabularyEntry::new("card", &[
            "cards", "id card", "student id", "nid", "nid card", "license", "licence",
            "bank card", "bankcard", "atm card", "debit card", "credit card",
        ]),
        VocabularyEntry::new("wallet", &[
            "wallets", "purse", "billfold", "cardholder", "card holder", "money bag",
        ]),
        VocabularyEntry::new("keys", &["key", "keychain", "keyring", "key ring", "car key"]),
        VocabularyEntry::new("phone", &[
            "phone", "mobile", "mobile phone", "cell", "cell phone", "cellphone",
            "smartphone", "handset", "iphone", "android",
        ]),
        VocabularyEntry::new("laptop", &["notebook", "macbook", "ultrabook", "chromebook"]),
        VocabularyEntry::new("tablet", &["ipad", "tab"]),
        VocabularyEntry::new("earbuds", &[
            "earbud", "earphone", "earpiece", "airpod", "airpods", "headset", "tws", "buds",
            "wireless earphone", "bluetooth earphone",
        ]),
        VocabularyEntry::new("headphones", &["headphone"]),
        VocabularyEntry::new("powerbank", &["power bank", "battery pack"]),
        VocabularyEntry::new("charger", &[
            "adapter", "adaptor", "charging cable", "cable", "type c cable", "usb c cable",
            "lightning cable",
        ]),
        VocabularyEntry::new("usb", &[
            "pendrive", "pen drive", "flashdrive", "flash drive", "thumb drive", "usb drive",
            "sd card", "memory card", "microsd",
        ]),
        VocabularyEntry::new("camera", &["gopro", "dslr", "tripod"]),
        VocabularyEntry::new("umbrella", &["parasol"]),
        VocabularyEntry::new("fan", &["pocket fan", "mini fan", "hand fan", "portable fan"]),
        VocabularyEntry::new("book", &["textbook", "novel", "diary", "journal", "exercise book"]),
        VocabularyEntry::new("glasses", &["spectacles", "goggles", "sunglasses", "sunglass", "specs"]),
        VocabularyEntry::new("bottle", &["water bottle", "flask", "thermos", "sipper", "tumbler"]),
        VocabularyEntry::new("jewelry", &[
            "jewellery", "ring", "necklace", "bracelet", "chain", "earring", "pendant",
        ]),
        VocabularyEntry::new("money", &["cash", "coin", "banknote"]),
        VocabularyEntry::new("watch", &["wristwatch", "smartwatch"]),
        VocabularyEntry::new("calculator", &[]),
        VocabularyEntry::new("bag", &[
            "backpack", "rucksack", "handbag", "satchel", "pouch", "tote", "luggage",
            "suitcase", "duffel",
        ]),
        VocabularyEntry::new("clothing", &[
            "jacket", "coat", "hoodie", "sweater", "shirt", "tshirt", "t shirt", "trousers",
            "pants", "scarf", "cap", "hat", "gloves",
        ]),
    ]
}

fn default_colors() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new("black", &["jet black"]),
        VocabularyEntry::new("white", &["off white", "offwhite"]),
        VocabularyEntry::new("gray", &["grey", "space gray", "space grey", "charcoal"]),
        VocabularyEntry::new("red", &["reddish", "crimson"]),
        VocabularyEntry::new("blue", &["bluish", "navy", "navy blue", "sky blue"]),
        VocabularyEntry::new("green", &["greenish", "olive"]),
        VocabularyEntry::new("yellow", &["mustard"]),
        VocabularyEntry::new("orange", &[]),
        VocabularyEntry::new("pink", &["pinkish"]),
        VocabularyEntry::new("purple", &["purplish", "violet", "lavender"]),
        VocabularyEntry::new("brown", &["tan", "khaki"]),
        VocabularyEntry::new("beige", &["cream", "ivory"]),
        VocabularyEntry::new("maroon", &["burgundy"]),
        VocabularyEntry::new("teal", &["turquoise", "cyan", "aqua"]),
        VocabularyEntry::new("silver", &[]),
        VocabularyEntry::new("gold", &["golden", "rose gold"]),
        VocabularyEntry::new("transparent", &["clear", "translucent", "see through"]),
    ]
}

fn default_brands() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new("apple", &["iphone", "ipad", "macbook", "airpods"]),
        VocabularyEntry::new("samsung", &["galaxy"]),
        VocabularyEntry::new("xiaomi", &["redmi", "poco"]),
        VocabularyEntry::new("oneplus", &["one plus"]),
        VocabularyEntry::new("oppo", &[]),
        VocabularyEntry::new("vivo", &[]),
        VocabularyEntry::new("huawei", &[]),
        VocabularyEntry::new("google", &["pixel"]),
        VocabularyEntry::new("nokia", &[]),
        VocabularyEntry::new("realme", &[]),
        VocabularyEntry::new("motorola", &["moto"]),
        VocabularyEntry::new("dell", &[]),
        VocabularyEntry::new("hp", &["hewlett packard"]),
        VocabularyEntry::new("lenovo", &["thinkpad"]),
        VocabularyEntry::new("asus", &[]),
        VocabularyEntry::new("acer", &[]),
        VocabularyEntry::new("microsoft", &["surface"]),
        VocabularyEntry::new("sony", &[]),
        VocabularyEntry::new("jbl", &[]),
        VocabularyEntry::new("bose", &[]),
        VocabularyEntry::new("beats", &[]),
        VocabularyEntry::new("sennheiser", &[]),
        VocabularyEntry::new("anker", &["soundcore"]),
        VocabularyEntry::new("casio", &[]),
        VocabularyEntry::new("fossil", &[]),
        VocabularyEntry::new("garmin", &[]),
        VocabularyEntry::new("canon", &[]),
        VocabularyEntry::new("nikon", &[]),
        VocabularyEntry::new("gucci", &[]),
        VocabularyEntry::new("prada", &[]),
        VocabularyEntry::new("louis vuitton", &["lv"]),
        VocabularyEntry::new("nike", &[]),
        VocabularyEntry::new("adidas", &[]),
        VocabularyEntry::new("puma", &[]),
        VocabularyEntry::new("rolex", &[]),
        VocabularyEntry::new("ray ban", &["rayban"]),
        VocabularyEntry::new("samsonite", &[]),
        VocabularyEntry::new("jansport", &[]),
        VocabularyEntry::new("the north face", &["north face"]),
    ]
}

fn default_marks() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new("sticker", &["stickers"]),
        VocabularyEntry::new("scratch", &["scratched", "scratches"]),
        VocabularyEntry::new("engraved", &["engraving", "etched"]),
        VocabularyEntry::new("crack", &["cracked", "broken"]),
        VocabularyEntry::new("tear", &["torn"]),
        VocabularyEntry::new("dent", &["dented"]),
        VocabularyEntry::new("lock", &["locked"]),
    ]
}

fn default_stopwords() -> Vec<String> {
    [
        "a", "an", "the", "and", "or", "but", "with", "without", "near", "at", "in", "on", "to",
        "from", "of", "for", "by", "my", "our", "your", "his", "her", "their", "is", "was",
        "were", "it", "its", "this", "that", "i", "we", "they", "me", "someone", "somewhere",
        "yesterday", "today", "tomorrow", "evening", "morning", "afternoon", "night",
        "lost", "found", "missing", "pickup", "pick", "picked", "drop", "dropped", "left",
        "brand", "serial", "number", "no", "color", "colour", "model", "item", "please",
        "contact", "light", "dark", "bright", "pale",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_shades() -> Vec<String> {
    ["light", "dark", "deep", "pale", "bright", "neon"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::text::tokenize;

    #[test]
    fn test_longest_phrase_wins() {
        let table = PhraseTable::from_entries(&[
            VocabularyEntry::new("phone", &["cell", "cell phone"]),
        ]);
        let tokens = tokenize("my cell phone");

        assert_eq!(table.match_at(&tokens, 1), Some(("phone", 2)));
        assert_eq!(table.match_at(&tokens, 0), None);
    }

    #[test]
    fn test_earlier_entry_keeps_shared_synonym() {
        let table = PhraseTable::from_entries(&[
            VocabularyEntry::new("laptop", &["notebook"]),
            VocabularyEntry::new("book", &["notebook"]),
        ]);
        let tokens = tokenize("notebook");
        assert_eq!(table.match_at(&tokens, 0), Some(("laptop", 1)));
    }

    #[test]
    fn test_plural_fallback() {
        let table = PhraseTable::from_entries(&[VocabularyEntry::new("keys", &["keychain"])]);
        let tokens = tokenize("keychains");
        assert_eq!(table.match_at(&tokens, 0), None);

        let table = table.with_plural_fallback();
        assert_eq!(table.match_at(&tokens, 0), Some(("keys", 1)));
        assert!(table.claims_word("keychains"));
    }

    #[test]
    fn test_hyphenated_synonyms_are_normalized() {
        let table = PhraseTable::from_entries(&[VocabularyEntry::new("phone", &["cell-phone"])]);
        let tokens = tokenize("Cell-Phone");
        assert_eq!(table.match_at(&tokens, 0), Some(("phone", 2)));
    }

    #[test]
    fn test_default_lexicon_claims_vocabulary_words() {
        let lexicon = Lexicon::compile(&Vocabulary::default());
        assert!(lexicon.is_claimed("wallet"));
        assert!(lexicon.is_claimed("black"));
        assert!(lexicon.is_claimed("gucci"));
        assert!(lexicon.is_claimed("scratched"));
        assert!(!lexicon.is_claimed("leather"));
        assert!(lexicon.is_stopword("lost"));
    }

    #[test]
    fn test_joined_shade_split() {
        let lexicon = Lexicon::compile(&Vocabulary::default());
        assert_eq!(lexicon.split_joined_shade("lightblue"), Some(("light", "blue")));
        assert_eq!(lexicon.split_joined_shade("darkgrey"), Some(("dark", "gray")));
        assert_eq!(lexicon.split_joined_shade("light"), None);
        assert_eq!(lexicon.split_joined_shade("lighthouse"), None);
        assert!(lexicon.is_shade("neon"));
        assert!(lexicon.is_claimed("deep"));
    }
}
