use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::extractor::Extractor;
use crate::core::text::tokenize;
use crate::models::AttributeSet;

/// Attribute a clarifying question asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClarifyField {
    Brand,
    Colors,
    Category,
    Marks,
}

impl ClarifyField {
    fn prompt(&self) -> &'static str {
        match self {
            ClarifyField::Brand => "What brand is it? (e.g., Samsung, Apple, Xiaomi)",
            ClarifyField::Colors => "What color is it? (e.g., black/blue/red/transparent)",
            ClarifyField::Category => "What is the item type? (phone/wallet/keys/bag/umbrella/etc.)",
            ClarifyField::Marks => "Any unique mark? (sticker / scratch / engraved text)",
        }
    }

    fn is_missing(&self, attrs: &AttributeSet) -> bool {
        match self {
            ClarifyField::Brand => attrs.brand.is_none(),
            ClarifyField::Colors => attrs.colors.is_empty(),
            ClarifyField::Category => !attrs.has_category(),
            ClarifyField::Marks => attrs.marks.is_empty(),
        }
    }

    fn value_of(&self, attrs: &AttributeSet) -> Option<String> {
        match self {
            ClarifyField::Brand => attrs.brand.clone(),
            ClarifyField::Colors => join_non_empty(&attrs.colors),
            ClarifyField::Category => attrs.has_category().then(|| attrs.category.clone()),
            ClarifyField::Marks => join_non_empty(&attrs.marks),
        }
    }
}

fn join_non_empty(values: &BTreeSet<String>) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect::<Vec<_>>().join(","))
    }
}

/// A single follow-up question for the reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub field: ClarifyField,
    pub prompt: String,
}

/// Pick the one question that best separates the top candidates
///
/// Only attributes the source report is missing are considered. The field
/// whose values differ the most across the candidates wins, earlier fields
/// winning ties; at least two distinct values are needed for a question to
/// be worth asking.
pub fn choose_clarifying_question(
    source: &AttributeSet,
    top_candidates: &[&AttributeSet],
) -> Option<ClarifyingQuestion> {
    if top_candidates.is_empty() {
        return None;
    }

    let mut best: Option<(ClarifyField, usize)> = None;

    for field in [ClarifyField::Brand, ClarifyField::Colors, ClarifyField::Category, ClarifyField::Marks] {
        if !field.is_missing(source) {
            continue;
        }

        let distinct: BTreeSet<String> = top_candidates
            .iter()
            .filter_map(|attrs| field.value_of(attrs))
            .collect();

        if best.map_or(true, |(_, diversity)| distinct.len() > diversity) {
            best = Some((field, distinct.len()));
        }
    }

    best.filter(|(_, diversity)| *diversity >= 2)
        .map(|(field, _)| ClarifyingQuestion {
            field,
            prompt: field.prompt().to_string(),
        })
}

/// Fold the reporter's answer to a clarifying question into their attributes
///
/// Colors and marks are replaced by what the answer mentions. Brand and
/// category take the vocabulary value the answer names, or else its first
/// meaningful word, so an unlisted brand is still recorded. An answer with
/// nothing usable leaves the attributes untouched.
pub fn apply_clarification(
    extractor: &Extractor,
    attrs: &mut AttributeSet,
    field: ClarifyField,
    answer: &str,
) {
    let answered = extractor.extract(answer);

    match field {
        ClarifyField::Brand => {
            if let Some(brand) = answered.brand.or_else(|| first_free_word(extractor, answer)) {
                attrs.brand = Some(brand);
            }
        }
        ClarifyField::Colors => attrs.colors = answered.colors,
        ClarifyField::Category => {
            let category = if answered.has_category() {
                Some(answered.category)
            } else {
                first_free_word(extractor, answer)
            };
            if let Some(category) = category {
                attrs.category = category;
            }
        }
        ClarifyField::Marks => attrs.marks = answered.marks,
    }
}

fn first_free_word(extractor: &Extractor, answer: &str) -> Option<String> {
    tokenize(answer)
        .into_iter()
        .find(|t| t.chars().count() > 1 && !extractor.lexicon().is_stopword(t))
}
