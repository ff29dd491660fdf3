use std::sync::Arc;

use crate::core::error::MatchError;
use crate::core::extractor::Extractor;
use crate::core::text::jaccard;
use crate::models::{AttributeSet, ScoreBreakdown, ScoringWeights};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Check weights are non-negative and sum to 1.0
pub fn validate_weights(weights: &ScoringWeights) -> Result<(), MatchError> {
    let parts = [
        ("category", weights.category),
        ("color", weights.color),
        ("brand", weights.brand),
        ("identifier", weights.identifier),
        ("text", weights.text),
    ];

    for (name, value) in parts {
        if !value.is_finite() || value < 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "scoring weight '{}' must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    let total = weights.total();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(MatchError::InvalidConfig(format!(
            "scoring weights must sum to 1.0, got {:.6}",
            total
        )));
    }

    Ok(())
}

/// Calculate a match score (0.0-1.0) for two attribute sets and their raw text
///
/// Scoring formula:
/// score = 1.0 if any identifier is shared, otherwise
/// (
///     category_match * 0.30 +      # Same canonical category
///     color_overlap * 0.20 +       # Jaccard of color sets
///     brand_match * 0.15 +         # Same brand, both present
///     identifier_match * 0.20 +    # Always 0 here; a match short-circuits
///     text_similarity * 0.15       # Jaccard of content tokens
/// )
///
/// Weights are a fixed sum: a missing signal contributes 0 and the remaining
/// weights are not renormalised. Every component is symmetric, so swapping
/// the two sides yields the same score.
pub fn calculate_match_score(
    a: &AttributeSet,
    text_a: &str,
    b: &AttributeSet,
    text_b: &str,
    weights: &ScoringWeights,
    extractor: &Extractor,
) -> (f64, ScoreBreakdown) {
    let breakdown = ScoreBreakdown {
        category_match: a.has_category() && a.category == b.category,
        color_overlap: jaccard(&a.colors, &b.colors),
        brand_match: matches!((&a.brand, &b.brand), (Some(x), Some(y)) if x == y),
        identifier_match: !a.identifiers.is_disjoint(&b.identifiers),
        text_similarity: jaccard(&extractor.content_tokens(text_a), &extractor.content_tokens(text_b)),
    };

    if breakdown.identifier_match {
        return (1.0, breakdown);
    }

    let total = bool_score(breakdown.category_match) * weights.category
        + breakdown.color_overlap * weights.color
        + bool_score(breakdown.brand_match) * weights.brand
        + breakdown.text_similarity * weights.text;

    (total.clamp(0.0, 1.0), breakdown)
}

#[inline]
fn bool_score(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Human-readable reasons behind a score, for display next to a match
///
/// Identifier values are never echoed back; only the fact that one matched.
pub fn explain_match(a: &AttributeSet, b: &AttributeSet, breakdown: &ScoreBreakdown) -> Vec<String> {
    let mut reasons = Vec::new();

    if breakdown.identifier_match {
        reasons.push("Identifier signal matches (not displayed).".to_string());
    }

    if breakdown.category_match {
        reasons.push(format!("Item type matches: {}.", a.category));
    } else if a.has_category() && b.has_category() {
        reasons.push(format!("Item type differs ({} vs {}).", a.category, b.category));
    }

    let shared_colors: Vec<&str> = a.colors.intersection(&b.colors).map(String::as_str).collect();
    if !shared_colors.is_empty() {
        reasons.push(format!("Color overlap: {}.", shared_colors.join(", ")));
    } else if !a.colors.is_empty() && !b.colors.is_empty() {
        reasons.push("Colors don't overlap.".to_string());
    }

    if breakdown.brand_match {
        if let Some(brand) = &a.brand {
            reasons.push(format!("Brand matches: {}.", brand));
        }
    }

    if breakdown.text_similarity > 0.15 {
        reasons.push(format!(
            "Text overlap looks similar (Jaccard {:.2}).",
            breakdown.text_similarity
        ));
    }

    reasons
}

/// Similarity scorer bound to a set of weights and an extractor's vocabulary
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringWeights,
    extractor: Arc<Extractor>,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, extractor: Arc<Extractor>) -> Result<Self, MatchError> {
        validate_weights(&weights)?;
        Ok(Self { weights, extractor })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(
        &self,
        a: &AttributeSet,
        text_a: &str,
        b: &AttributeSet,
        text_b: &str,
    ) -> (f64, ScoreBreakdown) {
        calculate_match_score(a, text_a, b, text_b, &self.weights, &self.extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text_a: &str, text_b: &str) -> (f64, ScoreBreakdown) {
        let extractor = Extractor::with_defaults();
        let a = extractor.extract(text_a);
        let b = extractor.extract(text_b);
        calculate_match_score(&a, text_a, &b, text_b, &ScoringWeights::default(), &extractor)
    }

    #[test]
    fn test_identifier_match_forces_max_score() {
        let (score, breakdown) = scored("red umbrella tag QX7781", "black laptop sticker qx7781");
        assert_eq!(score, 1.0);
        assert!(breakdown.identifier_match);
        assert!(!breakdown.category_match);
    }

    #[test]
    fn test_color_only_contribution() {
        let (score, breakdown) = scored("blue thingamajig", "blue doohickey");
        assert!((score - 0.20).abs() < 1e-9, "expected 0.20, got {}", score);
        assert_eq!(breakdown.color_overlap, 1.0);
        assert_eq!(breakdown.text_similarity, 0.0);
    }

    #[test]
    fn test_empty_colors_contribute_nothing() {
        let (_, breakdown) = scored("leather wallet", "leather wallet");
        assert_eq!(breakdown.color_overlap, 0.0);

        let (_, breakdown) = scored("black wallet", "leather wallet");
        assert_eq!(breakdown.color_overlap, 0.0);
    }

    #[test]
    fn test_unknown_categories_do_not_match() {
        let (_, breakdown) = scored("shiny thing", "odd gadget");
        assert!(!breakdown.category_match);
    }

    #[test]
    fn test_category_brand_and_text() {
        let (score, breakdown) = scored(
            "samsung phone, leather cover",
            "found samsung mobile with leather cover",
        );
        assert!(breakdown.category_match);
        assert!(breakdown.brand_match);
        assert_eq!(breakdown.text_similarity, 1.0);
        assert!((score - 0.60).abs() < 1e-9, "expected 0.60, got {}", score);
    }

    #[test]
    fn test_score_is_symmetric() {
        let pairs = [
            ("black leather wallet gucci", "black and brown wallet, leather"),
            ("blue backpack with laptop inside", "navy rucksack"),
            ("", "red umbrella"),
            ("keys on a keyring, dented", "keychain with three keys"),
        ];

        for (a, b) in pairs {
            let (ab, _) = scored(a, b);
            let (ba, _) = scored(b, a);
            assert_eq!(ab, ba, "asymmetric score for {:?} / {:?}", a, b);
        }
    }

    #[test]
    fn test_weights_validation() {
        assert!(validate_weights(&ScoringWeights::default()).is_ok());

        let too_heavy = ScoringWeights { category: 0.5, ..ScoringWeights::default() };
        assert!(matches!(validate_weights(&too_heavy), Err(MatchError::InvalidConfig(_))));

        let negative = ScoringWeights {
            category: -0.1,
            color: 0.6,
            ..ScoringWeights::default()
        };
        assert!(validate_weights(&negative).is_err());
    }

    #[test]
    fn test_explain_match_hides_identifiers() {
        let extractor = Extractor::with_defaults();
        let a = extractor.extract("black gucci wallet serial AB1234");
        let b = extractor.extract("black wallet, gucci, AB1234");
        let (_, breakdown) = calculate_match_score(
            &a, "", &b, "", &ScoringWeights::default(), &extractor,
        );

        let reasons = explain_match(&a, &b, &breakdown);
        assert!(reasons.iter().any(|r| r.starts_with("Identifier signal")));
        assert!(reasons.iter().any(|r| r == "Item type matches: wallet."));
        assert!(reasons.iter().any(|r| r == "Color overlap: black."));
        assert!(reasons.iter().any(|r| r == "Brand matches: gucci."));
        assert!(reasons.iter().all(|r| !r.contains("ab1234")));
    }
}
