use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Category assigned when no vocabulary entry matches
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Whether a report describes something lost or something found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Lost,
    Found,
}

impl ReportKind {
    /// The kind a report of this kind is matched against
    pub fn opposite(self) -> Self {
        match self {
            ReportKind::Lost => ReportKind::Found,
            ReportKind::Found => ReportKind::Lost,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Lost => "lost",
            ReportKind::Found => "found",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lost" => Ok(ReportKind::Lost),
            "found" => Ok(ReportKind::Found),
            other => Err(format!("unknown report kind '{}'", other)),
        }
    }
}

/// Lifecycle state of a report, owned by the claim workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Claimed,
    Settled,
    Disputed,
    Closed,
}

impl ReportStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ReportStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::Claimed => "claimed",
            ReportStatus::Settled => "settled",
            ReportStatus::Disputed => "disputed",
            ReportStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(ReportStatus::Open),
            "claimed" => Ok(ReportStatus::Claimed),
            "settled" => Ok(ReportStatus::Settled),
            "disputed" => Ok(ReportStatus::Disputed),
            "closed" => Ok(ReportStatus::Closed),
            other => Err(format!("unknown report status '{}'", other)),
        }
    }
}

fn default_status() -> ReportStatus {
    ReportStatus::Open
}

/// A lost or found item report as supplied by the report store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub kind: ReportKind,
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(rename = "locationText", default)]
    pub location_text: Option<String>,
    #[serde(rename = "ownerId", default)]
    pub owner_id: String,
    #[serde(default = "default_status")]
    pub status: ReportStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Text the matcher extracts attributes from and compares:
    /// title, description and location joined by spaces.
    pub fn match_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(title);
        }
        parts.push(&self.description);
        if let Some(location) = self.location_text.as_deref().filter(|l| !l.trim().is_empty()) {
            parts.push(location);
        }
        parts.join(" ")
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Name of the first required field that is missing or blank
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.id.trim().is_empty() {
            return Some("id");
        }
        if self.description.trim().is_empty() {
            return Some("description");
        }
        None
    }
}

/// Structured attributes extracted from a report's text
///
/// Sets are ordered so that equality, hashing of the serialized form and
/// iteration order are all deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub category: String,
    #[serde(default)]
    pub colors: BTreeSet<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub identifiers: BTreeSet<String>,
    #[serde(default)]
    pub marks: BTreeSet<String>,
}

impl AttributeSet {
    pub fn empty() -> Self {
        Self {
            category: UNKNOWN_CATEGORY.to_string(),
            colors: BTreeSet::new(),
            brand: None,
            identifiers: BTreeSet::new(),
            marks: BTreeSet::new(),
        }
    }

    pub fn has_category(&self) -> bool {
        !self.category.is_empty() && self.category != UNKNOWN_CATEGORY
    }

    pub fn is_empty(&self) -> bool {
        !self.has_category()
            && self.colors.is_empty()
            && self.brand.is_none()
            && self.identifiers.is_empty()
            && self.marks.is_empty()
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-attribute contributions behind a match score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(rename = "categoryMatch")]
    pub category_match: bool,
    #[serde(rename = "colorOverlap")]
    pub color_overlap: f64,
    #[serde(rename = "brandMatch")]
    pub brand_match: bool,
    #[serde(rename = "identifierMatch")]
    pub identifier_match: bool,
    #[serde(rename = "textSimilarity")]
    pub text_similarity: f64,
}

/// A scored pairing of a source report with an opposite-kind candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    #[serde(rename = "candidateKind")]
    pub candidate_kind: ReportKind,
    #[serde(rename = "candidateCreatedAt")]
    pub candidate_created_at: DateTime<Utc>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Scoring weights, expected to sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub category: f64,
    pub color: f64,
    pub brand: f64,
    pub identifier: f64,
    pub text: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.category + self.color + self.brand + self.identifier + self.text
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 0.30,
            color: 0.20,
            brand: 0.15,
            identifier: 0.20,
            text: 0.15,
        }
    }
}
