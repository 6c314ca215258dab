use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MOOD: u8 = 3;
pub const DEFAULT_RATING: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl MoodEntry {
    /// Mood as used by the aggregates: a missing score counts as zero.
    pub fn mood_value(&self) -> u8 {
        self.mood.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl Review {
    pub fn rating_value(&self) -> u8 {
        self.rating.unwrap_or(0)
    }
}

/// Input for a new check-in. Every field is optional; see `DEFAULT_MOOD`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEntry {
    pub mood: Option<u8>,
    #[serde(default)]
    pub activities: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReview {
    pub rating: Option<u8>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub entries: Vec<MoodEntry>,
    pub export_date: DateTime<Utc>,
}

/// Shape accepted by import. Only `entries` is read.
#[derive(Debug, Deserialize)]
pub struct ImportFile {
    #[serde(default)]
    pub entries: Option<Vec<MoodEntry>>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityCount {
    pub activity: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub total_entries: usize,
    pub average_mood: String,
    pub streak: usize,
    pub best_mood: u8,
    pub trend: Trend,
    pub insight: String,
    pub show_insights: bool,
    pub mood_distribution: BTreeMap<u8, usize>,
    pub top_activities: Vec<ActivityCount>,
    pub average_rating: String,
    pub total_reviews: usize,
}
