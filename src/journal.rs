use crate::models::{
    DEFAULT_MOOD, DEFAULT_RATING, ExportFile, ImportFile, MoodEntry, NewEntry, NewReview, Review,
};
use crate::storage::{LocalStorage, StorageError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

pub const ENTRIES_KEY: &str = "wellnessEntries";
pub const REVIEWS_KEY: &str = "appReviews";
pub const EXPORT_FILE_NAME: &str = "wellness-data.json";

const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("mood must be between 1 and 5, got {0}")]
    InvalidMood(u8),
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("import file is not valid journal JSON: {0}")]
    Import(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Entries and reviews plus the storage they are written through to.
///
/// Every mutator persists before returning; when the write fails the
/// in-memory collection is put back the way it was.
#[derive(Debug)]
pub struct Journal {
    storage: LocalStorage,
    entries: Vec<MoodEntry>,
    reviews: Vec<Review>,
    last_id: i64,
}

impl Journal {
    pub fn load(storage: LocalStorage) -> Self {
        let entries: Vec<MoodEntry> = read_collection(&storage, ENTRIES_KEY);
        let reviews: Vec<Review> = read_collection(&storage, REVIEWS_KEY);
        let last_id = entries
            .iter()
            .map(|entry| entry.id)
            .chain(reviews.iter().map(|review| review.id))
            .max()
            .unwrap_or(0);

        info!(
            entries = entries.len(),
            reviews = reviews.len(),
            "loaded journal"
        );
        Self {
            storage,
            entries,
            reviews,
            last_id,
        }
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub async fn save_entries(&mut self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&self.entries)?;
        self.storage.set_item(ENTRIES_KEY, payload).await
    }

    pub async fn save_reviews(&mut self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&self.reviews)?;
        self.storage.set_item(REVIEWS_KEY, payload).await
    }

    pub async fn add_entry(
        &mut self,
        input: NewEntry,
        now: DateTime<Utc>,
    ) -> Result<MoodEntry, JournalError> {
        let mood = input.mood.unwrap_or(DEFAULT_MOOD);
        if !SCORE_RANGE.contains(&mood) {
            return Err(JournalError::InvalidMood(mood));
        }

        let entry = MoodEntry {
            id: self.next_id(now),
            mood: Some(mood),
            date: Some(now),
            activities: normalize_activities(input.activities.unwrap_or_default()),
            notes: input.notes.unwrap_or_default(),
        };

        self.entries.push(entry.clone());
        if let Err(err) = self.save_entries().await {
            self.entries.pop();
            warn!(id = entry.id, "rolled back entry: {err}");
            return Err(err.into());
        }

        info!(id = entry.id, mood, "saved entry");
        Ok(entry)
    }

    /// Removes the entry with exactly this id. Returns `false` without
    /// writing anything when no entry matches.
    pub async fn delete_entry(&mut self, id: i64) -> Result<bool, JournalError> {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(false);
        };

        let removed = self.entries.remove(position);
        if let Err(err) = self.save_entries().await {
            self.entries.insert(position, removed);
            warn!(id, "rolled back delete: {err}");
            return Err(err.into());
        }

        info!(id, "deleted entry");
        Ok(true)
    }

    pub fn export(&self, now: DateTime<Utc>) -> ExportFile {
        ExportFile {
            entries: self.entries.clone(),
            export_date: now,
        }
    }

    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export(now))
    }

    /// Replaces all entries with the `entries` field of an exported file.
    /// A file without that field clears the journal.
    pub async fn import(&mut self, text: &str) -> Result<usize, JournalError> {
        let file: ImportFile = serde_json::from_str(text)?;
        let incoming = file.entries.unwrap_or_default();
        let count = incoming.len();

        let previous = std::mem::replace(&mut self.entries, incoming);
        if let Err(err) = self.save_entries().await {
            self.entries = previous;
            warn!("rolled back import: {err}");
            return Err(err.into());
        }

        if let Some(max_id) = self.entries.iter().map(|entry| entry.id).max() {
            self.last_id = self.last_id.max(max_id);
        }
        info!(count, "imported entries");
        Ok(count)
    }

    pub async fn add_review(
        &mut self,
        input: NewReview,
        now: DateTime<Utc>,
    ) -> Result<Review, JournalError> {
        let rating = input.rating.unwrap_or(DEFAULT_RATING);
        if !SCORE_RANGE.contains(&rating) {
            return Err(JournalError::InvalidRating(rating));
        }

        let review = Review {
            id: self.next_id(now),
            rating: Some(rating),
            feedback: input.feedback.unwrap_or_default(),
            date: Some(now),
        };

        self.reviews.push(review.clone());
        if let Err(err) = self.save_reviews().await {
            self.reviews.pop();
            warn!(id = review.id, "rolled back review: {err}");
            return Err(err.into());
        }

        info!(id = review.id, rating, "saved review");
        Ok(review)
    }

    /// Millisecond timestamp, bumped past the last id handed out so ids stay
    /// unique when two records land in the same millisecond.
    fn next_id(&mut self, now: DateTime<Utc>) -> i64 {
        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

fn read_collection<T: DeserializeOwned>(storage: &LocalStorage, key: &str) -> Vec<T> {
    let Some(raw) = storage.get_item(key) else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(key, "discarding unreadable collection: {err}");
        Vec::new()
    })
}

fn normalize_activities(activities: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(activities.len());
    for activity in activities {
        let tag = activity.trim();
        if !tag.is_empty() && !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
