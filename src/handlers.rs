use crate::errors::AppError;
use crate::journal::{EXPORT_FILE_NAME, JournalError};
use crate::models::{ImportResponse, MoodEntry, NewEntry, NewReview, Review, StatsSummary};
use crate::state::AppState;
use crate::stats::build_summary;
use crate::ui::{Notice, render_index};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub notice: Option<String>,
}

/// Entry form as posted by the page. Activities arrive comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct EntryForm {
    pub mood: Option<String>,
    pub activities: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<String>,
    pub feedback: Option<String>,
}

impl EntryForm {
    pub fn into_new_entry(self) -> Result<NewEntry, AppError> {
        let activities = self
            .activities
            .map(|raw| raw.split(',').map(str::to_string).collect::<Vec<_>>());
        Ok(NewEntry {
            mood: parse_score("mood", self.mood.as_deref())?,
            activities,
            notes: self.notes,
        })
    }
}

impl ReviewForm {
    pub fn into_new_review(self) -> Result<NewReview, AppError> {
        Ok(NewReview {
            rating: parse_score("rating", self.rating.as_deref())?,
            feedback: self.feedback,
        })
    }
}

/// Blank form fields mean "use the default".
fn parse_score(field: &str, raw: Option<&str>) -> Result<Option<u8>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<u8>()
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("{field} must be a number from 1 to 5"))),
    }
}

pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Html<String> {
    let notice = query.notice.as_deref().and_then(Notice::from_query);
    let journal = state.journal.lock().await;
    Html(render_index(&journal, notice))
}

pub async fn entry_submit(
    State(state): State<AppState>,
    Form(form): Form<EntryForm>,
) -> Result<Redirect, AppError> {
    let input = form.into_new_entry()?;
    let mut journal = state.journal.lock().await;
    match journal.add_entry(input, Utc::now()).await {
        Ok(_) => Ok(notice_redirect(Notice::Saved)),
        Err(JournalError::Storage(err)) => {
            warn!("entry not saved: {err}");
            Ok(notice_redirect(Notice::StorageFull))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn entry_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let mut journal = state.journal.lock().await;
    match journal.delete_entry(id).await {
        Ok(true) => Ok(notice_redirect(Notice::Deleted)),
        Ok(false) => Ok(Redirect::to("/")),
        Err(JournalError::Storage(err)) => {
            warn!(id, "entry not deleted: {err}");
            Ok(notice_redirect(Notice::StorageFull))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn review_submit(
    State(state): State<AppState>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, AppError> {
    let input = form.into_new_review()?;
    let mut journal = state.journal.lock().await;
    match journal.add_review(input, Utc::now()).await {
        Ok(_) => Ok(notice_redirect(Notice::ReviewSaved)),
        Err(JournalError::Storage(err)) => {
            warn!("review not saved: {err}");
            Ok(notice_redirect(Notice::StorageFull))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<MoodEntry>> {
    let journal = state.journal.lock().await;
    Json(journal.entries().to_vec())
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(input): Json<NewEntry>,
) -> Result<(StatusCode, Json<MoodEntry>), AppError> {
    let mut journal = state.journal.lock().await;
    let entry = journal.add_entry(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut journal = state.journal.lock().await;
    if journal.delete_entry(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no entry with id {id}")))
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSummary> {
    let journal = state.journal.lock().await;
    Json(build_summary(journal.entries(), journal.reviews()))
}

pub async fn list_reviews(State(state): State<AppState>) -> Json<Vec<Review>> {
    let journal = state.journal.lock().await;
    Json(journal.reviews().to_vec())
}

pub async fn create_review(
    State(state): State<AppState>,
    Json(input): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let mut journal = state.journal.lock().await;
    let review = journal.add_review(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let journal = state.journal.lock().await;
    let body = journal.export_json(Utc::now()).map_err(AppError::internal)?;
    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Body is the raw text of a previously exported file.
pub async fn import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let mut journal = state.journal.lock().await;
    let imported = journal.import(&body).await?;
    Ok(Json(ImportResponse { imported }))
}

fn notice_redirect(notice: Notice) -> Redirect {
    Redirect::to(&format!("/?notice={}", notice.as_query()))
}
