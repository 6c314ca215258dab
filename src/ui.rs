use crate::journal::Journal;
use crate::models::{MoodEntry, Review, StatsSummary};
use crate::stats::{build_summary_in, mood_indicator};
use chrono::{Local, TimeZone};

pub const RECENT_ENTRIES: usize = 10;
pub const RECENT_REVIEWS: usize = 5;

pub const ACTIVITIES: [&str; 8] = [
    "exercise",
    "sleep",
    "social",
    "work",
    "meditation",
    "reading",
    "outdoors",
    "hobbies",
];

/// One-shot message shown after a form post redirects back to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Saved,
    StorageFull,
    Deleted,
    Imported,
    ImportFailed,
    ReviewSaved,
}

impl Notice {
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "saved" => Some(Self::Saved),
            "storage_full" => Some(Self::StorageFull),
            "deleted" => Some(Self::Deleted),
            "imported" => Some(Self::Imported),
            "import_failed" => Some(Self::ImportFailed),
            "review_saved" => Some(Self::ReviewSaved),
            _ => None,
        }
    }

    pub fn as_query(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::StorageFull => "storage_full",
            Self::Deleted => "deleted",
            Self::Imported => "imported",
            Self::ImportFailed => "import_failed",
            Self::ReviewSaved => "review_saved",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "✅ Saved!",
            Self::StorageFull => "❌ Storage full!",
            Self::Deleted => "🗑️ Entry deleted",
            Self::Imported => "📥 Data imported",
            Self::ImportFailed => "❌ Could not read that file",
            Self::ReviewSaved => "🙏 Thanks for the review!",
        }
    }

    fn is_error(self) -> bool {
        matches!(self, Self::StorageFull | Self::ImportFailed)
    }
}

pub fn render_index(journal: &Journal, notice: Option<Notice>) -> String {
    render_index_in(&Local, journal.entries(), journal.reviews(), notice)
}

pub fn render_index_in<Tz: TimeZone>(
    tz: &Tz,
    entries: &[MoodEntry],
    reviews: &[Review],
    notice: Option<Notice>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let summary = build_summary_in(tz, entries, reviews);
    INDEX_HTML
        .replace("{{TOTAL_DAYS}}", &summary.total_entries.to_string())
        .replace("{{AVG_MOOD}}", &summary.average_mood)
        .replace("{{STREAK}}", &summary.streak.to_string())
        .replace("{{BEST_MOOD}}", &summary.best_mood.to_string())
        .replace("{{INSIGHTS_CLASS}}", insights_class(&summary))
        .replace("{{INSIGHT_TEXT}}", &escape_html(&summary.insight))
        .replace("{{DISTRIBUTION}}", &render_distribution(&summary))
        .replace("{{TOP_ACTIVITIES}}", &render_top_activities(&summary))
        .replace("{{ACTIVITY_CHOICES}}", &render_activity_choices())
        .replace("{{ENTRIES}}", &render_entries(tz, entries))
        .replace("{{AVG_RATING}}", &summary.average_rating)
        .replace("{{REVIEWS}}", &render_reviews(reviews))
        .replace("{{NOTICE}}", &render_notice(notice))
}

fn insights_class(summary: &StatsSummary) -> &'static str {
    if summary.show_insights {
        "insights"
    } else {
        "insights hidden"
    }
}

fn render_entries<Tz: TimeZone>(tz: &Tz, entries: &[MoodEntry]) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if entries.is_empty() {
        return r#"<p class="empty">No entries yet. How are you feeling today?</p>"#.to_string();
    }

    entries
        .iter()
        .rev()
        .take(RECENT_ENTRIES)
        .map(|entry| {
            let date = entry
                .date
                .map(|date| date.with_timezone(tz).format("%a, %b %-d").to_string())
                .unwrap_or_else(|| "Unknown date".to_string());
            let mood = entry
                .mood
                .map(|mood| mood.to_string())
                .unwrap_or_else(|| "?".to_string());
            let activities = if entry.activities.is_empty() {
                "None".to_string()
            } else {
                escape_html(&entry.activities.join(", "))
            };
            let notes = if entry.notes.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<div class="entry-notes">Note: {}</div>"#,
                    escape_html(&entry.notes)
                )
            };

            format!(
                r#"<div class="entry" data-id="{id}">
          <div class="entry-date">{date}</div>
          <div class="entry-mood">Mood: {glyph} ({mood}/5)</div>
          <div class="entry-activities">Activities: {activities}</div>
          {notes}
          <form method="post" action="/entries/{id}/delete"><button class="btn-delete" type="submit">Delete</button></form>
        </div>"#,
                id = entry.id,
                glyph = mood_indicator(entry.mood),
            )
        })
        .collect()
}

fn render_reviews(reviews: &[Review]) -> String {
    reviews
        .iter()
        .rev()
        .take(RECENT_REVIEWS)
        .map(|review| {
            format!(
                r#"<div class="review-item">{}<p>{}</p></div>"#,
                "⭐".repeat(usize::from(review.rating_value())),
                escape_html(&review.feedback)
            )
        })
        .collect()
}

fn render_distribution(summary: &StatsSummary) -> String {
    let total = summary.mood_distribution.values().sum::<usize>().max(1);
    summary
        .mood_distribution
        .iter()
        .map(|(mood, count)| {
            let width = count * 100 / total;
            format!(
                r#"<div class="bar"><span class="bar-label">{mood} {glyph}</span><span class="bar-track"><span class="bar-fill" style="width: {width}%"></span></span><span class="bar-count">{count}</span></div>"#,
                glyph = mood_indicator(Some(*mood)),
            )
        })
        .collect()
}

fn render_top_activities(summary: &StatsSummary) -> String {
    if summary.top_activities.is_empty() {
        return "<li>None yet</li>".to_string();
    }
    summary
        .top_activities
        .iter()
        .map(|item| format!("<li>{} ({})</li>", escape_html(&item.activity), item.count))
        .collect()
}

fn render_activity_choices() -> String {
    ACTIVITIES
        .iter()
        .map(|activity| {
            format!(
                r#"<label class="activity-item"><input type="checkbox" data-activity="{activity}" />{activity}</label>"#
            )
        })
        .collect()
}

fn render_notice(notice: Option<Notice>) -> String {
    match notice {
        Some(notice) => format!(
            r#"<div class="notification{}" id="notification">{}</div>"#,
            if notice.is_error() { " error" } else { "" },
            notice.message()
        ),
        None => String::new(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>MindTrack</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef3f6;
      --bg-2: #c9dfe8;
      --ink: #24303a;
      --accent: #4a8fff;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e4eef2 60%, #f4f8f9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .card {
      background: white;
      border-radius: 20px;
      padding: 20px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .moods {
      display: flex;
      gap: 10px;
      flex-wrap: wrap;
    }

    .mood-btn input,
    .activity-item input {
      margin-right: 6px;
    }

    .mood-btn,
    .activity-item {
      padding: 8px 14px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.08);
      cursor: pointer;
    }

    .activities {
      display: flex;
      gap: 8px;
      flex-wrap: wrap;
      margin: 14px 0;
    }

    textarea {
      width: 100%;
      min-height: 70px;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 10px;
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    .btn-delete {
      background: transparent;
      color: #c63b2b;
      padding: 4px 0;
      font-size: 0.85rem;
    }

    .entry,
    .review-item {
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
      padding: 12px 0;
    }

    .entry-date {
      font-weight: 600;
    }

    .bar {
      display: grid;
      grid-template-columns: 60px 1fr 40px;
      gap: 10px;
      align-items: center;
      margin: 6px 0;
    }

    .bar-track {
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
      height: 10px;
      overflow: hidden;
    }

    .bar-fill {
      display: block;
      height: 100%;
      background: var(--accent);
    }

    .hidden {
      display: none;
    }

    .notification {
      position: fixed;
      top: 20px;
      right: 20px;
      background: #2d7a4b;
      color: white;
      padding: 12px 18px;
      border-radius: 14px;
      box-shadow: var(--shadow);
    }

    .notification.error {
      background: #c63b2b;
    }

    .empty {
      color: #6f6a65;
    }
  </style>
</head>
<body>
  {{NOTICE}}
  <main class="app">
    <header>
      <h1>MindTrack</h1>
      <p class="subtitle">Check in daily, tag what you did, and watch the pattern.</p>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">Days logged</span>
        <span id="totalDays" class="value">{{TOTAL_DAYS}}</span>
      </div>
      <div class="stat">
        <span class="label">Average mood</span>
        <span id="avgMood" class="value">{{AVG_MOOD}}</span>
      </div>
      <div class="stat">
        <span class="label">Streak</span>
        <span id="currentStreak" class="value">{{STREAK}}</span>
      </div>
      <div class="stat">
        <span class="label">Best mood</span>
        <span id="bestMood" class="value">{{BEST_MOOD}}</span>
      </div>
    </section>

    <section id="insights" class="{{INSIGHTS_CLASS}}">
      <div class="card">
        <h2>Insights</h2>
        <p id="insightText">{{INSIGHT_TEXT}}</p>
      </div>
    </section>

    <section class="card">
      <h2>How are you feeling?</h2>
      <form id="entry-form" method="post" action="/entries">
        <div class="moods">
          <label class="mood-btn" data-mood="1"><input type="radio" name="mood" value="1" />1 ◯</label>
          <label class="mood-btn" data-mood="2"><input type="radio" name="mood" value="2" />2 ◉</label>
          <label class="mood-btn" data-mood="3"><input type="radio" name="mood" value="3" />3 ◎</label>
          <label class="mood-btn" data-mood="4"><input type="radio" name="mood" value="4" />4 ◉</label>
          <label class="mood-btn" data-mood="5"><input type="radio" name="mood" value="5" />5 ◎</label>
        </div>
        <div class="activities">{{ACTIVITY_CHOICES}}</div>
        <input type="hidden" name="activities" id="activities" value="" />
        <textarea id="notes" name="notes" placeholder="Anything on your mind?"></textarea>
        <p><button type="submit">Save entry</button></p>
      </form>
    </section>

    <section class="panel">
      <div class="card">
        <h2>Mood distribution</h2>
        <div id="moodDistribution">{{DISTRIBUTION}}</div>
      </div>
      <div class="card">
        <h2>Top activities</h2>
        <ol id="topActivities">{{TOP_ACTIVITIES}}</ol>
      </div>
    </section>

    <section class="card">
      <h2>Recent entries</h2>
      <div id="entriesList">{{ENTRIES}}</div>
      <p>
        <a href="/api/export" download="wellness-data.json">Export data</a>
        &middot;
        <label>Import <input type="file" id="importFile" accept="application/json" /></label>
      </p>
    </section>

    <section class="card">
      <h2>Reviews <small>(average {{AVG_RATING}})</small></h2>
      <form id="review-form" method="post" action="/reviews">
        <select id="reviewRating" name="rating">
          <option value="5">⭐⭐⭐⭐⭐</option>
          <option value="4">⭐⭐⭐⭐</option>
          <option value="3" selected>⭐⭐⭐</option>
          <option value="2">⭐⭐</option>
          <option value="1">⭐</option>
        </select>
        <textarea id="reviewFeedback" name="feedback" placeholder="What do you think of the app?"></textarea>
        <p><button type="submit">Send review</button></p>
      </form>
      <div id="reviewsList">{{REVIEWS}}</div>
    </section>
  </main>

  <script>
    const entryForm = document.getElementById('entry-form');
    const activitiesInput = document.getElementById('activities');
    const importInput = document.getElementById('importFile');
    const notification = document.getElementById('notification');

    const clearForm = () => {
      entryForm.reset();
      activitiesInput.value = '';
    };

    entryForm.addEventListener('submit', () => {
      activitiesInput.value = Array.from(document.querySelectorAll('.activity-item input:checked'))
        .map((input) => input.dataset.activity)
        .join(',');
    });

    document.addEventListener('keydown', (event) => {
      if (event.key === 'Escape') {
        clearForm();
      }
    });

    importInput.addEventListener('change', async () => {
      const file = importInput.files[0];
      if (!file) {
        return;
      }
      const res = await fetch('/api/import', { method: 'POST', body: await file.text() });
      window.location.href = res.ok ? '/?notice=imported' : '/?notice=import_failed';
    });

    if (notification) {
      setTimeout(() => notification.remove(), 3000);
      history.replaceState(null, '', '/');
    }
  </script>
</body>
</html>
"#;
