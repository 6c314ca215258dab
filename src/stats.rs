use crate::models::{ActivityCount, MoodEntry, Review, StatsSummary, Trend};
use chrono::{Local, NaiveDate, TimeZone};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const RECENT_WINDOW: usize = 7;
pub const TOP_ACTIVITIES: usize = 3;
pub const INSIGHT_MIN_ENTRIES: usize = 3;

const MOOD_GLYPHS: [&str; 6] = ["", "◯", "◉", "◎", "◉", "◎"];
const FALLBACK_GLYPH: &str = "◎";

pub fn build_summary(entries: &[MoodEntry], reviews: &[Review]) -> StatsSummary {
    build_summary_in(&Local, entries, reviews)
}

pub fn build_summary_in<Tz: TimeZone>(
    tz: &Tz,
    entries: &[MoodEntry],
    reviews: &[Review],
) -> StatsSummary {
    let trend = trend(entries);
    StatsSummary {
        total_entries: entries.len(),
        average_mood: one_decimal(average_mood(entries)),
        streak: streak_in(tz, entries),
        best_mood: best_mood(entries),
        trend,
        insight: insight_message(trend),
        show_insights: entries.len() >= INSIGHT_MIN_ENTRIES,
        mood_distribution: mood_distribution(entries),
        top_activities: top_activities(entries, TOP_ACTIVITIES),
        average_rating: one_decimal(average_rating(reviews)),
        total_reviews: reviews.len(),
    }
}

/// Mean of `values`, or 0 when there are none.
pub fn average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub fn average_mood(entries: &[MoodEntry]) -> f64 {
    average(entries.iter().map(|entry| f64::from(entry.mood_value())))
}

pub fn average_rating(reviews: &[Review]) -> f64 {
    average(reviews.iter().map(|review| f64::from(review.rating_value())))
}

/// Rounds half away from zero before printing, so 2.25 shows as "2.3".
pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

pub fn streak(entries: &[MoodEntry]) -> usize {
    streak_in(&Local, entries)
}

/// Longest run of consecutive calendar days (in `tz`) that have at least one
/// entry. This is the best historical run, not the run ending today.
pub fn streak_in<Tz: TimeZone>(tz: &Tz, entries: &[MoodEntry]) -> usize {
    if entries.is_empty() {
        return 0;
    }

    let dates: BTreeSet<NaiveDate> = entries
        .iter()
        .filter_map(|entry| entry.date)
        .map(|date| date.with_timezone(tz).date_naive())
        .collect();

    let mut run = 1;
    let mut best = 1;
    let mut previous: Option<NaiveDate> = None;
    for date in dates {
        if let Some(prev) = previous {
            run = if (date - prev).num_days() == 1 { run + 1 } else { 1 };
            best = best.max(run);
        }
        previous = Some(date);
    }
    best
}

pub fn best_mood(entries: &[MoodEntry]) -> u8 {
    entries
        .iter()
        .map(MoodEntry::mood_value)
        .max()
        .unwrap_or(0)
}

/// Compares the last `RECENT_WINDOW` entries (insertion order) with the
/// unrounded all-time mean, so a history no longer than the window is
/// always `Stable`.
pub fn trend(entries: &[MoodEntry]) -> Trend {
    let recent = &entries[entries.len().saturating_sub(RECENT_WINDOW)..];
    let recent_avg = average_mood(recent);
    let overall_avg = average_mood(entries);

    match recent_avg.partial_cmp(&overall_avg) {
        Some(std::cmp::Ordering::Greater) => Trend::Improving,
        Some(std::cmp::Ordering::Less) => Trend::Declining,
        _ => Trend::Stable,
    }
}

pub fn insight_message(trend: Trend) -> String {
    format!("Your mood is {} recently. Keep tracking!", trend.as_str())
}

/// Entry count per mood 1-5. Scores outside that range are ignored.
pub fn mood_distribution(entries: &[MoodEntry]) -> BTreeMap<u8, usize> {
    let mut counts: BTreeMap<u8, usize> = (1..=5).map(|mood| (mood, 0)).collect();
    for entry in entries {
        if let Some(count) = entry.mood.and_then(|mood| counts.get_mut(&mood)) {
            *count += 1;
        }
    }
    counts
}

/// Most frequent activity tags. Equal counts keep first-seen order.
pub fn top_activities(entries: &[MoodEntry], k: usize) -> Vec<ActivityCount> {
    let mut order: Vec<ActivityCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for activity in entries.iter().flat_map(|entry| entry.activities.iter()) {
        match index.get(activity.as_str()) {
            Some(&slot) => order[slot].count += 1,
            None => {
                index.insert(activity.as_str(), order.len());
                order.push(ActivityCount {
                    activity: activity.clone(),
                    count: 1,
                });
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(k);
    order
}

pub fn mood_indicator(mood: Option<u8>) -> &'static str {
    mood.and_then(|mood| MOOD_GLYPHS.get(usize::from(mood)))
        .copied()
        .filter(|glyph| !glyph.is_empty())
        .unwrap_or(FALLBACK_GLYPH)
}
