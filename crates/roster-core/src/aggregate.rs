//! Summary statistics for the reporting views.
//!
//! Everything here is a pure function over an in-memory snapshot of the
//! table. Nothing is cached between calls.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::{
  place::PlaceNormalizer,
  record::{CitizenRecord, Field},
};

// ─── Counts ──────────────────────────────────────────────────────────────────

/// One grouped value and how many records carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub value: String,
  pub count: usize,
}

/// Per-value counts in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Counts {
  entries: Vec<Tally>,
  #[serde(skip)]
  index:   HashMap<String, usize>,
}

impl Counts {
  pub fn add(&mut self, value: String) {
    match self.index.get(&value) {
      Some(&i) => self.entries[i].count += 1,
      None => {
        self.index.insert(value.clone(), self.entries.len());
        self.entries.push(Tally { value, count: 1 });
      }
    }
  }

  /// Count for `value`; zero if never seen.
  pub fn get(&self, value: &str) -> usize {
    self.index.get(value).map_or(0, |&i| self.entries[i].count)
  }

  /// Number of distinct values.
  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Sum of all counts.
  pub fn total(&self) -> usize { self.entries.iter().map(|t| t.count).sum() }

  pub fn iter(&self) -> impl Iterator<Item = &Tally> { self.entries.iter() }
}

impl FromIterator<String> for Counts {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    let mut counts = Self::default();
    for value in iter {
      counts.add(value);
    }
    counts
  }
}

/// Group records by a field's trimmed, uppercased value.
pub fn count_by_field(records: &[CitizenRecord], field: Field) -> Counts {
  records
    .iter()
    .map(|r| r.value(field).trim().to_uppercase())
    .collect()
}

/// Group records by the canonical key of their city.
pub fn count_by_place(records: &[CitizenRecord], normalizer: &PlaceNormalizer) -> Counts {
  records.iter().map(|r| normalizer.normalize(&r.city)).collect()
}

/// The `n` largest counts, descending. Ties keep first-seen order.
pub fn top_n(counts: &Counts, n: usize) -> Vec<Tally> {
  let mut ranked = counts.entries.clone();
  // `sort_by` is stable.
  ranked.sort_by(|a, b| b.count.cmp(&a.count));
  ranked.truncate(n);
  ranked
}

// ─── Time windows ────────────────────────────────────────────────────────────

/// Records registered within `[reference - window_days, reference]`, both
/// ends inclusive.
pub fn count_in_window(
  records: &[CitizenRecord],
  reference: DateTime<Utc>,
  window_days: u32,
) -> usize {
  let start = reference - Duration::days(i64::from(window_days));
  records
    .iter()
    .filter(|r| r.registered_at >= start && r.registered_at <= reference)
    .count()
}

/// Records whose registration falls on `date` in the campaign's time zone.
pub fn count_on_date(records: &[CitizenRecord], date: NaiveDate, offset: FixedOffset) -> usize {
  records
    .iter()
    .filter(|r| r.registered_at.with_timezone(&offset).date_naive() == date)
    .count()
}

/// Registrations per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
  pub date:  NaiveDate,
  pub count: usize,
}

/// Registrations per local calendar day, oldest first. Days without
/// registrations are omitted.
pub fn daily_counts(records: &[CitizenRecord], offset: FixedOffset) -> Vec<DailyCount> {
  let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
  for r in records {
    *days.entry(r.registered_at.with_timezone(&offset).date_naive()).or_default() += 1;
  }
  days.into_iter().map(|(date, count)| DailyCount { date, count }).collect()
}

/// `min(total / goal, 1.0)`, with `0.0` for no registrations and `1.0` for a
/// zero goal that has any.
pub fn progress_fraction(total: usize, goal: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  if goal == 0 {
    return 1.0;
  }
  (total as f64 / goal as f64).min(1.0)
}

// ─── Dashboard summary ───────────────────────────────────────────────────────

/// Knobs for [`summarize`].
#[derive(Debug, Clone)]
pub struct SummarySettings {
  pub goal:             usize,
  /// The campaign's local offset; decides where "today" starts.
  pub offset:           FixedOffset,
  pub leaderboard_size: usize,
  pub normalizer:       PlaceNormalizer,
}

/// Key figures for the statistics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub generated_at:    DateTime<Utc>,
  pub total:           usize,
  /// Distinct canonical places.
  pub distinct_cities: usize,
  /// Full name on the most recently appended row.
  pub last_registered: Option<String>,
  pub today:           usize,
  pub last_8_days:     usize,
  pub last_30_days:    usize,
  pub goal:            usize,
  pub progress:        f64,
  /// Operators ranked by registrations.
  pub leaderboard:     Vec<Tally>,
  /// Places ranked by registrations.
  pub by_city:         Vec<Tally>,
}

pub fn summarize(
  records: &[CitizenRecord],
  now: DateTime<Utc>,
  settings: &SummarySettings,
) -> Summary {
  let places = count_by_place(records, &settings.normalizer);
  let operators = count_by_field(records, Field::RegisteredBy);
  let today = now.with_timezone(&settings.offset).date_naive();

  Summary {
    generated_at:    now,
    total:           records.len(),
    distinct_cities: places.len(),
    last_registered: records.last().map(|r| r.full_name.clone()),
    today:           count_on_date(records, today, settings.offset),
    last_8_days:     count_in_window(records, now, 8),
    last_30_days:    count_in_window(records, now, 30),
    goal:            settings.goal,
    progress:        progress_fraction(records.len(), settings.goal),
    leaderboard:     top_n(&operators, settings.leaderboard_size),
    by_city:         top_n(&places, settings.leaderboard_size),
  }
}
