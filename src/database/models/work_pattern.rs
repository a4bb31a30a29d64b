use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named shift template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkPattern {
    pub id: Uuid,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPatternInput {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i64,
}

impl WorkPattern {
    /// On-time start and end for a shift starting on `date`. A pattern whose
    /// end is not after its start finishes on the following day.
    pub fn span_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start_time);
        let mut end = date.and_time(self.end_time);
        if end <= start {
            end += Duration::days(1);
        }
        (start, end)
    }

    /// Like [`span_on`](Self::span_on), shrunk by a partial-day leave rate.
    /// Positive rates push the start later, negative rates pull the end earlier.
    pub fn effective_span_on(
        &self,
        date: NaiveDate,
        leave_rate: Option<f64>,
    ) -> (NaiveDateTime, NaiveDateTime) {
        let (start, end) = self.span_on(date);
        let Some(rate) = leave_rate else {
            return (start, end);
        };

        let absent_seconds = ((end - start).num_seconds() as f64 * rate.abs()).round() as i64;
        let absent = Duration::seconds(absent_seconds);
        if rate > 0.0 {
            (start + absent, end)
        } else if rate < 0.0 {
            (start, end - absent)
        } else {
            (start, end)
        }
    }
}
