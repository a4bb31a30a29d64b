use std::{collections::HashMap, time::Duration as StdDuration};

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{
    models::{Record, WorkPattern},
    repositories::{
        record as record_repo, schedule as schedule_repo, user as user_repo,
        work_pattern as work_pattern_repo,
    },
};
use crate::error::AppError;

/// Longest range one attendance query may cover.
const MAX_RANGE_DAYS: i64 = 366;

/// One user-day as downstream reporting sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub work_pattern_id: Option<Uuid>,
    pub is_working_day: bool,
    pub is_holiday: bool,
    pub leave_rate: Option<f64>,
    pub apply_id: Option<Uuid>,
    pub on_time_start: Option<NaiveDateTime>,
    pub on_time_end: Option<NaiveDateTime>,
    pub break_minutes: Option<i64>,
    pub clockin: Option<NaiveDateTime>,
    pub stepout: Option<NaiveDateTime>,
    pub reenter: Option<NaiveDateTime>,
    pub clockout: Option<NaiveDateTime>,
    /// Positive when the user clocked in early, negative when late.
    pub start_delta_minutes: Option<i64>,
    /// Positive when the user clocked out late, negative when early.
    pub end_delta_minutes: Option<i64>,
    pub worked_minutes: Option<i64>,
}

/// Everything resolved for a day before arithmetic.
#[derive(Debug, Clone, Default)]
pub struct DayInputs<'a> {
    pub pattern: Option<&'a WorkPattern>,
    pub leave_rate: Option<f64>,
    pub break_override: Option<i64>,
    pub apply_id: Option<Uuid>,
    pub is_holiday: bool,
    pub record: Option<&'a Record>,
}

fn truncate_to_second(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::nanoseconds(i64::from(t.nanosecond()))
}

fn floor_to(t: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    let step = i64::from(minutes) * 60;
    let t = truncate_to_second(t);
    t - Duration::seconds(i64::from(t.num_seconds_from_midnight()) % step)
}

/// Round up to the next `minutes` boundary of the day.
pub fn round_up(t: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    if minutes == 0 {
        return t;
    }
    let floor = floor_to(t, minutes);
    if floor == t {
        t
    } else {
        floor + Duration::minutes(i64::from(minutes))
    }
}

/// Round down to the previous `minutes` boundary of the day.
pub fn round_down(t: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    if minutes == 0 {
        return t;
    }
    floor_to(t, minutes)
}

/// Arrivals round up and departures round down.
pub fn compute_day(
    date: NaiveDate,
    inputs: &DayInputs<'_>,
    rounding: Option<u32>,
) -> DailyAttendance {
    let up = |t: Option<NaiveDateTime>| match rounding {
        Some(minutes) => t.map(|t| round_up(t, minutes)),
        None => t,
    };
    let down = |t: Option<NaiveDateTime>| match rounding {
        Some(minutes) => t.map(|t| round_down(t, minutes)),
        None => t,
    };

    let record = inputs.record;
    let clockin = up(record.and_then(|r| r.clockin));
    let stepout = down(record.and_then(|r| r.stepout));
    let reenter = up(record.and_then(|r| r.reenter));
    let clockout = down(record.and_then(|r| r.clockout));

    let span = inputs
        .pattern
        .map(|pattern| pattern.effective_span_on(date, inputs.leave_rate));
    let on_time_start = span.map(|(start, _)| start);
    let on_time_end = span.map(|(_, end)| end);
    let break_minutes = inputs
        .break_override
        .or(inputs.pattern.map(|pattern| pattern.break_minutes));

    let start_delta_minutes = on_time_start
        .zip(clockin)
        .map(|(start, clockin)| (start - clockin).num_minutes());
    let end_delta_minutes = on_time_end
        .zip(clockout)
        .map(|(end, clockout)| (clockout - end).num_minutes());

    let worked_minutes = clockin.zip(clockout).map(|(clockin, clockout)| {
        let break_taken = match (stepout, reenter) {
            (Some(stepout), Some(reenter)) if reenter > stepout => {
                (reenter - stepout).num_minutes()
            }
            _ => break_minutes.unwrap_or(0),
        };
        ((clockout - clockin).num_minutes() - break_taken).max(0)
    });

    DailyAttendance {
        date,
        work_pattern_id: inputs.pattern.map(|pattern| pattern.id),
        is_working_day: inputs.pattern.is_some(),
        is_holiday: inputs.is_holiday,
        leave_rate: inputs.leave_rate,
        apply_id: inputs.apply_id,
        on_time_start,
        on_time_end,
        break_minutes,
        clockin,
        stepout,
        reenter,
        clockout,
        start_delta_minutes,
        end_delta_minutes,
        worked_minutes,
    }
}

/// Read path over posted schedules, calendars and records.
#[derive(Clone)]
pub struct AttendanceService {
    pool: SqlitePool,
    patterns: Cache<Uuid, WorkPattern>,
    rounding: Option<u32>,
}

impl AttendanceService {
    pub fn new(pool: SqlitePool, rounding: Option<u32>) -> Self {
        let patterns = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(StdDuration::from_secs(300))
            .build();

        Self {
            pool,
            patterns,
            rounding,
        }
    }

    async fn work_pattern(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<WorkPattern, AppError> {
        if let Some(pattern) = self.patterns.get(&id).await {
            return Ok(pattern);
        }

        let pattern = work_pattern_repo::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work pattern not found: {}", id)))?;
        self.patterns.insert(id, pattern.clone()).await;

        Ok(pattern)
    }

    pub async fn get_attendance_by_account(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyAttendance>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = user_repo::find_by_account(&mut conn, account)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", account)))?;
        drop(conn);

        self.get_attendance(user.id, from, to).await
    }

    pub async fn get_attendance(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyAttendance>, AppError> {
        if to < from {
            return Err(AppError::BadRequest(format!(
                "Attendance range ends ({}) before it starts ({})",
                to, from
            )));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::BadRequest(format!(
                "Attendance range may cover at most {} days",
                MAX_RANGE_DAYS
            )));
        }

        let mut conn = self.pool.acquire().await?;
        let user = user_repo::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;

        let calendars: HashMap<_, _> =
            schedule_repo::calendars_in_range(&mut conn, user_id, from, to)
                .await?
                .into_iter()
                .map(|calendar| (calendar.date, calendar))
                .collect();
        let schedules: HashMap<_, _> =
            schedule_repo::schedules_in_range(&mut conn, user_id, from, to)
                .await?
                .into_iter()
                .map(|schedule| (schedule.date, schedule))
                .collect();
        let records: HashMap<_, _> = record_repo::records_in_range(&mut conn, user_id, from, to)
            .await?
            .into_iter()
            .map(|record| (record.date, record))
            .collect();
        let holidays: HashMap<_, _> = schedule_repo::holidays_in_range(&mut conn, from, to)
            .await?
            .into_iter()
            .map(|holiday| (holiday.date, holiday))
            .collect();

        let mut days = Vec::new();
        for date in from.iter_days().take_while(|date| *date <= to) {
            let is_holiday = holidays.contains_key(&date);
            let (pattern_id, leave_rate) = match calendars.get(&date) {
                Some(calendar) => (calendar.work_pattern_id, calendar.leave_rate),
                None if is_holiday => (None, None),
                None => (user.default_work_pattern_id, None),
            };

            let pattern = match pattern_id {
                Some(id) => Some(self.work_pattern(&mut conn, id).await?),
                None => None,
            };
            let schedule = schedules.get(&date);

            let inputs = DayInputs {
                pattern: pattern.as_ref(),
                leave_rate,
                break_override: schedule.and_then(|schedule| schedule.break_minutes),
                apply_id: schedule.and_then(|schedule| schedule.apply_id),
                is_holiday,
                record: records.get(&date),
            };
            days.push(compute_day(date, &inputs, self.rounding));
        }

        log::debug!(
            "Computed {} attendance day(s) for user {} from {} to {}",
            days.len(),
            user_id,
            from,
            to
        );

        Ok(days)
    }
}
