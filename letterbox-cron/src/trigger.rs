//! When a job fires.

use crate::error::{CronError, CronResult};
use crate::expression::CronExpression;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format accepted for local one-shot run times.
pub const RUN_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Trigger kind as shown to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Once,
    Cron,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Once => "once",
            TriggerKind::Cron => "cron",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job trigger.
///
/// Cron fields are kept as text and evaluated against wall-clock time in
/// `timezone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fire once at `run_at`.
    Once { run_at: DateTime<Utc>, timezone: Tz },

    /// Fire on every match of the five fields.
    Cron {
        minute: String,
        hour: String,
        day: String,
        month: String,
        day_of_week: String,
        timezone: Tz,
    },
}

impl Trigger {
    /// One-shot trigger at an absolute instant.
    pub fn once(run_at: DateTime<Utc>, timezone: Tz) -> Self {
        Trigger::Once { run_at, timezone }
    }

    /// One-shot trigger from a local `YYYY-MM-DD HH:MM` string.
    ///
    /// Times in the past are accepted. A wall-clock time skipped by a DST
    /// transition is rejected; an ambiguous one resolves to the earlier instant.
    pub fn once_local(run_at: &str, timezone: Tz) -> CronResult<Self> {
        let naive = NaiveDateTime::parse_from_str(run_at.trim(), RUN_AT_FORMAT).map_err(|e| {
            CronError::InvalidRunAt(format!("{:?}: expected YYYY-MM-DD HH:MM ({})", run_at, e))
        })?;

        let local = timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                CronError::InvalidRunAt(format!("{:?} does not exist in {}", run_at, timezone))
            })?;

        Ok(Self::once(local.with_timezone(&Utc), timezone))
    }

    /// Recurring trigger from a five-field expression.
    pub fn cron(expression: &str, timezone: Tz) -> CronResult<Self> {
        let parsed = CronExpression::parse(expression)?;
        let fields = parsed.fields();
        Ok(Trigger::Cron {
            minute: fields[0].to_string(),
            hour: fields[1].to_string(),
            day: fields[2].to_string(),
            month: fields[3].to_string(),
            day_of_week: fields[4].to_string(),
            timezone,
        })
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Once { .. } => TriggerKind::Once,
            Trigger::Cron { .. } => TriggerKind::Cron,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Trigger::Cron { .. })
    }

    pub fn timezone(&self) -> Tz {
        match self {
            Trigger::Once { timezone, .. } | Trigger::Cron { timezone, .. } => *timezone,
        }
    }

    /// Parsed expression of a cron trigger.
    pub fn expression(&self) -> CronResult<Option<CronExpression>> {
        match self {
            Trigger::Once { .. } => Ok(None),
            Trigger::Cron {
                minute,
                hour,
                day,
                month,
                day_of_week,
                ..
            } => CronExpression::from_fields(minute, hour, day, month, day_of_week).map(Some),
        }
    }

    /// Next fire time after `after`.
    ///
    /// A one-shot trigger always reports its run time, past or not.
    /// `None` means the trigger can never fire again.
    pub fn next_fire(&self, after: DateTime<Utc>) -> CronResult<Option<DateTime<Utc>>> {
        match self {
            Trigger::Once { run_at, .. } => Ok(Some(*run_at)),
            Trigger::Cron { timezone, .. } => Ok(self
                .expression()?
                .and_then(|expr| expr.next_in(after, *timezone))),
        }
    }

    /// Human readable description.
    pub fn describe(&self) -> String {
        match self {
            Trigger::Once { run_at, timezone } => format!(
                "once at {} ({})",
                run_at.with_timezone(timezone).format(RUN_AT_FORMAT),
                timezone
            ),
            Trigger::Cron {
                minute,
                hour,
                day,
                month,
                day_of_week,
                timezone,
            } => format!(
                "cron \"{} {} {} {} {}\" ({})",
                minute, hour, day, month, day_of_week, timezone
            ),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Taipei;

    #[test]
    fn test_once_local_converts_to_utc() {
        let trigger = Trigger::once_local("2026-10-20 09:30", Taipei).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 10, 20, 1, 30, 0).unwrap();
        assert_eq!(trigger.next_fire(Utc::now()).unwrap(), Some(expected));
        assert_eq!(trigger.kind(), TriggerKind::Once);
        assert!(!trigger.is_recurring());
    }

    #[test]
    fn test_once_local_past_is_accepted() {
        let trigger = Trigger::once_local("2001-01-01 00:00", Taipei).unwrap();
        let next = trigger.next_fire(Utc::now()).unwrap().unwrap();
        assert!(next < Utc::now());
    }

    #[test]
    fn test_once_local_rejects_bad_format() {
        for input in ["2026-10-20", "2026-10-20T09:30", "tomorrow", "2026-13-01 10:00"] {
            let err = Trigger::once_local(input, Taipei).unwrap_err();
            assert!(matches!(err, CronError::InvalidRunAt(_)), "{input}");
        }
    }

    #[test]
    fn test_once_local_rejects_dst_gap() {
        // 02:30 does not exist in New York on 2026-03-08
        let err = Trigger::once_local("2026-03-08 02:30", chrono_tz::America::New_York);
        assert!(matches!(err, Err(CronError::InvalidRunAt(_))));
    }

    #[test]
    fn test_cron_trigger_keeps_fields() {
        let trigger = Trigger::cron("0 9 * * 1", Taipei).unwrap();
        match &trigger {
            Trigger::Cron {
                minute,
                hour,
                day_of_week,
                ..
            } => {
                assert_eq!(minute, "0");
                assert_eq!(hour, "9");
                assert_eq!(day_of_week, "1");
            }
            other => panic!("unexpected trigger {:?}", other),
        }
        assert_eq!(trigger.describe(), "cron \"0 9 * * 1\" (Asia/Taipei)");
    }

    #[test]
    fn test_cron_next_fire_monday() {
        let trigger = Trigger::cron("0 9 * * 1", Taipei).unwrap();
        let after = Taipei
            .with_ymd_and_hms(2026, 10, 14, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next = trigger.next_fire(after).unwrap().unwrap();
        assert_eq!(
            next.with_timezone(&Taipei).format(RUN_AT_FORMAT).to_string(),
            "2026-10-19 09:00"
        );
    }

    #[test]
    fn test_serde_shape() {
        let trigger = Trigger::cron("*/5 * * * *", Taipei).unwrap();
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["kind"], "cron");
        assert_eq!(json["timezone"], "Asia/Taipei");

        let back: Trigger = serde_json::from_value(json).unwrap();
        assert_eq!(back, trigger);
    }
}
