//! Five-field cron expression parsing and evaluation.

use crate::error::{CronError, CronResult};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;

/// Number of fields in an expression: minute, hour, day, month, day-of-week.
pub const FIELD_COUNT: usize = 5;

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Parsed cron expression.
#[derive(Debug, Clone)]
pub struct CronExpression {
    schedule: Schedule,
    expression: String,
}

impl CronExpression {
    /// Parse a standard five-field cron expression.
    ///
    /// Fields:
    /// - Minute (0-59)
    /// - Hour (0-23)
    /// - Day of month (1-31)
    /// - Month (1-12 or JAN-DEC)
    /// - Day of week (0-7 or SUN-SAT, Sunday = 0 or 7)
    ///
    /// # Examples
    ///
    /// ```
    /// use letterbox_cron::CronExpression;
    ///
    /// // Every day at 08:00
    /// let expr = CronExpression::parse("0 8 * * *").unwrap();
    ///
    /// // Every Monday at 9 AM
    /// let expr = CronExpression::parse("0 9 * * 1").unwrap();
    ///
    /// // Seconds are not part of the syntax
    /// assert!(CronExpression::parse("0 0 9 * * 1").is_err());
    /// ```
    pub fn parse(expression: &str) -> CronResult<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(CronError::InvalidExpression(format!(
                "{:?}: expected {} fields (minute hour day month day-of-week), found {}",
                expression,
                FIELD_COUNT,
                fields.len()
            )));
        }

        // The `cron` crate wants a leading seconds field and numbers weekdays from 1 = Sunday.
        let day_of_week = normalize_day_of_week(fields[4])?;
        let extended = format!(
            "0 {} {} {} {} {}",
            fields[0], fields[1], fields[2], fields[3], day_of_week
        );

        let schedule = Schedule::from_str(&extended)
            .map_err(|e| CronError::InvalidExpression(format!("{:?}: {}", expression, e)))?;

        Ok(Self {
            schedule,
            expression: fields.join(" "),
        })
    }

    /// Build from individual fields.
    pub fn from_fields(
        minute: &str,
        hour: &str,
        day: &str,
        month: &str,
        day_of_week: &str,
    ) -> CronResult<Self> {
        Self::parse(&format!(
            "{} {} {} {} {}",
            minute, hour, day, month, day_of_week
        ))
    }

    /// The five fields in order.
    pub fn fields(&self) -> Vec<&str> {
        self.expression.split(' ').collect()
    }

    /// Next occurrence strictly after `after`, evaluated in `after`'s timezone.
    pub fn next_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Z>> {
        self.schedule.after(after).next()
    }

    /// Next occurrence after `after`, with wall-clock fields read in `tz`.
    pub fn next_in(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        self.next_after(&after.with_timezone(&tz))
            .map(|next| next.with_timezone(&Utc))
    }

    /// Get the expression string.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl std::fmt::Display for CronExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Rewrite numeric weekdays (0-7, Sunday = 0 or 7) as names.
fn normalize_day_of_week(field: &str) -> CronResult<String> {
    let items = field
        .split(',')
        .map(normalize_day_item)
        .collect::<CronResult<Vec<_>>>()?;
    Ok(items.join(","))
}

fn normalize_day_item(item: &str) -> CronResult<String> {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };

    let base = match base.split_once('-') {
        Some((start, end)) => {
            let (s, e) = (day_number(start)?, day_number(end)?);
            match (s, e, step) {
                (Some(7), Some(7), _) => "SUN".to_string(),
                (Some(0), Some(7), _) => "SUN-SAT".to_string(),
                // Sunday as 7 ends the range, so it can only be hit by the step.
                (Some(s), Some(7), Some(step)) => return stepped_days(s, step),
                (Some(s), Some(7), None) => format!("{}-SAT,SUN", day_name(s)),
                _ => format!("{}-{}", day_token(start, s), day_token(end, e)),
            }
        }
        None => day_token(base, day_number(base)?),
    };

    Ok(match step {
        Some(step) => format!("{}/{}", base, step),
        None => base,
    })
}

/// Expand `start-7/step` into an explicit day list.
fn stepped_days(start: usize, step: &str) -> CronResult<String> {
    let step = match step.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(CronError::InvalidExpression(format!(
                "day-of-week step {:?} is not a positive number",
                step
            )));
        }
    };
    Ok((start..=7)
        .step_by(step)
        .map(day_name)
        .collect::<Vec<_>>()
        .join(","))
}

fn day_number(token: &str) -> CronResult<Option<usize>> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    match token.parse::<usize>() {
        Ok(n) if n <= 7 => Ok(Some(n)),
        _ => Err(CronError::InvalidExpression(format!(
            "day-of-week {:?} out of range 0-7",
            token
        ))),
    }
}

fn day_name(n: usize) -> &'static str {
    DAY_NAMES[n % 7]
}

fn day_token(token: &str, number: Option<usize>) -> String {
    match number {
        Some(n) => day_name(n).to_string(),
        None => token.to_uppercase(),
    }
}

/// Common five-field presets.
pub struct CronPresets;

impl CronPresets {
    /// Every minute
    pub const EVERY_MINUTE: &'static str = "* * * * *";

    /// Every 15 minutes
    pub const EVERY_15_MINUTES: &'static str = "*/15 * * * *";

    /// Every hour on the hour
    pub const EVERY_HOUR: &'static str = "0 * * * *";

    /// Every day at 08:00
    pub const DAILY_8AM: &'static str = "0 8 * * *";

    /// Every weekday (Monday-Friday) at 9 AM
    pub const WEEKDAYS_9AM: &'static str = "0 9 * * 1-5";

    /// Every Monday at 9 AM
    pub const MONDAYS_9AM: &'static str = "0 9 * * 1";

    /// First of the month at midnight
    pub const MONTHLY: &'static str = "0 0 1 * *";
}
