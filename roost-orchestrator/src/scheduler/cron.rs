//! Cron expression handling
//!
//! External input is the classic 5-field form (minute hour day month
//! weekday). Fields are pre-validated here with specific errors before the
//! expression is handed to the evaluator, which wants a seconds field and a
//! 1-7 weekday numbering.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CronError {
    #[error("cron expression must have 5 fields, got {0}")]
    WrongFieldCount(usize),
    #[error("invalid step value in {field}: {value}")]
    InvalidStep { field: &'static str, value: String },
    #[error("invalid {field} value: {value} (must be {min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("unparseable cron expression: {0}")]
    Unparseable(String),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Per-position field names and inclusive value bounds.
const FIELDS: [(&str, i64, i64); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day", 1, 31),
    ("month", 1, 12),
    ("day_of_week", 0, 6),
];

/// Validates a 5-field cron expression.
///
/// `*` is always valid, `*/n` requires n >= 1, and bare numerics are checked
/// against their per-position bound. Ranges and comma lists are accepted here
/// and bound-checked by the evaluator.
pub fn validate_expression(expr: &str) -> Result<(), CronError> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(CronError::WrongFieldCount(parts.len()));
    }

    for (part, (field, min, max)) in parts.iter().zip(FIELDS) {
        if *part == "*" {
            continue;
        }

        if let Some(step) = part.strip_prefix("*/") {
            match step.parse::<i64>() {
                Ok(n) if n >= 1 => {}
                _ => {
                    return Err(CronError::InvalidStep {
                        field,
                        value: (*part).to_string(),
                    });
                }
            }
            continue;
        }

        if let Ok(value) = part.parse::<i64>()
            && (value < min || value > max)
        {
            return Err(CronError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
    }

    Ok(())
}

/// Parses a validated 5-field expression into an evaluator schedule.
pub fn parse_schedule(expr: &str) -> Result<Schedule, CronError> {
    validate_expression(expr)?;

    let parts: Vec<&str> = expr.split_whitespace().collect();
    // Seconds pinned to 0, weekday renumbered for the evaluator.
    let six_field = format!(
        "0 {} {} {} {} {}",
        parts[0],
        parts[1],
        parts[2],
        parts[3],
        rewrite_day_of_week(parts[4]),
    );

    Schedule::from_str(&six_field).map_err(|e| CronError::Unparseable(e.to_string()))
}

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, CronError> {
    name.parse::<Tz>()
        .map_err(|_| CronError::InvalidTimezone(name.to_string()))
}

/// Next occurrence of `schedule` in `tz` strictly after `after`, as UTC.
pub fn next_occurrence(
    schedule: &Schedule,
    tz: Tz,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(&tz))
        .next()
        .map(|t| t.with_timezone(&Utc))
}

/// External weekday numbering is 0-6 with Sunday = 0; the evaluator expects
/// 1-7. Shifts bare numbers and numeric range endpoints, leaving `*`, names,
/// and step suffixes alone.
fn rewrite_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };

            let shifted = if let Some((a, b)) = range.split_once('-') {
                match (a.parse::<u8>(), b.parse::<u8>()) {
                    (Ok(a), Ok(b)) => format!("{}-{}", a + 1, b + 1),
                    _ => range.to_string(),
                }
            } else if let Ok(n) = range.parse::<u8>() {
                (n + 1).to_string()
            } else {
                range.to_string()
            };

            match step {
                Some(step) => format!("{}/{}", shifted, step),
                None => shifted,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_validate_accepts_common_forms() {
        assert!(validate_expression("* * * * *").is_ok());
        assert!(validate_expression("0 9 * * *").is_ok());
        assert!(validate_expression("*/5 * * * *").is_ok());
        assert!(validate_expression("0 9 1 1 0").is_ok());
        // Ranges and lists are delegated to the evaluator.
        assert!(validate_expression("0-30 9,17 * * 1-5").is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_field_count() {
        assert_eq!(
            validate_expression("0 9 * *"),
            Err(CronError::WrongFieldCount(4))
        );
        assert_eq!(
            validate_expression("0 0 9 * * *"),
            Err(CronError::WrongFieldCount(6))
        );
        assert_eq!(validate_expression(""), Err(CronError::WrongFieldCount(0)));
    }

    #[test]
    fn test_field_count_error_is_distinct_from_range_error() {
        let count_err = validate_expression("0 9 * *").unwrap_err();
        let range_err = validate_expression("99 9 * * *").unwrap_err();
        assert!(count_err.to_string().contains("5 fields"));
        assert!(range_err.to_string().contains("must be 0-59"));
        assert_ne!(count_err.to_string(), range_err.to_string());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        assert_eq!(
            validate_expression("60 * * * *"),
            Err(CronError::OutOfRange {
                field: "minute",
                value: 60,
                min: 0,
                max: 59
            })
        );
        assert_eq!(
            validate_expression("* 24 * * *"),
            Err(CronError::OutOfRange {
                field: "hour",
                value: 24,
                min: 0,
                max: 23
            })
        );
        assert_eq!(
            validate_expression("* * 0 * *"),
            Err(CronError::OutOfRange {
                field: "day",
                value: 0,
                min: 1,
                max: 31
            })
        );
        assert_eq!(
            validate_expression("* * * 13 *"),
            Err(CronError::OutOfRange {
                field: "month",
                value: 13,
                min: 1,
                max: 12
            })
        );
        assert_eq!(
            validate_expression("* * * * 7"),
            Err(CronError::OutOfRange {
                field: "day_of_week",
                value: 7,
                min: 0,
                max: 6
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_steps() {
        assert!(matches!(
            validate_expression("*/0 * * * *"),
            Err(CronError::InvalidStep { field: "minute", .. })
        ));
        assert!(matches!(
            validate_expression("*/x * * * *"),
            Err(CronError::InvalidStep { field: "minute", .. })
        ));
    }

    #[test]
    fn test_rewrite_day_of_week() {
        assert_eq!(rewrite_day_of_week("*"), "*");
        assert_eq!(rewrite_day_of_week("0"), "1");
        assert_eq!(rewrite_day_of_week("6"), "7");
        assert_eq!(rewrite_day_of_week("1-5"), "2-6");
        assert_eq!(rewrite_day_of_week("0,6"), "1,7");
        assert_eq!(rewrite_day_of_week("1-5/2"), "2-6/2");
        assert_eq!(rewrite_day_of_week("MON"), "MON");
    }

    #[test]
    fn test_parse_schedule_daily() {
        let schedule = parse_schedule("0 9 * * *").unwrap();
        let tz = parse_timezone("UTC").unwrap();
        let next = next_occurrence(&schedule, tz, Utc::now()).unwrap();
        assert!(next > Utc::now());
    }

    #[test]
    fn test_parse_schedule_weekday_semantics() {
        use chrono::Weekday;

        // External 1 means Monday.
        let schedule = parse_schedule("0 9 * * 1").unwrap();
        let tz = parse_timezone("UTC").unwrap();
        let next = next_occurrence(&schedule, tz, Utc::now()).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);

        // External 0 means Sunday.
        let schedule = parse_schedule("0 9 * * 0").unwrap();
        let next = next_occurrence(&schedule, tz, Utc::now()).unwrap();
        assert_eq!(next.weekday(), Weekday::Sun);

        // External 5 means Friday.
        let schedule = parse_schedule("0 9 * * 5").unwrap();
        let next = next_occurrence(&schedule, tz, Utc::now()).unwrap();
        assert_eq!(next.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_parse_schedule_respects_timezone() {
        let schedule = parse_schedule("30 8 * * *").unwrap();
        let tz = parse_timezone("America/New_York").unwrap();
        let next = next_occurrence(&schedule, tz, Utc::now()).unwrap();

        let local = next.with_timezone(&tz);
        use chrono::Timelike;
        assert_eq!(local.hour(), 8);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn test_parse_timezone_rejects_unknown_name() {
        assert_eq!(
            parse_timezone("Mars/Olympus"),
            Err(CronError::InvalidTimezone("Mars/Olympus".to_string()))
        );
    }
}
