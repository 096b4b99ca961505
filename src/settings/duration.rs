use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,
    #[error("invalid number in duration {0:?}")]
    InvalidNumber(String),
    #[error("unknown duration unit {0:?}")]
    UnknownUnit(String),
    #[error("duration {0:?} must be positive")]
    NotPositive(String),
}

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

fn unit_millis(unit: &str) -> Option<f64> {
    let millis = match unit {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(millis)
}

/// Parses compact durations such as `15m`, `30d`, `2h`, `45s`, `500ms`,
/// `1w` or `1.5h`. A bare number is taken as milliseconds. Units are case
/// insensitive and may be separated from the number by spaces.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(input.to_string()))?;
    let per_unit = unit_millis(&unit.trim().to_ascii_lowercase())
        .ok_or_else(|| DurationParseError::UnknownUnit(unit.trim().to_string()))?;

    let millis = (value * per_unit).round();
    if !millis.is_finite() || millis <= 0.0 {
        return Err(DurationParseError::NotPositive(input.to_string()));
    }
    Ok(Duration::from_millis(millis as u64))
}
