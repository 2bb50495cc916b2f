// src/engine/availability.rs

use chrono::{DateTime, NaiveTime, Utc};

use crate::models::quiz::Quiz;

/// Why a duration string could not be interpreted.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("duration must be formatted as HH:MM")]
    Malformed,
    #[error("duration must be greater than zero")]
    Zero,
}

/// Parses a "HH:MM" duration into total minutes.
///
/// Hours may exceed 24; minutes must stay below 60. A zero duration is
/// rejected, since such a quiz could never be attempted.
pub fn parse_duration(value: &str) -> Result<u32, DurationError> {
    let (hours, minutes) = value.split_once(':').ok_or(DurationError::Malformed)?;
    let hours: u32 = hours.parse().map_err(|_| DurationError::Malformed)?;
    let minutes: u32 = minutes.parse().map_err(|_| DurationError::Malformed)?;
    if minutes >= 60 {
        return Err(DurationError::Malformed);
    }

    let total = hours * 60 + minutes;
    if total == 0 {
        return Err(DurationError::Zero);
    }
    Ok(total)
}

/// The admission window on the scheduled date: opens at midnight, closes
/// `duration` minutes later.
///
/// The closing time wraps modulo 24 hours but stays anchored to the single
/// scheduled date, so a duration of "25:30" closes at 01:30 on the same
/// date, not the next. Counter-intuitive, but it is the shipped policy.
pub fn window(duration: &str) -> Result<(NaiveTime, NaiveTime), DurationError> {
    let minutes = parse_duration(duration)?;
    // NaiveTime arithmetic wraps around midnight, which is exactly the
    // modulo-24h behavior the policy calls for.
    let closes = NaiveTime::MIN + chrono::Duration::minutes(i64::from(minutes));
    Ok((NaiveTime::MIN, closes))
}

/// "00:00 - 01:30" style label for the admission window.
pub fn window_label(duration: &str) -> Result<String, DurationError> {
    let (opens, closes) = window(duration)?;
    Ok(format!(
        "{} - {}",
        opens.format("%H:%M"),
        closes.format("%H:%M")
    ))
}

/// Whether `quiz` is admitting attempts at instant `now`.
///
/// False on any date other than the scheduled one. On the scheduled date
/// the window is inclusive at the closing instant: exactly the closing
/// time is still open, one second past it is closed. A quiz whose stored
/// duration does not parse is never open.
pub fn is_open(quiz: &Quiz, now: DateTime<Utc>) -> bool {
    if now.date_naive() != quiz.date_of_quiz {
        return false;
    }

    match window(&quiz.time_duration) {
        Ok((_, closes)) => now.time() <= closes,
        Err(_) => false,
    }
}
