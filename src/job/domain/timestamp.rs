//! Canonical timestamp rendering and saturating time arithmetic.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Renders a timestamp in the single canonical ISO-8601 UTC form.
///
/// Within years 0000 to 9999 plain string comparison of this form orders
/// instants chronologically. Later years render with a leading `+`, so
/// indexes order on [`DateTime`] values and keep this form for display.
#[must_use]
pub fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Converts whole seconds into a [`TimeDelta`], saturating at the maximum
/// representable span.
#[must_use]
pub fn seconds(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// Converts whole minutes into a [`TimeDelta`], saturating at the maximum
/// representable span.
#[must_use]
pub fn minutes(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .unwrap_or(TimeDelta::MAX)
}

/// Adds `delta` to `at`, clamping to the latest representable instant.
#[must_use]
pub fn after(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Subtracts `delta` from `at`, clamping to the earliest representable
/// instant.
#[must_use]
pub fn before(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_sub_signed(delta)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
