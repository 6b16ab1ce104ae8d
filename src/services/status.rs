use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::entities::{fish_batch, stocking_event};

/// Lifecycle state of a stocking event. Never persisted; derived on every
/// read from the stored timestamps, batch review data and signatures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StockingStatus {
    Canceled,
    Inspected,
    Finished,
    Ongoing,
    Upcoming,
    NotFinished,
}

/// Tunable durations read from the settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockingSettings {
    /// Minimum lead time in days between registration and the event date.
    pub min_time_till_stocking: i32,
    /// Days after the event date during which review edits remain possible.
    pub max_time_for_registration: i32,
}

/// Start of the calendar day containing `t`, in UTC.
pub fn day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&t.date_naive().and_time(NaiveTime::MIN))
}

/// An event is fully reviewed once every batch has `review_amount`
/// populated. Zero counts as reviewed. An event with no batches is
/// vacuously fully reviewed, but registration requires at least one batch,
/// so that case never arises for events created through the service.
pub fn is_fully_reviewed(batches: &[fish_batch::Model]) -> bool {
    batches.iter().all(|b| b.is_reviewed())
}

/// Derives the lifecycle status of a stocking event.
///
/// First match wins; the ordering encodes priority, not chronology, and
/// later branches are reachable only when earlier ones are false:
///
/// 1. CANCELED: canceled_at is set (terminal)
/// 2. INSPECTED: fully reviewed and countersigned
/// 3. FINISHED: fully reviewed, no signatures yet
/// 4. ONGOING: inside the stocking window, not fully reviewed
/// 5. UPCOMING: before the event day, not fully reviewed
/// 6. NOT_FINISHED: stocking window passed without a full review
///
/// The stocking window opens at the start of the event's calendar day and
/// closes at the end of the day `max_time_for_registration` days later; all
/// comparisons are strict, so `now` landing exactly on a day boundary
/// matches no branch and yields `None`. That cannot happen for any event
/// registered through the service and is logged by callers as an error.
pub fn derive_status(
    event: &stocking_event::Model,
    batches: &[fish_batch::Model],
    settings: &StockingSettings,
    now: DateTime<Utc>,
) -> Option<StockingStatus> {
    if event.canceled_at.is_some() {
        return Some(StockingStatus::Canceled);
    }

    let fully_reviewed = is_fully_reviewed(batches);
    if fully_reviewed {
        if event.has_signatures() {
            return Some(StockingStatus::Inspected);
        }
        return Some(StockingStatus::Finished);
    }

    let event_day_start = day_start(event.event_time);
    // End of the last review day, expressed as the start of the following day.
    let window_end = event_day_start + Duration::days(i64::from(settings.max_time_for_registration) + 1);

    if now > event_day_start && now < window_end {
        return Some(StockingStatus::Ongoing);
    }
    if now < event_day_start {
        return Some(StockingStatus::Upcoming);
    }
    if now > window_end {
        return Some(StockingStatus::NotFinished);
    }

    None
}

/// Number of whole calendar days from the day containing `now` to the day
/// containing `event_time`. Negative when the event day is in the past.
pub fn days_until_event(now: DateTime<Utc>, event_time: DateTime<Utc>) -> i64 {
    (event_time.date_naive() - now.date_naive()).num_days()
}
