use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeDelta};

use crate::{api::octopus::TariffData, quantity::UnitRate};

/// Length of one pricing period, in seconds.
const PERIOD_SECONDS: i64 = 1800;

/// Truncate a timestamp down to the start of the half-hour period containing it.
pub fn period_start(at: DateTime<Local>) -> DateTime<Local> {
    let seconds = at.timestamp().div_euclid(PERIOD_SECONDS) * PERIOD_SECONDS;
    (DateTime::UNIX_EPOCH + TimeDelta::seconds(seconds)).with_timezone(&Local)
}

/// Time-ordered view of the half-hourly unit rates from the latest snapshot.
///
/// This is derived from the raw payload on each query and never stored on
/// its own.
#[derive(Debug, Default)]
pub struct PriceSchedule(BTreeMap<DateTime<Local>, UnitRate>);

impl From<&TariffData> for PriceSchedule {
    /// Entries are deduplicated by period start (last write wins) and come
    /// out sorted strictly ascending.
    fn from(data: &TariffData) -> Self {
        data.results.iter().map(|entry| (entry.valid_from, entry.value_inc_vat)).collect()
    }
}

impl FromIterator<(DateTime<Local>, UnitRate)> for PriceSchedule {
    fn from_iter<I: IntoIterator<Item = (DateTime<Local>, UnitRate)>>(into_iter: I) -> Self {
        Self(into_iter.into_iter().collect())
    }
}

impl PriceSchedule {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Price for the half-hour period containing `now`, if known.
    #[must_use]
    pub fn current_rate(&self, now: DateTime<Local>) -> Option<UnitRate> {
        self.0.get(&period_start(now)).copied()
    }

    /// True when the schedule is empty or runs out within the next 7 hours.
    ///
    /// Octopus publish the next day's rates in the late afternoon and the
    /// known data ends around 23:00, so this starts returning true at about
    /// 16:00 and a refetch then picks the new rates up promptly.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Local>) -> bool {
        self.0.keys().next_back().is_none_or(|last| *last - now < TimeDelta::hours(7))
    }

    /// Periods from the current half-hour boundary onward, in time order.
    ///
    /// A cached snapshot keeps past periods around; this is the view the
    /// decision rules see, so stale history never enters their windows.
    pub fn upcoming(
        &self,
        now: DateTime<Local>,
    ) -> impl Iterator<Item = (DateTime<Local>, UnitRate)> + '_ {
        self.0.range(period_start(now)..).map(|(start, rate)| (*start, *rate))
    }
}
