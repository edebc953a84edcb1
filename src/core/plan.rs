use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeDelta, Timelike};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::schedule::{PriceSchedule, period_start},
    prelude::*,
    quantity::UnitRate,
    store::{Key, Store},
};

/// Overnight charging commitment: the cheapest upcoming half-hour periods,
/// chosen once per evening and then reused for the rest of the night so
/// that the charging windows don't flip-flop as refetched prices shift.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheapSlotPlan {
    pub updated_at: Option<DateTime<Local>>,
    pub slots: BTreeMap<DateTime<Local>, UnitRate>,
}

impl CheapSlotPlan {
    /// Load the plan from the snapshot store.
    ///
    /// An absent or unreadable plan degrades to an empty one.
    pub fn load(store: &impl Store) -> Self {
        store
            .load(Key::CheapSlotData)
            .unwrap_or_else(|error| {
                warn!("failed to load the cheap-slot plan: {error:#}");
                None
            })
            .unwrap_or_default()
    }

    pub fn save(&self, store: &impl Store) -> Result {
        store.save(Key::CheapSlotData, self)
    }

    /// Whether the plan should be recomputed now.
    ///
    /// At most once per evening: only from the trigger hour on, and only
    /// when the previous update is older than the refresh interval.
    #[must_use]
    pub fn refresh_due(
        &self,
        now: DateTime<Local>,
        trigger_hour: u32,
        refresh_interval: TimeDelta,
    ) -> bool {
        now.hour() >= trigger_hour
            && self.updated_at.is_none_or(|updated_at| now - updated_at > refresh_interval)
    }

    /// Commit to the cheapest `slots_required` of the next `window` periods.
    ///
    /// Selection is by price, but the committed slots are kept in period
    /// order. Price ties break towards the earlier period.
    pub fn select(
        schedule: &PriceSchedule,
        now: DateTime<Local>,
        window: usize,
        slots_required: usize,
    ) -> Self {
        let slots: BTreeMap<_, _> = schedule
            .upcoming(now)
            .take(window)
            .sorted_by_key(|(start, rate)| (*rate, *start))
            .take(slots_required)
            .collect();
        Self { updated_at: Some(now), slots }
    }

    /// True when `now` falls inside one of the committed charging periods.
    #[must_use]
    pub fn contains(&self, now: DateTime<Local>) -> bool {
        self.slots.contains_key(&period_start(now))
    }
}
