use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::{
    core::{plan::CheapSlotPlan, schedule::PriceSchedule},
    prelude::*,
    quantity::UnitRate,
};

/// Tunable thresholds and look-ahead windows for the decision rules.
#[derive(Copy, Clone, Debug)]
pub struct Rules {
    /// Always charge at or below this price, regardless of SOC.
    pub failsafe_rate: UnitRate,

    /// Price above which a period counts as a peak.
    pub peak_rate: UnitRate,

    /// Look-ahead window in half-hour periods.
    pub window: usize,
}

/// Instantaneous instruction for the inverter: recomputed on every run and
/// never persisted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Decision {
    pub charge: bool,
    pub discharge_pct: u32,
}

/// Evaluate the charge and discharge rules for the current half-hour period.
///
/// Missing prices are unknowns: a rule that needs a price it doesn't have
/// simply doesn't fire.
pub fn decide(
    schedule: &PriceSchedule,
    plan: &CheapSlotPlan,
    soc: u32,
    rules: &Rules,
    now: DateTime<Local>,
) -> Decision {
    Decision {
        charge: should_charge(schedule, plan, soc, rules, now),
        discharge_pct: if idle_band(schedule, soc, rules, now).is_some() { 0 } else { 100 },
    }
}

/// The three charge triggers are independent: any of them can turn charging
/// on, none can turn it back off.
fn should_charge(
    schedule: &PriceSchedule,
    plan: &CheapSlotPlan,
    soc: u32,
    rules: &Rules,
    now: DateTime<Local>,
) -> bool {
    let current_rate = schedule.current_rate(now);
    let mut charge = false;

    if plan.contains(now) {
        info!("charging due to the cheap-slot plan");
        charge = true;
    }

    if let Some(rate) = current_rate
        && rate <= rules.failsafe_rate
    {
        info!(%rate, "charging: too cheap not to");
        charge = true;
    }

    // The boost only fires on the approach: once the current price itself
    // reaches the peak threshold, it stays off.
    if soc < 50
        && let Some(rate) = current_rate
        && let Some(upcoming_max) = schedule.upcoming(now).take(3).map(|(_, rate)| rate).max()
        && upcoming_max > rules.peak_rate
        && rate < rules.peak_rate
    {
        warn!(soc, %upcoming_max, "peak approaching, emergency charging");
        charge = true;
    }

    charge
}

/// Nested SOC bands for the idle rule, checked lowest first; at most one
/// fires.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IdleBand {
    Below30,
    Below40,
    Below50,
}

/// Decide whether discharging should be suspended for this period: energy
/// that is cheap enough relative to the night ahead is better bought from
/// the grid than drawn from a low battery.
pub fn idle_band(
    schedule: &PriceSchedule,
    soc: u32,
    rules: &Rules,
    now: DateTime<Local>,
) -> Option<IdleBand> {
    let window = schedule.upcoming(now).take(rules.window).map(|(_, rate)| rate).collect_vec();
    // Don't restrict discharge without at least 3.5 hours of forward visibility.
    if window.len() < 7 {
        return None;
    }
    let current_rate = schedule.current_rate(now)?;

    let sorted = window.into_iter().sorted().collect_vec();
    let cutoff = |fraction: f64| -> Option<UnitRate> {
        #[expect(clippy::cast_possible_truncation)]
        #[expect(clippy::cast_precision_loss)]
        #[expect(clippy::cast_sign_loss)]
        let n = (sorted.len() as f64 * fraction) as usize;
        (n != 0).then(|| sorted[n - 1])
    };

    let band = if soc < 30 && cutoff(0.5).is_some_and(|cutoff| current_rate <= cutoff) {
        Some(IdleBand::Below30)
    } else if soc < 40 && cutoff(0.2).is_some_and(|cutoff| current_rate <= cutoff) {
        Some(IdleBand::Below40)
    } else if soc < 50 && cutoff(0.1).is_some_and(|cutoff| current_rate <= cutoff) {
        Some(IdleBand::Below50)
    } else {
        None
    };
    if let Some(band) = band {
        info!(soc, %current_rate, ?band, "idling to ride out a cheap period");
    }
    band
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn rules() -> Rules {
        Rules {
            failsafe_rate: UnitRate::from(1.0),
            peak_rate: UnitRate::from(15.0),
            window: 20,
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    fn schedule(start: DateTime<Local>, rates: &[f64]) -> PriceSchedule {
        rates
            .iter()
            .enumerate()
            .map(|(n, rate)| {
                #[expect(clippy::cast_possible_wrap)]
                let start = start + TimeDelta::minutes(30 * n as i64);
                (start, UnitRate::from(*rate))
            })
            .collect()
    }

    /// A permutation of 1..=20 with a chosen current price first, so that the
    /// cutoffs are 2.0 (10th), 4.0 (20th) and 10.0 (50th).
    fn permuted(current: f64) -> Vec<f64> {
        let mut rates = vec![current];
        rates.extend((1..=20).map(f64::from).filter(|rate| (*rate - current).abs() > 0.01));
        rates
    }

    #[test]
    fn failsafe_overrides_everything() {
        let now = at(13, 0);
        let schedule = schedule(now, &[1.0, 20.0, 20.0]);
        let decision = decide(&schedule, &CheapSlotPlan::default(), 100, &rules(), now);
        assert!(decision.charge);
    }

    #[test]
    fn no_charge_on_an_empty_schedule() {
        let decision =
            decide(&PriceSchedule::default(), &CheapSlotPlan::default(), 10, &rules(), at(13, 0));
        assert!(!decision.charge);
        assert_eq!(decision.discharge_pct, 100);
    }

    #[test]
    fn planned_slot_triggers_charging() {
        let now = at(22, 0);
        let schedule = schedule(now, &[9.0, 9.0, 9.0]);
        let plan = CheapSlotPlan::select(&schedule, now, 20, 1);
        assert!(decide(&schedule, &plan, 80, &rules(), now).charge);
    }

    #[test]
    fn boost_fires_before_the_peak() {
        let now = at(16, 0);
        let schedule = schedule(now, &[14.0, 16.0, 9.0, 9.0]);
        assert!(decide(&schedule, &CheapSlotPlan::default(), 49, &rules(), now).charge);
    }

    #[test]
    fn boost_does_not_fire_inside_the_peak() {
        let now = at(16, 0);
        // The current price already reached the threshold: preserved quirk,
        // the boost only covers the approach.
        let schedule = schedule(now, &[15.0, 16.0, 9.0, 9.0]);
        assert!(!decide(&schedule, &CheapSlotPlan::default(), 49, &rules(), now).charge);
    }

    #[test]
    fn boost_requires_a_low_soc() {
        let now = at(16, 0);
        let schedule = schedule(now, &[14.0, 16.0, 9.0, 9.0]);
        assert!(!decide(&schedule, &CheapSlotPlan::default(), 50, &rules(), now).charge);
    }

    #[test]
    fn lowest_band_wins_even_when_outer_bands_would_match() {
        let now = at(13, 0);
        // Current price sits exactly at the 50th-percentile cutoff.
        let schedule = schedule(now, &permuted(10.0));
        assert_eq!(idle_band(&schedule, 25, &rules(), now), Some(IdleBand::Below30));
        assert_eq!(decide(&schedule, &CheapSlotPlan::default(), 25, &rules(), now).discharge_pct, 0);
    }

    #[test]
    fn mid_band_matches_the_20th_percentile() {
        let now = at(13, 0);
        let schedule = schedule(now, &permuted(4.0));
        assert_eq!(idle_band(&schedule, 35, &rules(), now), Some(IdleBand::Below40));
        // The same price is not cheap enough for the 10th-percentile band.
        assert_eq!(idle_band(&schedule, 45, &rules(), now), None);
    }

    #[test]
    fn top_band_matches_the_10th_percentile() {
        let now = at(13, 0);
        let schedule = schedule(now, &permuted(2.0));
        assert_eq!(idle_band(&schedule, 45, &rules(), now), Some(IdleBand::Below50));
        assert_eq!(idle_band(&schedule, 55, &rules(), now), None);
    }

    #[test]
    fn expensive_current_period_keeps_discharging() {
        let now = at(13, 0);
        let schedule = schedule(now, &permuted(11.0));
        assert_eq!(idle_band(&schedule, 25, &rules(), now), None);
        assert_eq!(
            decide(&schedule, &CheapSlotPlan::default(), 25, &rules(), now).discharge_pct,
            100,
        );
    }

    #[test]
    fn short_visibility_skips_the_idle_rule() {
        let now = at(13, 0);
        let schedule = schedule(now, &[1.5; 6]);
        assert_eq!(idle_band(&schedule, 25, &rules(), now), None);
    }
}
