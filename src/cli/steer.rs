use chrono::Local;

use crate::{
    api::{inverter, octopus},
    cli::SteerArgs,
    core::{
        charge::FALLBACK_SOC,
        engine,
        feed::PriceFeed,
        plan::CheapSlotPlan,
    },
    prelude::*,
    store::FileStore,
};

/// One scheduled control run: refresh the prices if needed, evaluate the
/// rules and push the commands to the inverter.
///
/// Nothing in here is allowed to abort the run short of a usable decision:
/// an unreachable tariff API falls back to the cached snapshot, an
/// unreachable inverter state degrades to the worst-case SOC.
#[instrument(skip_all)]
pub async fn steer(args: &SteerArgs) -> Result {
    let store = FileStore::new(args.store.data_dir.clone());
    let mut feed = PriceFeed::new(&store);
    let now = Local::now();

    if feed.schedule().is_stale(now) {
        let api = octopus::Api::new(
            &args.octopus.base_url,
            args.octopus.api_key.clone(),
            &args.octopus.product_code,
            &args.octopus.tariff_code,
        )?;
        match api.get_unit_rates(now).await {
            Ok(body) => {
                if let Err(error) = feed.refresh(&body) {
                    error!("rejecting the fetched tariff payload: {error:#}");
                }
            }
            Err(error) => {
                warn!("tariff fetch failed, falling back to the cached snapshot: {error:#}");
            }
        }
    }
    let schedule = feed.schedule();
    match schedule.current_rate(now) {
        Some(rate) => info!(%rate, "current price"),
        None => warn!("no known price for the current period"),
    }

    let inverter = inverter::Client::new(args.inverter.base_url.clone())?;
    let state = match inverter.get_state().await {
        Ok(state) => Some(state),
        Err(error) => {
            warn!("failed to read the inverter state: {error:#}");
            None
        }
    };
    let soc = state.and_then(|state| state.soc).unwrap_or(FALLBACK_SOC);

    let bank = args.battery.bank();
    let slots_required = bank.slots_required(soc, args.battery.required_soc);
    info!(
        soc,
        required_soc = args.battery.required_soc,
        deficit = %bank.deficit(soc, args.battery.required_soc),
        slots_required,
        "sized the charge",
    );

    let mut plan = CheapSlotPlan::load(&store);
    if plan.refresh_due(now, args.rules.plan_trigger_hour, args.rules.refresh_interval()) {
        plan = CheapSlotPlan::select(&schedule, now, args.rules.window, slots_required);
        for (start, rate) in &plan.slots {
            info!(%start, %rate, "committed to a cheap slot");
        }
        if let Err(error) = plan.save(&store) {
            error!("failed to persist the cheap-slot plan: {error:#}");
        }
    }

    let decision = engine::decide(&schedule, &plan, soc, &args.rules.rules(), now);
    info!(decision.charge, decision.discharge_pct, "decided");

    if args.dry_run {
        info!("dry run, leaving the inverter alone");
        return Ok(());
    }

    // Skip the redundant write when the limit is already where we want it.
    if state.map(|state| state.discharge_pct) != Some(decision.discharge_pct) {
        inverter.set_discharge_pct(decision.discharge_pct).await?;
    }
    inverter.set_charge(decision.charge).await?;

    args.heartbeat.send().await;
    Ok(())
}
