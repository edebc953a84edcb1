use chrono::Local;

use crate::{
    api::octopus,
    cli::RatesArgs,
    core::feed::PriceFeed,
    prelude::*,
    store::FileStore,
    tables::build_rates_table,
};

/// Development view: refresh the schedule the same way `steer` would, then
/// print the upcoming rates.
#[instrument(skip_all)]
pub async fn rates(args: &RatesArgs) -> Result {
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
            Ok(body) => feed.refresh(&body)?,
            Err(error) => {
                warn!("tariff fetch failed, showing the cached snapshot: {error:#}");
            }
        }
    }

    let schedule = feed.schedule();
    ensure!(!schedule.is_empty(), "no tariff data available, neither remote nor cached");
    println!("{}", build_rates_table(&schedule, now, args.rules.window));
    if schedule.is_stale(now) {
        warn!("running low on future rates");
    }
    Ok(())
}
