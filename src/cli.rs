mod heartbeat;
mod rates;
mod steer;

use std::path::PathBuf;

use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use reqwest::Url;

pub use self::{heartbeat::HeartbeatArgs, rates::rates, steer::steer};
use crate::{
    core::{charge::BatteryBank, engine::Rules},
    quantity::{KilowattHours, Kilowatts, UnitRate},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: refresh the prices and steer the inverter for the current half-hour.
    Steer(Box<SteerArgs>),

    /// Show the upcoming unit rates and cutoffs without touching the inverter.
    Rates(Box<RatesArgs>),
}

#[derive(Parser)]
pub struct SteerArgs {
    /// Compute and log the decision without sending any inverter commands.
    #[clap(long)]
    pub dry_run: bool,

    #[clap(flatten)]
    pub octopus: OctopusArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub rules: RulesArgs,

    #[clap(flatten)]
    pub inverter: InverterArgs,

    #[clap(flatten)]
    pub store: StoreArgs,

    #[clap(flatten)]
    pub heartbeat: HeartbeatArgs,
}

#[derive(Parser)]
pub struct RatesArgs {
    #[clap(flatten)]
    pub octopus: OctopusArgs,

    #[clap(flatten)]
    pub rules: RulesArgs,

    #[clap(flatten)]
    pub store: StoreArgs,
}

#[derive(Parser)]
pub struct OctopusArgs {
    /// Octopus API key, used as the basic-auth username.
    #[clap(long = "octopus-api-key", env = "OCTOPUS_API_KEY")]
    pub api_key: String,

    /// Product code, for example `AGILE-24-10-01`.
    #[clap(long = "octopus-product-code", env = "OCTOPUS_PRODUCT_CODE")]
    pub product_code: String,

    /// Tariff code, for example `E-1R-AGILE-24-10-01-A`.
    #[clap(long = "octopus-tariff-code", env = "OCTOPUS_TARIFF_CODE")]
    pub tariff_code: String,

    #[clap(
        long = "octopus-base-url",
        env = "OCTOPUS_BASE_URL",
        default_value = "https://api.octopus.energy"
    )]
    pub base_url: Url,
}

#[derive(Copy, Clone, Parser)]
pub struct BatteryArgs {
    /// Number of battery modules.
    #[clap(long, env = "BATTERY_COUNT", default_value = "6")]
    pub battery_count: u32,

    /// Nameplate capacity of a single module in kilowatt-hours.
    #[clap(long = "battery-capacity-kwh", env = "BATTERY_CAPACITY_KWH", default_value = "2.4")]
    pub battery_capacity: KilowattHours,

    /// Fraction of the nameplate capacity that is actually usable.
    #[clap(long, env = "USABLE_FRACTION", default_value = "0.8")]
    pub usable_fraction: f64,

    /// Charging power in kilowatts.
    #[clap(long = "charge-rate-kilowatts", env = "CHARGE_RATE_KILOWATTS", default_value = "3.3")]
    pub charge_rate: Kilowatts,

    /// Target state of charge for the overnight plan.
    ///
    /// With solar panels this wants to be high in winter and lower in
    /// summer, when the sun tops the batteries up for free.
    #[clap(long, env = "REQUIRED_SOC", default_value = "90")]
    pub required_soc: u32,
}

impl BatteryArgs {
    pub const fn bank(&self) -> BatteryBank {
        BatteryBank {
            battery_count: self.battery_count,
            battery_capacity: self.battery_capacity,
            usable_fraction: self.usable_fraction,
            charge_rate: self.charge_rate,
        }
    }
}

#[derive(Copy, Clone, Parser)]
pub struct RulesArgs {
    /// Always charge at or below this unit rate, regardless of SOC.
    #[clap(long = "failsafe-rate", env = "FAILSAFE_RATE", default_value = "1")]
    pub failsafe_rate: UnitRate,

    /// Unit rate above which a period counts as a peak.
    #[clap(long = "peak-rate", env = "PEAK_RATE", default_value = "15")]
    pub peak_rate: UnitRate,

    /// Look-ahead window in half-hour periods.
    #[clap(long = "lookahead-slots", env = "LOOKAHEAD_SLOTS", default_value = "20")]
    pub window: usize,

    /// Local hour from which the overnight plan may be recomputed.
    #[clap(long, env = "PLAN_TRIGGER_HOUR", default_value = "21")]
    pub plan_trigger_hour: u32,

    /// Minimum number of hours between plan recomputations.
    #[clap(long, env = "PLAN_REFRESH_HOURS", default_value = "4")]
    pub plan_refresh_hours: i64,
}

impl RulesArgs {
    pub const fn rules(&self) -> Rules {
        Rules { failsafe_rate: self.failsafe_rate, peak_rate: self.peak_rate, window: self.window }
    }

    pub fn refresh_interval(&self) -> TimeDelta {
        TimeDelta::hours(self.plan_refresh_hours)
    }
}

#[derive(Parser)]
pub struct InverterArgs {
    /// Base URL of the local inverter control server.
    #[clap(long = "inverter-base-url", env = "INVERTER_BASE_URL")]
    pub base_url: Url,
}

#[derive(Parser)]
pub struct StoreArgs {
    /// Directory holding the tariff and cheap-slot snapshots.
    #[clap(long, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,
}
