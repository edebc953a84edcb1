use crate::quantity::{KilowattHours, Kilowatts};

/// SOC assumed when the sensor is unreachable: a nearly empty battery makes
/// charging look more necessary, not less.
pub const FALLBACK_SOC: u32 = 10;

/// Battery bank parameters used to size the overnight charge.
#[derive(Copy, Clone, Debug)]
pub struct BatteryBank {
    pub battery_count: u32,
    pub battery_capacity: KilowattHours,
    pub usable_fraction: f64,
    pub charge_rate: Kilowatts,
}

impl BatteryBank {
    pub fn usable_capacity(&self) -> KilowattHours {
        self.battery_capacity * f64::from(self.battery_count) * self.usable_fraction
    }

    /// Energy needed to charge from `soc` to `required_soc`, floored at zero.
    pub fn deficit(&self, soc: u32, required_soc: u32) -> KilowattHours {
        self.usable_capacity() * ((f64::from(required_soc) - f64::from(soc)).max(0.0) / 100.0)
    }

    /// Number of half-hour charging slots needed to cover the deficit,
    /// rounded up to whole slots.
    #[expect(clippy::cast_possible_truncation)]
    #[expect(clippy::cast_sign_loss)]
    pub fn slots_required(&self, soc: u32, required_soc: u32) -> usize {
        let hours = self.deficit(soc, required_soc) / self.charge_rate;
        (hours * 2.0).ceil() as usize
    }
}
