use std::{
    fmt::{Debug, Display, Formatter},
    ops::{Div, Mul},
};

use derive_more::{Add, From, FromStr, Sub};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// VAT-inclusive unit rate in pence per kilowatt-hour.
///
/// Agile prices go negative on windy nights, hence the total ordering
/// via [`OrderedFloat`] rather than a plain `f64`.
#[must_use]
#[derive(
    Add, Copy, Clone, Deserialize, Eq, From, FromStr, Ord, PartialEq, PartialOrd, Serialize, Sub,
)]
#[from(f64, OrderedFloat<f64>)]
pub struct UnitRate(pub OrderedFloat<f64>);

impl Display for UnitRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}p", self.0)
    }
}

impl Debug for UnitRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Energy in kilowatt-hours.
#[must_use]
#[derive(Add, Copy, Clone, From, FromStr, PartialEq, PartialOrd, Sub)]
pub struct KilowattHours(pub f64);

impl Mul<f64> for KilowattHours {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Kilowatts> for KilowattHours {
    /// Hours.
    type Output = f64;

    fn div(self, rhs: Kilowatts) -> Self::Output {
        self.0 / rhs.0
    }
}

impl Display for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} kWh", self.0)
    }
}

impl Debug for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}kWh", self.0)
    }
}

/// Power in kilowatts.
#[must_use]
#[derive(Copy, Clone, From, FromStr, PartialEq, PartialOrd)]
pub struct Kilowatts(pub f64);

impl Display for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} kW", self.0)
    }
}

impl Debug for Kilowatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}kW", self.0)
    }
}
