//! CSS units and the conversion table used to normalize compatible units
//! before arithmetic, per spec.md §3.1's "Numbers hold canonical units"
//! invariant.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    None,
    Percent,
    Px,
    In,
    Cm,
    Mm,
    Q,
    Pt,
    Pc,
    Em,
    Rem,
    Ex,
    Ch,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Deg,
    Grad,
    Rad,
    Turn,
    S,
    Ms,
    Hz,
    Khz,
    Dpi,
    Dpcm,
    Dppx,
    Unknown(String),
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::None => "",
            Unit::Percent => "%",
            Unit::Px => "px",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Q => "q",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::Em => "em",
            Unit::Rem => "rem",
            Unit::Ex => "ex",
            Unit::Ch => "ch",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Vmin => "vmin",
            Unit::Vmax => "vmax",
            Unit::Deg => "deg",
            Unit::Grad => "grad",
            Unit::Rad => "rad",
            Unit::Turn => "turn",
            Unit::S => "s",
            Unit::Ms => "ms",
            Unit::Hz => "hz",
            Unit::Khz => "khz",
            Unit::Dpi => "dpi",
            Unit::Dpcm => "dpcm",
            Unit::Dppx => "dppx",
            Unit::Unknown(s) => s,
        }
    }

    pub fn from_str(s: &str) -> Unit {
        match s.to_ascii_lowercase().as_str() {
            "" => Unit::None,
            "%" => Unit::Percent,
            "px" => Unit::Px,
            "in" => Unit::In,
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "q" => Unit::Q,
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "em" => Unit::Em,
            "rem" => Unit::Rem,
            "ex" => Unit::Ex,
            "ch" => Unit::Ch,
            "vw" => Unit::Vw,
            "vh" => Unit::Vh,
            "vmin" => Unit::Vmin,
            "vmax" => Unit::Vmax,
            "deg" => Unit::Deg,
            "grad" => Unit::Grad,
            "rad" => Unit::Rad,
            "turn" => Unit::Turn,
            "s" => Unit::S,
            "ms" => Unit::Ms,
            "hz" => Unit::Hz,
            "khz" => Unit::Khz,
            "dpi" => Unit::Dpi,
            "dpcm" => Unit::Dpcm,
            "dppx" => Unit::Dppx,
            _ => Unit::Unknown(s.to_string()),
        }
    }

    /// The conversion family a unit belongs to, used to decide whether two
    /// units are compatible for arithmetic/comparison.
    fn family(&self) -> Option<UnitFamily> {
        match self {
            Unit::In | Unit::Cm | Unit::Mm | Unit::Q | Unit::Pt | Unit::Pc | Unit::Px => {
                Some(UnitFamily::Length)
            }
            Unit::Deg | Unit::Grad | Unit::Rad | Unit::Turn => Some(UnitFamily::Angle),
            Unit::S | Unit::Ms => Some(UnitFamily::Time),
            Unit::Hz | Unit::Khz => Some(UnitFamily::Frequency),
            Unit::Dpi | Unit::Dpcm | Unit::Dppx => Some(UnitFamily::Resolution),
            _ => None,
        }
    }

    /// Multiplier to convert one unit of `self` into canonical units (px,
    /// deg, s, hz, dpi respectively) within its family.
    fn to_canonical_factor(&self) -> f64 {
        match self {
            Unit::Px | Unit::Deg | Unit::S | Unit::Hz | Unit::Dpi => 1.0,
            Unit::In => 96.0,
            Unit::Cm => 96.0 / 2.54,
            Unit::Mm => 96.0 / 25.4,
            Unit::Q => 96.0 / 101.6,
            Unit::Pt => 96.0 / 72.0,
            Unit::Pc => 16.0,
            Unit::Grad => 0.9,
            Unit::Rad => 180.0 / std::f64::consts::PI,
            Unit::Turn => 360.0,
            Unit::Ms => 1.0 / 1000.0,
            Unit::Khz => 1000.0,
            Unit::Dpcm => 2.54,
            Unit::Dppx => 96.0,
            _ => 1.0,
        }
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        if self == other {
            return true;
        }
        match (self.family(), other.family()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Factor to multiply a value in `self` units by to get the equivalent
    /// value in `other` units. Only valid when `is_compatible` is true.
    pub fn conversion_factor(&self, other: &Unit) -> f64 {
        self.to_canonical_factor() / other.to_canonical_factor()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitFamily {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
