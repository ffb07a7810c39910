//! The `Number` value variant: an `f64` plus numerator/denominator unit
//! vectors, per spec.md §3.1.

use std::fmt;

use super::unit::Unit;

/// Numbers compare equal when they differ by less than this, after unit
/// normalization — spec.md §4.2's fuzzy-equality rule.
pub const FUZZY_EPSILON: f64 = 1e-11;

#[derive(Debug, Clone)]
pub struct SassNumber {
    pub value: f64,
    pub numerator_units: Vec<Unit>,
    pub denominator_units: Vec<Unit>,
    /// Set when this number was produced by a slash-division expression in a
    /// Sass-only (non-arithmetic) position; the serializer prefers to emit
    /// `a/b` rather than the quotient when this is `Some`.
    pub as_slash: Option<(Box<SassNumber>, Box<SassNumber>)>,
}

impl SassNumber {
    pub fn new_unitless(value: f64) -> Self {
        SassNumber {
            value,
            numerator_units: Vec::new(),
            denominator_units: Vec::new(),
            as_slash: None,
        }
    }

    pub fn new_with_unit(value: f64, unit: Unit) -> Self {
        let numerator_units = if unit == Unit::None {
            Vec::new()
        } else {
            vec![unit]
        };
        SassNumber {
            value,
            numerator_units,
            denominator_units: Vec::new(),
            as_slash: None,
        }
    }

    pub fn is_unitless(&self) -> bool {
        self.numerator_units.is_empty() && self.denominator_units.is_empty()
    }

    pub fn has_single_unit(&self, unit: &Unit) -> bool {
        self.numerator_units.len() == 1
            && self.denominator_units.is_empty()
            && &self.numerator_units[0] == unit
    }

    /// Cross-unit fuzzy equality: converts `other` into `self`'s units (when
    /// compatible) before comparing.
    pub fn fuzzy_eq(&self, other: &SassNumber) -> bool {
        match self.value_in_units(&self.numerator_units, &self.denominator_units, other) {
            Some(v) => (self.value - v).abs() < FUZZY_EPSILON,
            None => false,
        }
    }

    pub fn fuzzy_cmp(&self, other: &SassNumber) -> Option<std::cmp::Ordering> {
        let converted = self.value_in_units(&self.numerator_units, &self.denominator_units, other)?;
        let diff = self.value - converted;
        if diff.abs() < FUZZY_EPSILON {
            Some(std::cmp::Ordering::Equal)
        } else if diff < 0.0 {
            Some(std::cmp::Ordering::Less)
        } else {
            Some(std::cmp::Ordering::Greater)
        }
    }

    fn value_in_units(&self, num: &[Unit], den: &[Unit], other: &SassNumber) -> Option<f64> {
        if num.len() != other.numerator_units.len() || den.len() != other.denominator_units.len()
        {
            // Units that don't pair up 1:1 are considered incompatible for
            // this simplified model; compound units beyond a single
            // numerator/denominator are rare in practice.
            if num.is_empty() && den.is_empty() && other.is_unitless() {
                return Some(other.value);
            }
            return None;
        }
        let mut factor = 1.0;
        for (a, b) in num.iter().zip(other.numerator_units.iter()) {
            if !a.is_compatible(b) {
                return None;
            }
            factor *= b.conversion_factor(a);
        }
        for (a, b) in den.iter().zip(other.denominator_units.iter()) {
            if !a.is_compatible(b) {
                return None;
            }
            factor /= b.conversion_factor(a);
        }
        Some(other.value * factor)
    }

    /// Convert this number into the given single unit, when compatible.
    pub fn convert_to(&self, unit: &Unit) -> Option<SassNumber> {
        if self.numerator_units.is_empty() && self.denominator_units.is_empty() {
            return Some(SassNumber::new_with_unit(self.value, unit.clone()));
        }
        if self.numerator_units.len() == 1 && self.denominator_units.is_empty() {
            let cur = &self.numerator_units[0];
            if cur.is_compatible(unit) {
                return Some(SassNumber::new_with_unit(
                    self.value * cur.conversion_factor(unit),
                    unit.clone(),
                ));
            }
        }
        None
    }

    pub fn add(&self, other: &SassNumber) -> Option<SassNumber> {
        self.combine(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &SassNumber) -> Option<SassNumber> {
        self.combine(other, |a, b| a - b)
    }

    fn combine(&self, other: &SassNumber, f: impl Fn(f64, f64) -> f64) -> Option<SassNumber> {
        if self.is_unitless() {
            let mut result = other.clone();
            result.value = f(self.value, other.value);
            result.as_slash = None;
            return Some(result);
        }
        if other.is_unitless() {
            let mut result = self.clone();
            result.value = f(self.value, other.value);
            result.as_slash = None;
            return Some(result);
        }
        let converted = self.value_in_units(&self.numerator_units, &self.denominator_units, other)?;
        let mut result = self.clone();
        result.value = f(self.value, converted);
        result.as_slash = None;
        Some(result)
    }

    pub fn mul(&self, other: &SassNumber) -> SassNumber {
        let mut numerator_units = self.numerator_units.clone();
        numerator_units.extend(other.numerator_units.iter().cloned());
        let mut denominator_units = self.denominator_units.clone();
        denominator_units.extend(other.denominator_units.iter().cloned());
        let (numerator_units, denominator_units) = cancel_units(numerator_units, denominator_units);
        SassNumber {
            value: self.value * other.value,
            numerator_units,
            denominator_units,
            as_slash: None,
        }
    }

    pub fn div(&self, other: &SassNumber) -> SassNumber {
        let mut numerator_units = self.numerator_units.clone();
        numerator_units.extend(other.denominator_units.iter().cloned());
        let mut denominator_units = self.denominator_units.clone();
        denominator_units.extend(other.numerator_units.iter().cloned());
        let (numerator_units, denominator_units) = cancel_units(numerator_units, denominator_units);
        SassNumber {
            value: self.value / other.value,
            numerator_units,
            denominator_units,
            as_slash: None,
        }
    }

    pub fn rem(&self, other: &SassNumber) -> SassNumber {
        let mut result = self.clone();
        result.value = self.value % other.value;
        result.as_slash = None;
        result
    }

    pub fn neg(&self) -> SassNumber {
        let mut result = self.clone();
        result.value = -result.value;
        result.as_slash = None;
        result
    }
}

/// Cancel any unit that appears in both numerator and denominator, e.g.
/// `px/px -> 1`. Units that aren't exactly equal (but merely compatible) are
/// left as-is; that finer normalization happens at emission time.
fn cancel_units(mut num: Vec<Unit>, mut den: Vec<Unit>) -> (Vec<Unit>, Vec<Unit>) {
    let mut i = 0;
    while i < num.len() {
        if let Some(pos) = den.iter().position(|u| u == &num[i]) {
            num.remove(i);
            den.remove(pos);
        } else {
            i += 1;
        }
    }
    (num, den)
}

impl fmt::Display for SassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::serializer::format_number(self.value))?;
        for u in &self.numerator_units {
            write!(f, "{}", u)?;
        }
        if !self.denominator_units.is_empty() {
            write!(f, "/")?;
            for u in &self.denominator_units {
                write!(f, "{}", u)?;
            }
        }
        Ok(())
    }
}
