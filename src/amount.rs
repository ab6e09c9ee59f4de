use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use thiserror::Error;

/// Fixed-point money value with 4 decimal places, stored as a scaled integer.
///
/// Arithmetic keeps the full 4 places and saturates instead of overflowing;
/// `Display` rounds to 2 (half away from zero), which is what receipts and the log show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

/// Failure to parse a decimal string into an [`Amount`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount '{0}'")]
    Invalid(String),
    #[error("amount '{0}' has more than 4 decimal places")]
    TooPrecise(String),
}

impl Amount {
    const SCALE: i64 = 10_000;
    const DECIMALS: usize = 4;

    pub const ZERO: Amount = Amount(0);

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    /// Amount worth `units` whole currency units.
    pub fn from_units(units: i64) -> Self {
        Amount(units * Self::SCALE)
    }

    /// Approximate value, for ratios only.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self × (1 − percent / 100)`, rounded to the nearest scaled unit.
    pub fn percent_off(self, percent: Amount) -> Amount {
        let hundred = 100 * Self::SCALE as i128;
        let scaled = self.0 as i128 * (hundred - percent.0 as i128);
        Amount(div_round(scaled, hundred) as i64)
    }

    /// Price of `quantity` items at this unit price. Saturates at the `i64` bounds.
    pub fn times(self, quantity: u32) -> Amount {
        Amount(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Rounded to whole cents (half away from zero), the precision receipts and logs show.
    pub fn round_cents(self) -> Amount {
        let cents = div_round(i128::from(self.0), 100) * 100;
        Amount(i64::try_from(cents).unwrap_or(self.0))
    }

    /// Whole currency units, rounded toward negative infinity.
    pub fn whole_units(self) -> i64 {
        self.0.div_euclid(Self::SCALE)
    }

    /// Full-precision rendering: at least 2 decimals, more only when they are non-zero.
    ///
    /// Used when rewriting source files so that a 4-place price survives a round trip.
    pub fn exact(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let mut frac = format!("{:04}", abs % Self::SCALE as u64);
        while frac.len() > 2 && frac.ends_with('0') {
            frac.pop();
        }
        format!("{sign}{whole}.{frac}")
    }
}

fn div_round(value: i128, divisor: i128) -> i128 {
    let half = divisor / 2;
    if value >= 0 {
        (value + half) / divisor
    } else {
        (value - half) / divisor
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = div_round(i128::from(self.0), 100);
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        // pad() so that width/alignment specifiers work in receipt columns
        f.pad(&format!("{sign}{}.{:02}", abs / 100, abs % 100))
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let invalid = || AmountParseError::Invalid(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > Self::DECIMALS {
            return Err(AmountParseError::TooPrecise(s.to_string()));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<4}").parse().map_err(|_| invalid())?
        };

        let scaled = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;
        Ok(Amount(if negative { -scaled } else { scaled }))
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(self.0.saturating_neg())
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}
