use crate::types::errors::CentsError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::fmt::{Display, Formatter};

const DECIMAL_PLACES: usize = 2;
const SCALE: i64 = 10i64.pow(DECIMAL_PLACES as u32);

/// A sign-preserving amount expressed in whole cents.
///
/// Providers and storage disagree on decimal scale (`10.1` vs `10.10` vs
/// `10.100`), so every comparison between the two happens on this integer form.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cents(i64);

impl Cents {
    pub fn new(value: i64) -> Self {
        Cents(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Converts a decimal amount to cents, rounding half away from zero.
    pub fn from_decimal(amount: Decimal) -> Result<Cents, CentsError> {
        amount.checked_mul(Decimal::from(SCALE))
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|scaled| scaled.to_i64())
            .map(Cents)
            .ok_or(CentsError::Overflow(amount))
    }

    pub fn checked_neg(self) -> Result<Cents, CentsError> {
        self.0.checked_neg().map(Cents).ok_or(CentsError::NegationOverflow(self.0))
    }
}

impl TryFrom<Decimal> for Cents {
    type Error = CentsError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Cents::from_decimal(amount)
    }
}

impl Display for Cents {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let integer = abs / SCALE as u64;
        let fraction = abs % SCALE as u64;
        write!(formatter, "{}{}.{:0width$}", sign, integer, fraction, width = DECIMAL_PLACES)
    }
}
