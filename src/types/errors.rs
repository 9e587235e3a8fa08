use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CentsError {
    #[error("Cents error: amount [{0}] does not fit in integer cents")]
    Overflow(Decimal),
    #[error("Cents error: negating [{0}] overflows")]
    NegationOverflow(i64)
}
