mod cents;
mod errors;

pub use cents::Cents;
pub use errors::CentsError;

use uuid::Uuid;

pub type ActivityId = Uuid;
pub type UserId = Uuid;
pub type ClientId = Uuid;
pub type AccountId = Uuid;
pub type TransactionId = String;
