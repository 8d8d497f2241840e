//! Transfer transactions: wire format, canonical signing bytes and admission checks

pub mod amount;
pub mod types;
pub mod validation;

pub use amount::{parse_amount, Amount};
pub use types::*;
pub use validation::validate_submission;
