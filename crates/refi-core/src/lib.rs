pub mod amortization;
pub mod analysis;
pub mod error;
pub mod export;
pub mod loan;
pub mod market;
pub mod payoff;
pub mod time_value;
pub mod types;

pub use error::RefiError;
pub use types::*;

/// Standard result type for all refinance-analytics operations
pub type RefiResult<T> = Result<T, RefiError>;
