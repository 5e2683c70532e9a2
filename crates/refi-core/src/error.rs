use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefiError {
    #[error("Invalid input: {field} — {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid loan: {0}")]
    InvalidLoan(String),

    #[error("Invalid settings: {field} — {reason}")]
    InvalidSettings { field: String, reason: String },

    #[error("Infeasible plan: {0}")]
    InfeasiblePlan(String),

    #[error("Data source failure: {0}")]
    DataSource(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RefiError {
    fn from(e: serde_json::Error) -> Self {
        RefiError::SerializationError(e.to_string())
    }
}
