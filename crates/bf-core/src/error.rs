use thiserror::Error;

pub type BfResult<T> = Result<T, BfError>;

#[derive(Error, Debug)]
pub enum BfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },
}
