mod castor;

pub use castor::{ApiErrorBody, ApiErrorObject, CastorError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
