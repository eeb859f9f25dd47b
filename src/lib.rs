pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod retry;

pub(crate) mod utils;

pub use client::Client;
pub use config::{ClientOptions, RetrySettings};
pub use error::{CastorError, IsRetryable};
pub use job::{JobClient, QueryOptions, status_url};
pub use retry::{RetryOptions, with_retry};
