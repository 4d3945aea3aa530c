//! I/O side of the reservation pipeline: dataset fetching with retries, the
//! rate-limited relay client, and the message-thread store.

pub mod error;
pub mod fetch;
pub mod rate_limit;
pub mod relay;
pub mod retry;
pub mod threads;

pub use error::{FetchError, RelayError, ThreadStoreError};
pub use fetch::{validate_payload, DataSource, ReservationFetcher};
pub use rate_limit::MessageRateLimiter;
pub use relay::RelayClient;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use threads::{FileThreadStore, ThreadMessage};
