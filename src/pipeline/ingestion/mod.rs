// Article acquisition: PMC E-utilities client, request pacing and the search log

pub mod pmc;
pub mod rate_limiter;
pub mod retry;
pub mod search_log;

pub use pmc::PmcClient;
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use search_log::SearchLogEntry;
