mod decision;
mod decorator;

pub use decision::{decide_retry, RetryDecision, RetryReason};
pub use decorator::{retrying, RetryError, Retrying};
