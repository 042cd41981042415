mod batch;
mod lifecycle;
mod node;
mod poll;
mod retry;
mod service;

pub use batch::{BatchOutcome, TaskResult};
pub use lifecycle::{Resource, ResourceKind, ResourceState};
pub use node::{Inventory, Node};
pub use poll::{PollAttempt, PollOutcome, Settled};
pub use retry::{Jitter, RetryPolicy};
pub use service::{parse_service_list, ServiceCounts, ServiceStatus};
