mod limit;
mod parallel;

pub use limit::{WorkerLimit, DEFAULT_MAX_PARALLELISM};
pub use parallel::ParallelTaskRunner;
