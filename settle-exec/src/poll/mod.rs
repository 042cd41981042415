mod config;
mod poller;

pub use config::PollConfig;
pub use poller::{BoundedPoller, PollError};
