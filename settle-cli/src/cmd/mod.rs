pub mod check;
pub mod fanout;
pub mod nfs;
pub mod setup;
pub mod wait;

use settle_exec::lifecycle::LifecycleError;

use crate::exit_codes;
use crate::output::print_error;
use crate::OutputArgs;

/// A command that stopped early, with the exit code it maps to.
#[derive(Debug)]
pub struct Failure {
    pub code: i32,
    pub message: String,
}

impl Failure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: exit_codes::VALIDATION_FAILED,
            message: message.into(),
        }
    }

    pub fn run(message: impl Into<String>) -> Self {
        Self {
            code: exit_codes::RUN_FAILED,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            code: exit_codes::RUNTIME_ERROR,
            message: message.into(),
        }
    }
}

impl From<LifecycleError> for Failure {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::MissingRole(_) => Self::validation(err.to_string()),
            other => Self::run(other.to_string()),
        }
    }
}

/// Print a failure (if any) and return the process exit code.
pub fn finish(output: &OutputArgs, result: Result<i32, Failure>) -> i32 {
    match result {
        Ok(code) => code,
        Err(failure) => {
            print_error(output.format, output.quiet, &failure.message);
            failure.code
        }
    }
}
