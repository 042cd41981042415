mod rules;
mod validator;

use crate::config::RunConfig;
use crate::error::ValidationError;
use crate::types::RetryPolicy;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }
}

impl Validate for RetryPolicy {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        rules::settings::validate_policy(&mut v, self, "retry");
        v.finish()
    }
}

pub fn validate_config(config: &RunConfig) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_config(config);
    v.finish()
}
