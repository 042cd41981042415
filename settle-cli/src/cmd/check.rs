use std::path::Path;

use serde::Serialize;
use settle_core::{load_config, ConfigError};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct CheckResult {
    valid: bool,
    nodes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn check_cmd(path: &Path, output: OutputArgs) -> i32 {
    match load_config(path) {
        Ok(config) => {
            let result = CheckResult {
                valid: true,
                nodes: config.nodes.len(),
                max_workers: config.workers.limit(),
                errors: vec![],
            };
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: valid run config ({} nodes)", result.nodes);
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(ConfigError::Io { path, source }) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {path}: {source}"),
            );
            exit_codes::RUNTIME_ERROR
        }
        Err(ConfigError::Parse(e)) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::VALIDATION_FAILED
        }
        Err(ConfigError::Validation(err)) => {
            let errors: Vec<String> = err.violations.iter().map(ToString::to_string).collect();
            let result = CheckResult {
                valid: false,
                nodes: 0,
                max_workers: None,
                errors: errors.clone(),
            };
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::VALIDATION_FAILED
        }
    }
}
