use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod logging;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "settle",
    version,
    about = "Bounded polling, retries and parallel fan-out against cluster nodes"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Check { path, output } => cmd::check::check_cmd(&path, output).await,
        Command::Wait {
            label,
            sudo,
            config,
            target,
            poll,
            output,
            command,
        } => cmd::wait::wait_cmd(&label, sudo, config, target, poll, output, &command).await,
        Command::Fanout {
            sudo,
            config,
            target,
            retry,
            workers,
            output,
            command,
        } => cmd::fanout::fanout_cmd(sudo, config, target, retry, workers, output, &command).await,
        Command::Nfs { command } => cmd::nfs::nfs_cmd(command).await,
    }
}
