//! Command dispatch: bridges CLI args -> handlers -> exit codes.

pub mod acquire;
pub mod config_cmd;
pub mod devices;
pub mod interfaces;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::{CliError, exit_code};

/// Dispatch a command, returning the exit code it ended with.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<i32, CliError> {
    match cmd {
        Command::Acquire(args) => acquire::handle(args, global).await,
        Command::Devices(args) => devices::handle(args, global)
            .await
            .map(|()| exit_code::SUCCESS),
        Command::Interfaces => interfaces::handle(global).map(|()| exit_code::SUCCESS),
        Command::Config(args) => config_cmd::handle(args, global).map(|()| exit_code::SUCCESS),
        Command::Completions(args) => {
            use clap::CommandFactory;

            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "linkup", &mut std::io::stdout());
            Ok(exit_code::SUCCESS)
        }
    }
}
