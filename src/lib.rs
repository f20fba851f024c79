//! Repo Courier - compose template letters and commit them to GitHub.
//!
//! This is the library behind the `repo-courier` binary. Letters are built
//! from stored themes and committed to one or more branch/folder
//! destinations through the GitHub contents API, either on demand or by a
//! daily scheduler.

pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use cli::{Cli, Command, ScheduleSubcommand};
use commands::{AppContext, Render};
use error::AppError;
use serde::Serialize;

/// Run a parsed command line.
///
/// Prints the command's result to stdout and returns whether every delivery
/// it attempted succeeded.
pub async fn run(cli: Cli) -> Result<bool, AppError> {
    let ctx = AppContext::new(cli.config, cli.data_dir, cli.token);
    let json = cli.json;

    match cli.command {
        Command::Send(args) => {
            let report = commands::send::send(&ctx, args).await?;
            emit(json, &report)?;
            Ok(report.is_success())
        }
        Command::Upload(args) => {
            let report = commands::upload::upload(&ctx, args).await?;
            emit(json, &report)?;
            Ok(report.is_success())
        }
        Command::Schedule(schedule) => match schedule.command {
            ScheduleSubcommand::Run(args) => {
                let status = commands::schedule::run(&ctx, args).await?;
                emit(json, &status)?;
                Ok(status.last_error.is_none())
            }
            ScheduleSubcommand::Next(args) => {
                emit(json, &commands::schedule::next(&ctx, args)?)?;
                Ok(true)
            }
        },
        Command::Template(template) => {
            emit(json, &commands::templates::handle(&ctx, template.command).await?)?;
            Ok(true)
        }
        Command::Config(config) => {
            emit(json, &commands::config::handle(&ctx, config.command)?)?;
            Ok(true)
        }
        Command::Auth(auth) => {
            emit(json, &commands::auth::handle(&ctx, auth.command).await?)?;
            Ok(true)
        }
        Command::History(args) => {
            emit(json, &commands::history::history(&ctx, args).await?)?;
            Ok(true)
        }
    }
}

fn emit<T: Serialize + Render>(json: bool, value: &T) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value.render());
    }
    Ok(())
}
