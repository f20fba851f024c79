//! Command line interface definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-courier",
    version,
    about = "Compose letters from templates and commit them to a GitHub repository"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "REPO_COURIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the local database.
    #[arg(long, global = true, env = "REPO_COURIER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// GitHub token for this invocation only; never written to the config.
    #[arg(long, global = true, env = "REPO_COURIER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose and send letters now.
    Send(SendArgs),

    /// Upload a local file to every destination, replacing existing copies.
    Upload(UploadArgs),

    /// Daily scheduler.
    Schedule(ScheduleCommand),

    /// Manage letter themes.
    Template(TemplateCommand),

    /// Show or edit the config file.
    Config(ConfigCommand),

    /// Manage the GitHub token in the OS keychain.
    Auth(AuthCommand),

    /// Show recent deliveries.
    History(HistoryArgs),
}

/// Repository and destination overrides; saved to the config when given.
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Repository, owner/name.
    #[arg(long)]
    pub repo: Option<String>,

    /// Comma-separated destinations, each `branch` or `branch/folder`.
    #[arg(long = "to")]
    pub destinations: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message text.
    #[arg(short, long, default_value = "")]
    pub message: String,

    /// Theme name (defaults to the configured theme).
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Emoji appended after the message.
    #[arg(short, long)]
    pub emoji: Option<String>,

    /// Number of letters to send (1-10).
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload.
    pub path: PathBuf,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct ScheduleCommand {
    #[command(subcommand)]
    pub command: ScheduleSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleSubcommand {
    /// Run the scheduler in the foreground until Ctrl-C.
    Run(ScheduleArgs),

    /// Print when the next scheduled run would happen.
    Next(ScheduleArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct ScheduleArgs {
    /// Send time, HH:MM local time.
    #[arg(long)]
    pub at: Option<String>,

    /// Letters per run (1-10).
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Theme for scheduled letters.
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Emoji for scheduled letters.
    #[arg(short, long)]
    pub emoji: Option<String>,

    /// Send once immediately after starting.
    #[arg(long)]
    pub now: bool,
}

#[derive(Args, Debug)]
pub struct TemplateCommand {
    #[command(subcommand)]
    pub command: TemplateSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TemplateSubcommand {
    /// List themes.
    List,

    /// Show one theme.
    Show { name: String },

    /// Add a theme, or replace the text of an existing one.
    Add { name: String, body: String },

    /// Remove a user-defined theme.
    Remove { name: String },
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the active config (token hidden).
    Show,

    /// Print the config file location.
    Path,

    /// Set one key.
    Set { key: String, value: String },

    /// Load another config file and make it the active config.
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Store a token in the keychain (reads stdin when --token is not given).
    Login,

    /// Remove the stored token.
    Logout,

    /// Report where the token would come from.
    Status,

    /// Verify the token and repository access against GitHub.
    Check,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of entries.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: i64,
}
