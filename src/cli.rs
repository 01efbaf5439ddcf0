use clap::{Parser, ValueEnum};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("SETUP_BUTLER_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("SETUP_BUTLER_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("SETUP_BUTLER_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup so clap can hold a 'static str.
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "setup-butler")]
#[command(about = "Installs the itch.io butler CLI into the runner tool cache and onto PATH")]
#[command(
    version = get_version(),
    after_help = "Examples:\n  setup-butler\n  setup-butler --tool-version 15.21.0 --self-update false\n  INPUT_VERSION=latest RUNNER_TEMP=/tmp setup-butler -v"
)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// butler version to install when none is cached ('latest' or X.Y.Z) [env: INPUT_VERSION]
    #[arg(long, value_name = "VERSION")]
    pub tool_version: Option<String>,

    /// Run 'butler upgrade' when a cached copy is found [env: INPUT_SELF-UPDATE] [default: true]
    #[arg(long, value_name = "BOOL")]
    pub self_update: Option<String>,

    /// Scratch directory for downloads [env: RUNNER_TEMP]
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Root of the tool cache [env: RUNNER_TOOL_CACHE]
    #[arg(long)]
    pub tool_cache: Option<PathBuf>,

    /// Distribution endpoint [env: SETUP_BUTLER_BASE_URL]
    #[arg(long)]
    pub base_url: Option<String>,

    /// Summary printed once butler is ready
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}
