mod cache;
mod cli;
mod config;
mod download;
mod error;
mod exec;
mod installer;
mod platform;
mod remote;
mod reporter;
mod types;
mod version;


use anyhow::Result;
use cache::FsToolCache;
use clap::Parser;
use cli::{Cli, OutputFormat};
use config::Settings;
use download::HttpFetcher;
use exec::SystemRunner;
use installer::Installer;
use remote::BrothClient;
use reporter::GithubReporter;
use types::InstalledTool;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    if let Err(e) = run(&cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli)?;
    tracing::debug!("Settings: {:?}", settings);

    let client = reqwest::Client::builder()
        .user_agent(concat!("setup-butler/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let installer = Installer::new(
        settings.clone(),
        Box::new(FsToolCache::new(&settings.tool_cache_dir)),
        Box::new(HttpFetcher::new(client.clone())),
        Box::new(BrothClient::new(client, &settings.base_url)),
        Box::new(SystemRunner),
        Box::new(GithubReporter::from_env()),
    );

    let tool = installer.run().await?;
    print_summary(&tool, settings.output)
}

fn print_summary(tool: &InstalledTool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tool)?),
        OutputFormat::Text => println!(
            "butler {} ready at {}{}",
            tool.version,
            tool.path.display(),
            if tool.cached { " (cached)" } else { "" }
        ),
    }
    Ok(())
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v.trim() == "1");

    let level = if cli.quiet {
        "error"
    } else if cli.verbose >= 2 {
        "trace"
    } else if cli.verbose == 1 || runner_debug {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays parseable with --output json.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}
