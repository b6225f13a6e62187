//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use frcdocs_core::pipeline::{ProgressReporter, ScrapeSummary};
use frcdocs_mcp::McpServer;
use frcdocs_shared::{AppConfig, Library, init_config, load_config};
use frcdocs_storage::DocsBundle;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// frc-docs: offline FRC documentation search for AI agents.
#[derive(Parser)]
#[command(
    name = "frc-docs",
    version,
    about = "Scrape FRC library documentation into a searchable bundle and serve it over MCP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Bundle file to write (scrape) or read (serve, postprocess).
    #[arg(long, global = true, env = "FRC_DOCS_BUNDLE")]
    pub bundle: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ingest every library and write a fresh bundle.
    Scrape,

    /// Repair an existing bundle in place without re-scraping.
    Postprocess,

    /// Serve the bundle to MCP clients over stdio.
    Serve,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs always go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "frc_docs=info,frcdocs=info",
        1 => "frc_docs=debug,frcdocs=debug",
        _ => "frc_docs=trace,frcdocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let bundle = cli.bundle;
    match cli.command.unwrap_or(Command::Serve) {
        Command::Scrape => cmd_scrape(bundle).await,
        Command::Postprocess => cmd_postprocess(bundle).await,
        Command::Serve => cmd_serve(bundle).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// `--bundle` wins over `defaults.bundle_path`.
fn bundle_path(flag: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(&config.defaults.bundle_path))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(bundle: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let path = bundle_path(bundle, &config);
    info!(bundle = %path.display(), "scraping documentation");

    let reporter = CliProgress::new();
    let summary = frcdocs_core::scrape(&config, &path, &reporter).await?;

    println!();
    println!("  Bundle written!");
    for count in &summary.libraries {
        println!("  {:<14} {} pages", count.name.as_str(), count.pages);
    }
    println!("  Pages:  {}", summary.total_pages);
    println!("  Tokens: {}", summary.total_tokens);
    for (library, reason) in &summary.failed {
        println!("  Failed: {library} ({reason})");
    }
    println!("  Path:   {}", summary.bundle_path.display());
    println!("  Time:   {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_postprocess(bundle: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let path = bundle_path(bundle, &config);

    let report = tokio::task::spawn_blocking(move || frcdocs_core::postprocess(&path))
        .await
        .map_err(|e| eyre!("postprocess task failed: {e}"))??;

    println!();
    println!("  Bundle repaired!");
    println!("  Original:       {}", report.original_pages);
    println!("  Fixed titles:   {}", report.fixed_titles);
    println!("  Removed junk:   {}", report.removed_junk);
    println!("  Removed stubs:  {}", report.removed_stubs);
    println!("  Cleaned orphan: {}", report.cleaned_orphan);
    println!("  Still untitled: {}", report.still_untitled);
    println!("  Final:          {}", report.final_pages);
    println!();

    Ok(())
}

async fn cmd_serve(bundle: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let path = bundle_path(bundle, &config);

    let docs = DocsBundle::load(&path)?;
    info!(
        bundle = %path.display(),
        pages = docs.len(),
        "starting MCP server on stdio"
    );

    McpServer::new(docs).serve_stdio().await?;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_extracted(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracting [{current}/{total}] {url}"));
    }

    fn library_done(&self, library: Library, pages: usize) {
        self.spinner.println(format!("  {library}: {pages} pages"));
    }

    fn done(&self, _summary: &ScrapeSummary) {
        self.spinner.finish_and_clear();
    }
}
