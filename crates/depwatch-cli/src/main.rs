mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "depwatch",
    about = "Background dependency monitor: watch manifests, classify findings, surface alerts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .depwatch/ or .git/)
    #[arg(long, global = true, env = "DEPWATCH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Classifier base URL (overrides classifier.endpoint)
    #[arg(long, global = true, env = "DEPWATCH_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    /// Classifier API key (overrides classifier.api_key)
    #[arg(long, global = true, env = "DEPWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default .depwatch/config.yaml if it is missing
    Init,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List the dependencies declared by manifests at the root
    Resources,

    /// Run the offline severity heuristic over one or more insights
    Classify {
        /// Insight text, one per argument
        #[arg(required = true)]
        insights: Vec<String>,
    },

    /// Run one check against the configured classifier and print alerts
    Scan {
        /// Run a full check (also reports available updates)
        #[arg(long)]
        full: bool,

        /// Write approved upgrades into the root package.json
        #[arg(long)]
        apply: bool,
    },

    /// Monitor in the foreground until Ctrl-C
    Watch {
        /// Write approved upgrades into the root package.json
        #[arg(long)]
        apply: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let overrides = cmd::ClassifierOverrides {
        endpoint: cli.classifier_url,
        api_key: cli.api_key,
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Config { subcommand } => {
            cmd::config::run(&root, subcommand, &overrides, cli.json)
        }
        Commands::Resources => cmd::resources::run(&root, cli.json),
        Commands::Classify { insights } => cmd::classify::run(&root, &insights, cli.json),
        Commands::Scan { full, apply } => {
            cmd::scan::run(&root, full, apply, &overrides, cli.json)
        }
        Commands::Watch { apply } => cmd::watch::run(&root, apply, &overrides, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
