//! DAK FAQ command-line interface

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dak_faq::cli::output::{self, OutputFormat, Printer};
use dak_faq::cli::{canonical, logging, questions};
use dak_faq::engine::CatalogFilter;
use dak_faq::types::QuestionLevel;
use dak_faq::{FaqConfig, FaqService, local_context};
use std::path::PathBuf;

/// DAK FAQ command-line tool
#[derive(Parser)]
#[command(name = "dak-faq")]
#[command(author, version, about = "Answer frequently asked questions about a Digital Adaptation Kit", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Configuration file (default: $DAK_FAQ_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Local checkout of the DAK repository
    #[arg(short, long, default_value = ".", global = true)]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available questions
    List {
        /// Only questions at this level (project, component, file)
        #[arg(long)]
        level: Option<QuestionLevel>,

        /// Only questions about this DAK component type
        #[arg(long)]
        component: Option<String>,

        /// Only questions carrying any of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Only questions about this asset type
        #[arg(long)]
        asset_type: Option<String>,
    },

    /// Execute a question against the repository
    Run {
        /// Question id
        question: String,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Restrict the question to these repository files
        #[arg(short, long = "asset")]
        assets: Vec<String>,
    },

    /// Execute every request in a JSON file
    Batch {
        /// Array of {"questionId", "parameters", "assetFiles"} requests
        file: PathBuf,
    },

    /// Show the input and output schema of a question
    Schema {
        /// Question id
        question: String,
    },

    /// Validate parameters without executing the question
    Validate {
        /// Question id
        question: String,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Print the OpenAPI document for the question catalog
    Openapi,

    /// Report which questions reference canonical resources
    Audit,

    /// Inspect and manage canonical resources
    Canonical {
        #[command(subcommand)]
        command: CanonicalCommand,
    },
}

#[derive(Subcommand)]
enum CanonicalCommand {
    /// List well-known canonical URLs
    Known,

    /// Fetch a canonical resource (url or url|version)
    Get { url: String },

    /// Expand a ValueSet into its codes
    Expand { url: String },

    /// List cached resources
    Cached,

    /// Show cache statistics
    Stats,

    /// Remove every cached resource
    Clear,
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", output::format_warning(&e.to_string()));
    }

    if let Err(e) = run(cli).await {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = FaqConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    let service = FaqService::from_config(&config).context("Failed to start the FAQ service")?;
    let printer = Printer::new(cli.format, cli.output);

    match cli.command {
        Commands::List {
            level,
            component,
            tags,
            asset_type,
        } => {
            let filter = CatalogFilter {
                level,
                component_type: component,
                tags,
                asset_type,
            };
            questions::list(&service, &printer, &filter)
        }

        Commands::Run {
            question,
            params,
            assets,
        } => {
            if !cli.repo.is_dir() {
                bail!("Repository directory not found: {}", cli.repo.display());
            }
            let context = local_context(&cli.repo);
            questions::run(&service, &printer, &context, &question, &params, assets).await
        }

        Commands::Batch { file } => {
            if !cli.repo.is_dir() {
                bail!("Repository directory not found: {}", cli.repo.display());
            }
            let context = local_context(&cli.repo);
            questions::batch(&service, &printer, &context, &file).await
        }

        Commands::Schema { question } => questions::schema(&service, &printer, &question),

        Commands::Validate { question, params } => {
            questions::validate(&service, &printer, &question, &params).await
        }

        Commands::Openapi => questions::openapi(&service, &printer),

        Commands::Audit => questions::audit(&service, &printer),

        Commands::Canonical { command } => match command {
            CanonicalCommand::Known => canonical::known(&service, &printer),
            CanonicalCommand::Get { url } => canonical::get(&service, &printer, &url).await,
            CanonicalCommand::Expand { url } => canonical::expand(&service, &printer, &url).await,
            CanonicalCommand::Cached => canonical::cached(&service, &printer).await,
            CanonicalCommand::Stats => canonical::stats(&service, &printer).await,
            CanonicalCommand::Clear => canonical::clear(&service).await,
        },
    }
}
