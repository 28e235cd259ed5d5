//! ragctx CLI — the main entry point.
//!
//! Commands:
//! - `assemble` — Retrieve for a query and print the assembled context as JSON
//! - `classify` — Show whether a query is treated as a filename search
//! - `config`   — Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragctx",
    about = "ragctx — grounded context assembly for retrieval-backed chatbots",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve for a query and print the assembled context
    Assemble {
        /// The user's message
        #[arg(short, long)]
        query: String,

        /// Tenant identifier (also the default partition)
        #[arg(long, default_value = "default")]
        tenant_id: String,

        /// Company name rendered into the system prompt
        #[arg(long, default_value = "ragctx")]
        tenant_name: String,

        /// Tenant slug forwarded to the media proxy
        #[arg(long)]
        slug: Option<String>,

        /// Retrieval partition, if different from the tenant id
        #[arg(long)]
        partition: Option<String>,

        /// Custom system prompt template
        #[arg(long)]
        system_prompt: Option<String>,

        /// Ask for broad coverage across documents
        #[arg(long)]
        breadth: bool,

        /// Enable reranking
        #[arg(long)]
        rerank: bool,

        /// Prefer recent documents
        #[arg(long)]
        recent: bool,
    },

    /// Show how a query would be classified by the retrieval strategy
    Classify {
        /// The user's message
        #[arg(short, long)]
        query: String,
    },

    /// Show the effective configuration
    Config {
        /// Print the default configuration file instead
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Assemble {
            query,
            tenant_id,
            tenant_name,
            slug,
            partition,
            system_prompt,
            breadth,
            rerank,
            recent,
        } => {
            let args = commands::assemble::AssembleArgs {
                query,
                tenant_id,
                tenant_name,
                slug,
                partition,
                system_prompt,
                breadth,
                rerank,
                recent,
            };
            commands::assemble::run(args).await?
        }
        Commands::Classify { query } => commands::classify::run(&query)?,
        Commands::Config { defaults } => commands::config_cmd::run(defaults)?,
    }

    Ok(())
}
