//! Corvid CLI — the main entry point.
//!
//! Commands:
//! - `start`   — Run the real-time message bot
//! - `web`     — Run the interactive-callback webhook server
//! - `serve`   — Run both in one process
//! - `rules`   — Validate a rule file and print a summary
//! - `modules` — List the linked dialog modules

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "corvid",
    about = "Corvid — a rule-driven conversational bot",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options every running mode needs.
#[derive(Args)]
struct RuntimeOpts {
    /// Path to the rule file
    #[arg(long, env = "JSON_RULES", default_value = "rules.json")]
    rules: String,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1/")]
    redis_url: String,
}

#[derive(Args)]
struct StreamOpts {
    /// Bot token for the chat platform (xoxb-...)
    #[arg(long, env = "SLACK_TOKEN")]
    slack_token: String,
}

#[derive(Args)]
struct WebOpts {
    /// Signing secret used to verify callback signatures
    #[arg(long, env = "SLACK_SIGNING_SECRET")]
    signing_secret: String,

    /// Address the webhook server binds to
    #[arg(long, env = "WEB_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the real-time message bot
    Start {
        #[command(flatten)]
        runtime: RuntimeOpts,
        #[command(flatten)]
        stream: StreamOpts,
    },

    /// Run the interactive-callback webhook server
    Web {
        #[command(flatten)]
        runtime: RuntimeOpts,
        #[command(flatten)]
        web: WebOpts,
    },

    /// Run the message bot and the webhook server in one process
    Serve {
        #[command(flatten)]
        runtime: RuntimeOpts,
        #[command(flatten)]
        stream: StreamOpts,
        #[command(flatten)]
        web: WebOpts,
    },

    /// Validate a rule file and print a summary
    Rules {
        /// Path to the rule file
        #[arg(long, env = "JSON_RULES", default_value = "rules.json")]
        rules: String,
    },

    /// List the linked dialog modules
    Modules,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Start { runtime, stream } => commands::start::run(runtime, stream).await?,
        Commands::Web { runtime, web } => commands::web::run(runtime, web).await?,
        Commands::Serve {
            runtime,
            stream,
            web,
        } => commands::serve::run(runtime, stream, web).await?,
        Commands::Rules { rules } => commands::rules::run(&rules)?,
        Commands::Modules => commands::modules::run(),
    }

    Ok(())
}
