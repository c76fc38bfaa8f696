//! Wizard CLI — the operator entry point.
//!
//! Commands:
//! - `onboard`      — initialize config and workspace
//! - `gateway`      — start the HTTP gateway server
//! - `dispatch`     — run the three-stage command dispatcher once, locally
//! - `status`       — query a running gateway's `/api/status`
//! - `rate-limits`  — query a running gateway's `/api/rate-limits`
//! - `devices pair` — complete a device pairing against a running gateway
//! - `sync`         — trigger an external sync against a running gateway
//! - `contract`     — test router-contract decisions locally
//! - `policy`       — test secret-detection locally
//! - `usage`        — cost tracking, pricing, and budget info
//! - `config`       — configuration management
//! - `providers`    — list configured completion backends
//! - `doctor`       — diagnose system health
//! - `completions`  — generate shell completions
//! - `version`      — show detailed version info

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

mod commands;

#[derive(Parser)]
#[command(
    name = "wizard",
    about = "Wizard — an edge gateway for offline-first device fleets. Local-first completions, per-device rate limiting, and external sync, all behind one bearer-authenticated API.",
    version,
    author = "Wizard Contributors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and workspace
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the host (e.g. 0.0.0.0 for containers)
        #[arg(long)]
        host: Option<String>,
    },

    /// Run the three-stage command dispatcher once, locally
    Dispatch {
        /// Raw input to dispatch (prefix with `--dispatch-debug ` for a route trace)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },

    /// Query a running gateway's status snapshot
    Status {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },

    /// Query a running gateway's rate-limit snapshot for this caller
    RateLimits {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },

    /// Device pairing against a running gateway
    Devices {
        #[command(subcommand)]
        action: DevicesAction,
    },

    /// Trigger an external sync against a running gateway
    Sync {
        /// calendar | email | jira | linear | slack | all | status
        kind: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "core")]
        mission_id: String,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        channel_id: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Router-contract decisions (§4.2 step 5)
    Contract {
        #[command(subcommand)]
        action: ContractAction,
    },

    /// Secret-detection / redaction checks (§4.4 rule 3)
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Usage, cost tracking, and budget management
    Usage {
        #[command(subcommand)]
        action: UsageAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List configured completion backends
    Providers,

    /// Diagnose system health
    Doctor,

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show detailed version and build info
    Version,
}

#[derive(Subcommand)]
enum DevicesAction {
    /// Complete a pairing code against a running gateway
    Pair {
        /// The pairing code shown by the gateway
        code: String,
        #[arg(long, default_value = "cli")]
        display_name: String,
        #[arg(long, default_value = "cli")]
        device_type: String,
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ContractAction {
    /// Evaluate a router contract for a hypothetical request
    Test {
        /// code | test | docs | design | ops
        #[arg(long, default_value = "code")]
        intent: String,
        #[arg(long, default_value = "conversation")]
        mode: String,
        #[arg(long, default_value = "internal")]
        privacy: String,
        #[arg(long)]
        ghost_mode: bool,
        #[arg(long)]
        offline_required: bool,
        #[arg(long)]
        force_cloud: bool,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Scan text for secrets and print the redacted form
    Scan { text: String },
}

#[derive(Subcommand)]
enum UsageAction {
    /// List available model pricing
    Pricing,
    /// Show configured budgets
    Budgets,
    /// Estimate cost for a model and token count
    Estimate {
        model: String,
        #[arg(short, long, default_value = "1000")]
        input_tokens: u32,
        #[arg(short, long, default_value = "500")]
        output_tokens: u32,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the current configuration
    Validate,
    /// Show the resolved configuration
    Show,
    /// Show the config file path
    Path,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
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
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port, host } => commands::gateway::run(port, host).await?,
        Commands::Dispatch { input } => commands::dispatch::run(&input.join(" ")).await?,

        Commands::Status { url, token } => commands::remote::status(url, token).await?,
        Commands::RateLimits { url, token } => commands::remote::rate_limits(url, token).await?,

        Commands::Devices { action } => match action {
            DevicesAction::Pair {
                code,
                display_name,
                device_type,
                url,
            } => commands::remote::pair(url, &code, &display_name, &device_type).await?,
        },

        Commands::Sync {
            kind,
            url,
            token,
            mission_id,
            query,
            channel_id,
            limit,
        } => commands::remote::sync(url, token, &kind, &mission_id, query, channel_id, limit).await?,

        Commands::Contract { action } => match action {
            ContractAction::Test {
                intent,
                mode,
                privacy,
                ghost_mode,
                offline_required,
                force_cloud,
            } => commands::contract::test(&intent, &mode, &privacy, ghost_mode, offline_required, force_cloud)?,
        },

        Commands::Policy { action } => match action {
            PolicyAction::Scan { text } => commands::policy::scan(&text),
        },

        Commands::Usage { action } => match action {
            UsageAction::Pricing => commands::usage::pricing(),
            UsageAction::Budgets => commands::usage::budgets().await?,
            UsageAction::Estimate {
                model,
                input_tokens,
                output_tokens,
            } => commands::usage::estimate(&model, input_tokens, output_tokens),
        },

        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },

        Commands::Providers => commands::providers::run().await?,
        Commands::Doctor => commands::doctor::run().await?,

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "wizard", &mut std::io::stdout());
        }

        Commands::Version => {
            println!("Wizard v{}", env!("CARGO_PKG_VERSION"));
            println!("   Arch:    {}", std::env::consts::ARCH);
            println!("   OS:      {}", std::env::consts::OS);
            println!("   Rust:    compiled with edition 2024");
            println!("   License: MIT");
        }
    }

    Ok(())
}
