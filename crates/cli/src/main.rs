mod doctor_commands;
mod registry_commands;

use std::path::PathBuf;

use {
    anyhow::bail,
    clap::{Parser, Subcommand},
    guildlink_config::{GuildlinkConfig, Severity},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "guildlink", about = "Guildlink — cross-guild Discord chat relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./guildlink.toml etc.).
    #[arg(long, global = true, env = "GUILDLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the registry document and audit log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and relay (default when no subcommand is provided).
    Run,
    /// Inspect or edit gateway registrations while the bot is stopped.
    Gateways {
        #[command(subcommand)]
        action: registry_commands::GatewayAction,
    },
    /// Inspect or edit the banned-word list while the bot is stopped.
    BannedWords {
        #[command(subcommand)]
        action: registry_commands::BannedWordAction,
    },
    /// Validate the configuration and the registry document.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Explicit `--config` must load; discovery falls back to defaults.
fn load_config(cli: &Cli) -> anyhow::Result<GuildlinkConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = guildlink_config::load_config(path)?;
            guildlink_config::apply_env_overrides(&mut config);
            config
        },
        None => guildlink_config::discover_and_load(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

async fn run(config: GuildlinkConfig) -> anyhow::Result<()> {
    let diagnostics = guildlink_config::validate(&config);
    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        bail!("configuration has {errors} error(s); run `guildlink doctor` for details");
    }

    guildlink_discord::run(&config).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "guildlink starting");

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::Gateways { action }) => {
            registry_commands::handle_gateways(action, &config).await
        },
        Some(Commands::BannedWords { action }) => {
            registry_commands::handle_banned_words(action, &config).await
        },
        Some(Commands::Doctor) => doctor_commands::handle_doctor(&config).await,
    }
}
