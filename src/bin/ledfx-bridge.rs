use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ledfx_bridge::config::Config;
use ledfx_bridge::registry::EntityDescriptor;
use ledfx_bridge::{diagnostics, entity, verify_access, Action, Controller, EntityKind, Scheduler, TurnOn, Updater};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ledfx-bridge")]
#[command(about = "Mirror a LedFx server as a set of typed entities", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    #[arg(long, env = "LEDFX_BRIDGE_CONFIG")]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the server answers its config endpoint.
    Check,
    /// Poll until interrupted, logging entities as they appear.
    Poll,
    /// Run one cycle and print the entities with the diagnostics report.
    Dump,
    /// Print the effective configuration, credentials redacted.
    Config,
    /// Run one cycle, then perform an action on an entity.
    Perform(PerformOpts),
    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(clap::Args, Debug)]
struct PerformOpts {
    /// Entity kind, e.g. `light` or `select`.
    kind: String,
    /// Entity key, e.g. `wled` or `wled_gradient_name`.
    key: String,
    #[command(subcommand)]
    action: ActionOpts,
}

#[derive(Subcommand, Debug)]
enum ActionOpts {
    TurnOn {
        #[arg(long)]
        effect: Option<String>,
        #[arg(long)]
        brightness: Option<u8>,
    },
    TurnOff,
    /// JSON value, e.g. `0.5` or `true`.
    SetValue { value: String },
    Select { option: String },
    Press,
    Play,
    Pause,
}

impl ActionOpts {
    fn into_action(self) -> Result<Action> {
        Ok(match self {
            ActionOpts::TurnOn { effect, brightness } => Action::TurnOn(TurnOn {
                effect,
                brightness,
                rgbw: None,
            }),
            ActionOpts::TurnOff => Action::TurnOff,
            ActionOpts::SetValue { value } => {
                Action::SetValue(serde_json::from_str(&value).with_context(|| format!("Invalid value: {}", value))?)
            }
            ActionOpts::Select { option } => Action::SelectOption(option),
            ActionOpts::Press => Action::Press,
            ActionOpts::Play => Action::Play,
            ActionOpts::Pause => Action::Pause,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "ledfx-bridge", &mut std::io::stdout());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Check => run_check(&config).await?,
        Commands::Poll => run_poll(&config).await?,
        Commands::Dump => run_dump(&config).await?,
        Commands::Config => print!("{}", toml::to_string_pretty(&config.redacted())?),
        Commands::Perform(opts) => run_perform(&config, opts).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    let code = verify_access(config).await;
    println!("{}: {}", config.address(), code);

    if !code.is_success() {
        return Err(anyhow!("{} did not accept the connection", config.address()));
    }
    Ok(())
}

async fn run_poll(config: &Config) -> Result<()> {
    let updater = Arc::new(Updater::from_config(config, false)?);

    for kind in EntityKind::ALL {
        let known = updater.subscribe(
            kind,
            Arc::new(move |descriptor: &EntityDescriptor| {
                tracing::info!("New {}: {} ({})", kind, descriptor.key, descriptor.metadata.name);
            }),
        );
        for descriptor in known {
            tracing::debug!("Known {}: {}", kind, descriptor.key);
        }
    }

    let scheduler = Scheduler::spawn(updater.clone());
    scheduler.refresh_now().await;
    println!("Polling {} every {}s, Ctrl-C to stop", config.address(), config.scan_interval);

    tokio::signal::ctrl_c().await?;
    scheduler.stop().await;

    Ok(())
}

async fn run_dump(config: &Config) -> Result<()> {
    let updater = Updater::from_config(config, false)?;
    let outcome = updater.refresh().await;
    tracing::debug!("Cycle finished: {:?}", outcome);

    let entities = updater.read(entity::snapshot);
    println!("{}", serde_json::to_string_pretty(&entities)?);
    println!("{}", serde_json::to_string_pretty(&diagnostics::report(config, &updater))?);

    updater.stop();
    Ok(())
}

async fn run_perform(config: &Config, opts: PerformOpts) -> Result<()> {
    let kind = EntityKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == opts.kind)
        .ok_or_else(|| anyhow!("Unknown entity kind: {}", opts.kind))?;
    let action = opts.action.into_action()?;

    let updater = Arc::new(Updater::from_config(config, false)?);
    updater.refresh().await;

    let controller = Controller::new(updater.clone());
    controller.perform(kind, &opts.key, action).await?;

    let view = updater.read(|state| {
        state
            .registry
            .get(kind, &opts.key)
            .map(|descriptor| entity::view(state, descriptor))
    });
    if let Some(view) = view {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }

    updater.stop();
    Ok(())
}
