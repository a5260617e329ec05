use anyhow::Context;
use clap::{Parser, Subcommand};
use gradualflow::runner::{process_file, Destination};
use gradualflow::{init_logging, ModifyService, SettingsFile, SettingsStore, SvgDumpObserver};
use gradualflow_settings::default_settings_path;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("GRADUALFLOW_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "gradualflow", version = LONG_VERSION, about)]
struct Cli {
    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process request files with the settings of one client
    Process {
        /// Settings file (.toml or .json); defaults to the user config dir
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Client whose settings apply
        #[arg(long)]
        client: Uuid,

        /// Write before/after SVGs of every batch here
        #[arg(long)]
        svg_dir: Option<PathBuf>,

        /// Directory for `<name>.out.json` responses
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Request files (JSON)
        #[arg(required = true)]
        requests: Vec<PathBuf>,
    },

    /// Validate a settings file and list its clients
    CheckSettings {
        /// Settings file; defaults to the user config dir
        file: Option<PathBuf>,
    },
}

fn settings_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_settings_path().context("No settings file given and no config directory found"),
    }
}

fn load_settings(path: &Path) -> anyhow::Result<SettingsFile> {
    SettingsFile::load_from_file(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

async fn process(
    settings: Option<PathBuf>,
    client: Uuid,
    svg_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    requests: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let path = settings_path(settings)?;
    let store = Arc::new(SettingsStore::from_file(load_settings(&path)?));
    if !store.contains(client) {
        tracing::warn!("Client {} has no entry in {}", client, path.display());
    }

    let mut service = ModifyService::new(store);
    if let Some(dir) = svg_dir {
        service.register_observer(Arc::new(SvgDumpObserver::new(dir)));
    }
    let service = Arc::new(service);

    let destination = match output_dir {
        None if requests.len() == 1 => Destination::Stdout,
        dir => {
            if let Some(dir) = &dir {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            Destination::File(dir)
        }
    };

    let total = requests.len();
    let tasks: Vec<_> = requests
        .into_iter()
        .map(|input| {
            let service = Arc::clone(&service);
            let destination = destination.clone();
            tokio::task::spawn_blocking(move || process_file(&service, client, &input, &destination))
        })
        .collect();

    let mut failures = 0;
    for task in tasks {
        if let Err(e) = task.await? {
            tracing::error!("{:#}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} request file(s) failed", failures, total);
    }
    tracing::info!("Processed {} request file(s)", total);
    Ok(())
}

fn check_settings(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = settings_path(file)?;
    let settings = load_settings(&path)?;

    println!("{}: {} client(s)", path.display(), settings.clients.len());
    for (client, s) in &settings.clients {
        println!(
            "  {}  enabled={} max_flow_acceleration={} layer_0_max_flow_acceleration={} step={} reset_flow_each_layer={}",
            client,
            s.gradual_flow_enabled,
            s.max_flow_acceleration,
            s.layer_0_max_flow_acceleration,
            s.gradual_flow_discretisation_step_size,
            s.reset_flow_each_layer
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    match cli.command {
        Command::Process {
            settings,
            client,
            svg_dir,
            output_dir,
            requests,
        } => process(settings, client, svg_dir, output_dir, requests).await,
        Command::CheckSettings { file } => check_settings(file),
    }
}
