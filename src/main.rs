//! GameCamp command-line front end.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use gamecamp::config::loader;
use gamecamp::system::read_kernel_release;
use gamecamp::{
    AppConfig, AppError, DriverOrchestrator, LogCollector, SimulatedShell, StatusStore, SuShell,
    SystemWrapper, VERSION,
};

#[derive(Parser)]
#[command(name = "gamecamp")]
#[command(about = "GameCamp - kernel driver loader for rooted Android devices", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Settings file (default: ~/.config/gamecamp/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding drivers/<family>/<script>.sh
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Use the simulated shell; nothing is executed
    #[arg(long)]
    simulate: bool,

    /// Pretend the device runs this kernel release
    #[arg(long)]
    kernel: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted driver status
    Status,

    /// List drivers and their scripts
    Drivers,

    /// Show which script matches the running kernel
    Match {
        #[arg(long)]
        driver: Option<String>,
    },

    /// Install a driver for the running kernel
    Install {
        #[arg(long)]
        driver: Option<String>,
    },

    /// Remove the installed driver and reboot
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show kernel, SELinux, device and build information
    Info,

    /// Show or change the game assistant toggles
    Assistant {
        #[arg(long)]
        anti_screen_recording: Option<bool>,

        #[arg(long)]
        no_background_mode: Option<bool>,

        #[arg(long)]
        single_transparent_mode: Option<bool>,
    },
}

fn load_config(cli: &Cli) -> AppConfig {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => match loader::get_global_settings_path() {
            Ok(path) => Some(path),
            Err(e) => {
                eprintln!("[Main] [WARNING] {}", e);
                None
            }
        },
    };
    let mut config = path
        .map(|p| loader::load_or_default(&p))
        .unwrap_or_default();

    if let Some(assets) = &cli.assets {
        config.assets_dir = assets.clone();
    }
    if cli.simulate {
        config.simulate = true;
    }
    if let Some(kernel) = &cli.kernel {
        config.kernel_version_override = Some(kernel.clone());
    }
    config
}

fn init_logging(config: &AppConfig) -> Option<LogCollector> {
    let collector = match LogCollector::new(config.logs_dir.clone(), None) {
        Ok(collector) => collector.with_max_level(config.log_level()),
        Err(e) => {
            eprintln!("[Main] [WARNING] LogCollector initialization failed: {}", e);
            return None;
        }
    };

    if let Err(e) = log::set_boxed_logger(Box::new(collector.clone()))
        .map(|()| log::set_max_level(config.log_level()))
    {
        eprintln!("[Main] [WARNING] Failed to set LogCollector as global logger: {}", e);
    }
    Some(collector)
}

fn build_system(config: &AppConfig) -> Arc<dyn SystemWrapper> {
    if config.simulate {
        let kernel = config
            .kernel_version_override
            .clone()
            .unwrap_or_else(read_kernel_release);
        log::info!("[Main] Using simulated shell (kernel {})", kernel);
        Arc::new(SimulatedShell::new(kernel))
    } else {
        Arc::new(
            SuShell::new(config.su_binary.clone())
                .with_drain_timeout(config.drain_timeout())
                .with_kernel_release(config.kernel_version_override.clone()),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);
    let collector = init_logging(&config);
    gamecamp::log_info!("GameCamp {} starting", VERSION);

    let store = match StatusStore::open(&config.status_path) {
        Ok(store) => Arc::new(store),
        Err(e) => anyhow::bail!(AppError::from(e).user_message()),
    };
    let system = build_system(&config);
    let orchestrator = DriverOrchestrator::from_config(&config, Arc::clone(&system), store);

    let session = match &cli.command {
        Commands::Install { .. } => Some("install"),
        Commands::Reset { .. } => Some("reset"),
        _ => None,
    };
    if let (Some(kind), Some(collector)) = (session, &collector) {
        let filename = format!("{}_{}.log", kind, chrono::Local::now().format("%Y%m%d_%H%M%S"));
        match collector.start_new_session(&filename) {
            Ok(path) => log::info!("[Main] Session log: {}", path.display()),
            Err(e) => eprintln!("[Main] [WARNING] {}", e),
        }
    }

    let outcome = match cli.command {
        Commands::Status => commands::status(&orchestrator).await,
        Commands::Drivers => commands::drivers(&orchestrator),
        Commands::Match { driver } => commands::show_match(&orchestrator, driver),
        Commands::Install { driver } => commands::install(orchestrator, driver).await,
        Commands::Reset { yes } => commands::reset(orchestrator, yes).await,
        Commands::Info => commands::info(system).await,
        Commands::Assistant {
            anti_screen_recording,
            no_background_mode,
            single_transparent_mode,
        } => commands::assistant(
            &orchestrator,
            anti_screen_recording,
            no_background_mode,
            single_transparent_mode,
        ),
    };

    if let Some(collector) = collector {
        if let Err(e) = collector.wait_for_empty().await {
            eprintln!("[Main] [WARNING] Failed to flush logs: {}", e);
        }
    }

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => Err(e),
    }
}
