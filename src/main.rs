//! mxl - video matrix switcher control
//!
//! Usage:
//!   mxl                        Run the interactive shell
//!   mxl switch 3 1,2,5         Route input 3 to outputs 1, 2 and 5
//!   mxl connection show        Print transport settings
//!   mxl --help                 Everything else

use anyhow::{Context, Result};
use clap::Parser;
use matrix_link::app::App;
use matrix_link::cli::{Action, Cli, TopCommand};
use matrix_link::config::{self, Config};
use matrix_link::instance_lock::InstanceLock;
use matrix_link::sender::CommandSender;
use matrix_link::state::Store;
use matrix_link::transport::TransportKind;
use matrix_link::{commands, logging, shell};
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let cfg = config::load(&config_path);
    let state_path = cfg.state_path(&config_path);

    // Create tokio runtime
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(run(cli.command, cfg, state_path))
}

async fn run(command: Option<TopCommand>, cfg: Config, state_path: PathBuf) -> Result<()> {
    // One process at a time owns the state document
    let _lock = InstanceLock::acquire(&state_path)?;

    let store = Store::open(&state_path)?;
    let sender = CommandSender::system(cfg.sender_options());
    let mut app = App::new(store, sender, cfg.logs.max_entries);

    match command {
        None | Some(TopCommand::Shell) => {
            println!("mxl shell, state: {}", state_path.display());
            shell::run(&mut app).await?;
            Ok(())
        }
        Some(TopCommand::Action(action)) => run_once(&mut app, action).await,
    }
}

/// One-shot action; with serial active the port is opened for this call only
async fn run_once(app: &mut App, action: Action) -> Result<()> {
    let serial = app.connection().active_type == TransportKind::Serial
        && commands::needs_transport(&action);
    if serial {
        app.connect_serial(None).await?;
    }

    let result = commands::execute(app, action).await;

    if serial {
        app.disconnect_serial()?;
    }
    println!("{}", result?);
    Ok(())
}
