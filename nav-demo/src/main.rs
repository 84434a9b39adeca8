//! Terminal demo of the nav-nexus router over the in-memory toolkit.

mod app;
mod view;

use clap::Parser;
use nav_nexus::config;
use nav_nexus::{MemoryToolkit, RouteTree, Router, RouterHandle};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nav-demo", about = "Drive a route tree through a simulated navigation stack")]
struct Args {
    /// Config file (defaults to <config dir>/nav-nexus/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the log; the terminal belongs to the UI
    #[arg(long, default_value = "nav-demo.log")]
    log_file: PathBuf,

    /// Route to show on start, e.g. "Main/Bookmark"
    #[arg(short, long, default_value = "Login")]
    route: RouteTree,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Report logger problems now; stderr is hidden once the UI takes over.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    match File::create(&args.log_file) {
        Ok(log_file) => {
            if let Err(e) = WriteLogger::init(LevelFilter::Debug, log_config, log_file) {
                eprintln!("nav-demo: logging disabled: {e}");
            }
        }
        Err(e) => eprintln!("nav-demo: cannot create {}: {e}", args.log_file.display()),
    }

    let file = config::load_config(args.config.as_deref())?;
    let resolved = config::resolve(&file);
    log::info!("nav-demo starting with {:?}", resolved);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to start tokio: {}", e))?;

    rt.block_on(async move {
        let toolkit = Arc::new(MemoryToolkit::new(resolved.animation));
        let router = Router::for_toolkit(toolkit.clone().into(), resolved.router);
        let handle = RouterHandle::spawn(router);
        app::App::new(toolkit, handle, args.route).run().await
    })
}
