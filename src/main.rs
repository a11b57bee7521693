use std::fs::File;
use std::sync::Mutex;

use tracing::info;
use wicket::config::{Config, LoggingConfig};
use wicket::resource::StaticFiles;
use wicket::server::Reactor;

fn init_logging(cfg: &LoggingConfig) {
    if !cfg.enabled {
        return;
    }

    let builder = tracing_subscriber::fmt().with_target(false).with_level(true);

    let Some(path) = &cfg.file else {
        builder.init();
        return;
    };

    match File::create(path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.init();
            tracing::warn!(
                file = %path.display(),
                error = %e,
                "Failed to open log file, logging to stdout"
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    init_logging(&cfg.logging);

    let resources = StaticFiles::load(&cfg.static_files.root)?;
    info!(
        root = %resources.root().display(),
        count = resources.len(),
        "Loaded static resources"
    );
    for route in resources.routes() {
        tracing::debug!("resource: {}", route);
    }

    let mut reactor = Reactor::bind(&cfg.server, resources)?;
    let shutdown = reactor.shutdown_handle();
    let mut reactor_task = tokio::task::spawn_blocking(move || reactor.run());

    tokio::select! {
        res = &mut reactor_task => {
            res??;
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            shutdown.shutdown()?;
            reactor_task.await??;
        }
    }

    Ok(())
}
