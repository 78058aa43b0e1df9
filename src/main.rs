use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    if cfg.gateway.create_dirs {
        create_content_dirs(&cfg.gateway);
    }

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr).map_err(|e| {
        logger::log_error(&format!("Failed to bind {addr}: {e}"));
        e
    })?;
    logger::log_server_start(&addr, &cfg);

    let grace = Duration::from_secs(cfg.performance.write_timeout);
    let cfg = Arc::new(cfg);
    let ctx = Arc::new(server::ConnectionContext {
        dispatcher: Arc::new(handler::Dispatcher::new(Arc::clone(&cfg))),
        performance: cfg.performance.clone(),
        active: AtomicUsize::new(0),
    });

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    server::start_server_loop(listener, ctx, signals, grace).await;
    logger::log_info("Gateway stopped");
    Ok(())
}

/// Create the content directories so a fresh deployment starts with the expected layout
fn create_content_dirs(gateway: &config::GatewayConfig) {
    for dir in gateway.content_dirs() {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => logger::log_debug(&format!("Content directory ready: {}", dir.display())),
            Err(e) => logger::log_warning(&format!(
                "Failed to create directory '{}': {e}",
                dir.display()
            )),
        }
    }
}
