// Server loop module
// Accepts connections until shutdown, then waits for in-flight connections

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionContext};
use super::signal::SignalHandler;
use crate::logger;

/// Interval between checks of the active connection counter while draining
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop until a shutdown signal arrives.
///
/// After shutdown no new connections are accepted; active ones get up to
/// `grace` to finish before the function returns.
pub async fn start_server_loop(
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    signals: Arc<SignalHandler>,
    grace: Duration,
) {
    loop {
        tokio::select! {
            biased;

            () = signals.shutdown.notified() => {
                logger::log_info("Shutdown requested, no longer accepting connections");
                break;
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &ctx),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
        }
    }

    drop(listener);
    drain_connections(&ctx, grace).await;
}

async fn drain_connections(ctx: &ConnectionContext, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let active = ctx.active.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_info("All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Grace period elapsed with {active} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
