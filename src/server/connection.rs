// Connection handling module
// Accepts a single TCP connection and serves it with the dispatcher

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::PerformanceConfig;
use crate::handler::Dispatcher;
use crate::logger;

/// Shared by every connection worker
pub struct ConnectionContext {
    pub dispatcher: Arc<Dispatcher>,
    pub performance: PerformanceConfig,
    pub active: AtomicUsize,
}

/// Accept and process a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `ctx` - Dispatcher, limits and the active connection counter
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: &Arc<ConnectionContext>) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = ctx.active.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = ctx.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            ctx.active.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(ctx));
}

/// Serve one connection in its own task.
///
/// A keep-alive connection, every request on it included, lives at most
/// `keep_alive_timeout` seconds. With keep-alive disabled the single request
/// is bounded by the larger of the read and write timeouts.
fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<ConnectionContext>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = connection_lifetime(&ctx.performance);

        let mut builder = http1::Builder::new();
        builder.keep_alive(ctx.performance.keep_alive_timeout > 0);

        let dispatcher = Arc::clone(&ctx.dispatcher);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { Ok::<_, Infallible>(dispatcher.handle(req, peer_addr).await) }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        ctx.active.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Upper bound on how long one connection may stay open
pub fn connection_lifetime(performance: &PerformanceConfig) -> Duration {
    if performance.keep_alive_timeout > 0 {
        Duration::from_secs(performance.keep_alive_timeout)
    } else {
        Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lifetime() {
        let mut performance = PerformanceConfig::default();
        assert_eq!(connection_lifetime(&performance), Duration::from_secs(75));

        performance.keep_alive_timeout = 0;
        performance.read_timeout = 10;
        performance.write_timeout = 45;
        assert_eq!(connection_lifetime(&performance), Duration::from_secs(45));
    }
}
