use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use tcpbridge::adapters::{ConsoleListener, SessionTracker, TcpConnector, TcpProxyServer};
use tcpbridge::cli::{default_log_filter, Command, Opts};
use tcpbridge::domain::{ProxyConfig, ProxyService};
use tcpbridge::ports::{ConnectorPort, ProxyListener, TrackingPort};

fn init_logging(config: &ProxyConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter(config)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();
    let Command::Start(args) = opts.command;
    let config = Arc::new(args.into_config()?);

    init_logging(&config);

    match rlimit::increase_nofile_limit(u64::MAX) {
        Ok(limit) => debug!(limit, "raised open file limit"),
        Err(err) => warn!(error = %err, "could not raise open file limit"),
    }

    let tracker = Arc::new(SessionTracker::new());
    tracker.start_cleanup();

    let connector: Arc<dyn ConnectorPort> = Arc::new(TcpConnector::from_config(&config));
    let listener: Arc<dyn ProxyListener> = Arc::new(ConsoleListener::from_config(&config));
    let tracking: Arc<dyn TrackingPort> = tracker;

    let service = Arc::new(ProxyService::new(config, connector, listener, tracking));
    let mut server = TcpProxyServer::new(service);

    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to wait for Ctrl-C");
            }
        })
        .await?;

    Ok(())
}
