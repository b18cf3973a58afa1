use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ProxyConfig, ProxyError, Result};

#[derive(Parser, Debug)]
#[command(name = "tcpbridge", version = env!("TCPBRIDGE_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
/// Relays every TCP connection accepted on a local port to a fixed target.
pub struct Opts {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a TCP proxy
    Start(StartArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct StartArgs {
    /// Port to listen on
    #[arg(long, short = 'p', required_unless_present = "config")]
    pub port: Option<u16>,

    /// Host the proxy connects to
    #[arg(long)]
    pub target_host: Option<String>,

    /// Port the proxy connects to
    #[arg(long)]
    pub target_port: Option<u16>,

    /// Address to bind the listen socket to
    #[arg(long)]
    pub listen_host: Option<String>,

    /// Print every proxied message
    #[arg(long, value_name = "BOOL")]
    pub verbose: Option<bool>,

    /// Enable debug logs
    #[arg(long, value_name = "BOOL")]
    pub debug: Option<bool>,

    /// Trace every socket read and write
    #[arg(long, value_name = "BOOL")]
    pub wiretap: Option<bool>,

    /// Size of the forwarding buffer of each direction, in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Give up dialing the target after this many milliseconds (0 waits forever)
    #[arg(long)]
    pub dial_timeout_ms: Option<u64>,

    /// Load defaults from this configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl StartArgs {
    /// Build the run configuration: file values first, then command-line overrides.
    pub fn into_config(self) -> Result<ProxyConfig> {
        let base = match &self.config {
            // confy would write a defaults file at a missing path.
            Some(path) if !path.exists() => {
                return Err(ProxyError::InvalidConfig(format!("{}: no such file", path.display())));
            }
            Some(path) => confy::load_path::<ProxyConfig>(path)
                .map_err(|err| ProxyError::InvalidConfig(format!("{}: {}", path.display(), err)))?,
            None => ProxyConfig::default(),
        };

        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(host) = self.target_host {
            config.target_host = host;
        }
        if let Some(port) = self.target_port {
            config.target_port = port;
        }
        if let Some(host) = self.listen_host {
            config.listen_host = host;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(wiretap) = self.wiretap {
            config.wiretap = wiretap;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(ms) = self.dial_timeout_ms {
            config.dial_timeout_ms = ms;
        }
        config
    }
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter(config: &ProxyConfig) -> String {
    let mut directives = if config.debug {
        "tcpbridge=debug".to_string()
    } else {
        "tcpbridge=info".to_string()
    };
    if config.wiretap {
        directives.push_str(",tcpbridge::adapters::tcp_server::wiretap=trace");
    }
    directives
}
