use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::{ProxyConfig, ProxyError, Result};
use crate::ports::ProxyListener;

/// Prints one line per proxy event to a writer, stdout by default.
pub struct ConsoleListener {
    port: u16,
    target_host: String,
    target_port: u16,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleListener {
    pub fn new(port: u16, target_host: impl Into<String>, target_port: u16, writer: Box<dyn Write + Send>) -> Self {
        Self {
            port,
            target_host: target_host.into(),
            target_port,
            writer: Mutex::new(writer),
        }
    }

    /// Writes to stdout when `config.verbose` is set, and discards output otherwise.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let writer: Box<dyn Write + Send> = if config.verbose {
            Box::new(io::stdout())
        } else {
            Box::new(io::sink())
        };
        Self::new(config.listen_port, config.target_host.clone(), config.target_port, writer)
    }

    fn line(&self, args: std::fmt::Arguments<'_>) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ProxyError::Io("console writer poisoned".to_string()))?;
        writer.write_fmt(args)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ProxyListener for ConsoleListener {
    fn on_start(&self) -> Result<()> {
        self.line(format_args!(
            "Redirecting port {} to {}:{}",
            self.port, self.target_host, self.target_port
        ))
    }

    fn on_stop(&self) -> Result<()> {
        self.line(format_args!("Stopping connection"))
    }

    fn on_request(&self, message: &[u8]) -> Result<()> {
        self.line(format_args!("Received request message: {}", String::from_utf8_lossy(message)))
    }

    fn on_response(&self, message: &[u8]) -> Result<()> {
        self.line(format_args!("Received response message: {}", String::from_utf8_lossy(message)))
    }
}
