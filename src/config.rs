//! Server configuration.
//!
//! Built once at startup from command-line arguments and shared read-only
//! afterwards. `dir` and `dbfilename` are only reported through
//! `CONFIG GET`; nothing is ever read from or written to them.

use clap::Parser;

/// Command-line arguments for the server
#[derive(Parser, Debug, Clone)]
#[command(name = "linekv")]
#[command(version, about = "An in-memory key-value store with a Redis-like text protocol", long_about = None)]
pub struct CliArgs {
    /// Host to bind to
    #[arg(long, default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Directory for database files (reported by CONFIG GET dir)
    #[arg(long, default_value = "")]
    pub dir: String,

    /// Database file name (reported by CONFIG GET dbfilename)
    #[arg(long, default_value = "")]
    pub dbfilename: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Immutable server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub dir: String,
    pub dbfilename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            dir: String::new(),
            dbfilename: String::new(),
        }
    }
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            dir: args.dir,
            dbfilename: args.dbfilename,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            anyhow::bail!("host must not be empty");
        }

        if self.port == 0 {
            anyhow::bail!("port must be > 0");
        }

        Ok(())
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Looks up a parameter exposed through `CONFIG GET`.
    ///
    /// Names match case-insensitively. Returns the canonical parameter name
    /// with its value, or `None` for parameters that are not exposed.
    pub fn get(&self, name: &str) -> Option<(&'static str, &str)> {
        if name.eq_ignore_ascii_case("dir") {
            Some(("dir", &self.dir))
        } else if name.eq_ignore_ascii_case("dbfilename") {
            Some(("dbfilename", &self.dbfilename))
        } else {
            None
        }
    }
}
