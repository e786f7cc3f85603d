//! # linekv - An In-Memory Key-Value Store
//!
//! linekv is an in-memory key-value store that speaks a line-oriented text
//! protocol modelled on Redis: requests are whitespace-separated inline
//! commands, replies use RESP framing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              linekv                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │──> Config        │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │              StorageEngine                   │   │
//! │  │   Parser    │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use linekv::{handle_connection, CommandHandler, Config, ConnectionStats, StorageEngine};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::new());
//!     let config = Arc::new(Config::default());
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:1234").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&storage), Arc::clone(&config));
//!         let stats = Arc::clone(&stats);
//!
//!         tokio::spawn(handle_connection(stream, addr, handler, stats));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [message]`
//! - `ECHO message`
//! - `SET key value [PX milliseconds]`
//! - `GET key`
//! - `CONFIG GET dir|dbfilename`
//!
//! ## Module Overview
//!
//! - [`protocol`]: Request line parser and reply types
//! - [`storage`]: Thread-safe storage engine with lazy expiry
//! - [`commands`]: Command validation and execution
//! - [`connection`]: Client connection management
//! - [`config`]: Command-line arguments and server configuration
//!
//! ## Expiry
//!
//! Expiry is lazy: a key past its deadline is removed the next time it is
//! read. There is no background sweeper.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

pub use commands::{Command, CommandError, CommandHandler};
pub use config::{CliArgs, Config};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_line, ParseError, RespValue};
pub use storage::StorageEngine;

/// The default port linekv listens on
pub const DEFAULT_PORT: u16 = 1234;

/// The default host linekv binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of linekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
