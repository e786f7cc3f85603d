//! Command Handler
//!
//! Executes parsed commands against the storage engine and the server
//! configuration, producing one reply per command.
//!
//! ## Supported Commands
//!
//! - `PING [message]` - Test connection
//! - `ECHO message` - Echo message
//! - `SET key value [PX milliseconds]` - Set a key, optionally expiring
//! - `GET key` - Get a key's value
//! - `CONFIG GET parameter` - Read `dir` or `dbfilename`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│  dispatch() │───>│   cmd_*()   │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                 StorageEngine + Config      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::command::{Command, CommandError};
use crate::config::Config;
use crate::protocol::RespValue;
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Executes commands. Holds no per-call state, so one clone per connection is fine.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
    config: Arc<Config>,
}

impl CommandHandler {
    /// Creates a new command handler over shared storage and configuration.
    pub fn new(storage: Arc<StorageEngine>, config: Arc<Config>) -> Self {
        Self { storage, config }
    }

    /// Executes one tokenized request line and returns the reply.
    ///
    /// Every failure is reported as an error reply; nothing here is fatal
    /// to the connection.
    pub fn execute(&self, tokens: &[Bytes]) -> RespValue {
        match Command::parse(tokens) {
            Ok(command) => self.dispatch(command),
            Err(err) => err.into(),
        }
    }

    /// Runs a validated command.
    pub fn dispatch(&self, command: Command) -> RespValue {
        match command {
            Command::Ping(message) => self.cmd_ping(message),
            Command::Echo(message) => self.cmd_echo(message),
            Command::Set { key, value, ttl } => self.cmd_set(key, value, ttl),
            Command::Get { key } => self.cmd_get(&key),
            Command::ConfigGet { name } => self.cmd_config_get(&name),
            Command::Unknown(verb) => CommandError::UnknownCommand(verb).into(),
        }
    }

    /// PING [message]
    fn cmd_ping(&self, message: Option<Bytes>) -> RespValue {
        match message {
            Some(msg) => RespValue::bulk_string(msg),
            None => RespValue::pong(),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, message: Option<Bytes>) -> RespValue {
        match message {
            Some(msg) => RespValue::bulk_string(msg),
            None => RespValue::null(),
        }
    }

    /// SET key value [PX milliseconds]
    fn cmd_set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> RespValue {
        self.storage.set(key, value, ttl);
        RespValue::ok()
    }

    /// GET key
    fn cmd_get(&self, key: &Bytes) -> RespValue {
        match self.storage.get(key) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        }
    }

    /// CONFIG GET parameter
    fn cmd_config_get(&self, name: &[u8]) -> RespValue {
        let name = String::from_utf8_lossy(name);

        match self.config.get(&name) {
            Some((param, value)) => RespValue::array(vec![
                RespValue::bulk_string(Bytes::from_static(param.as_bytes())),
                RespValue::bulk_string(Bytes::copy_from_slice(value.as_bytes())),
            ]),
            None => RespValue::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn create_handler() -> CommandHandler {
        let config = Config {
            dir: "/tmp/redis-files".to_string(),
            dbfilename: "dump.rdb".to_string(),
            ..Config::default()
        };
        CommandHandler::new(Arc::new(StorageEngine::new()), Arc::new(config))
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn run(handler: &CommandHandler, args: &[&str]) -> Vec<u8> {
        handler.execute(&make_command(args)).serialize()
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["PING"]), b"+PONG\r\n");
        assert_eq!(run(&handler, &["ping", "hello"]), b"$5\r\nhello\r\n");
    }

    #[test]
    fn test_echo() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["ECHO", "Hey"]), b"$3\r\nHey\r\n");
        assert_eq!(run(&handler, &["echo", "a", "b"]), b"$3\r\na b\r\n");
    }

    #[test]
    fn test_echo_without_argument_is_nil() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["ECHO"]), b"$-1\r\n");
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "foo", "bar"]), b"+OK\r\n");
        assert_eq!(run(&handler, &["GET", "foo"]), b"$3\r\nbar\r\n");
    }

    #[test]
    fn test_keys_and_values_keep_their_case() {
        let handler = create_handler();

        run(&handler, &["set", "Name", "Alice"]);
        assert_eq!(run(&handler, &["get", "Name"]), b"$5\r\nAlice\r\n");
        assert_eq!(run(&handler, &["get", "name"]), b"$-1\r\n");
    }

    #[test]
    fn test_get_nonexistent() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["GET", "nonexistent"]), b"$-1\r\n");
    }

    #[test]
    fn test_set_px_expires() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "foo", "bar", "PX", "100"]), b"+OK\r\n");
        assert_eq!(run(&handler, &["GET", "foo"]), b"$3\r\nbar\r\n");

        thread::sleep(Duration::from_millis(150));

        assert_eq!(run(&handler, &["GET", "foo"]), b"$-1\r\n");
        assert!(!handler.storage.is_resident(&Bytes::from("foo")));
        assert_eq!(run(&handler, &["GET", "foo"]), b"$-1\r\n");
    }

    #[test]
    fn test_set_bad_px_never_expires() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "foo", "bar", "PX", "soon"]), b"+OK\r\n");
        let entry = handler.storage.peek_entry(&Bytes::from("foo")).unwrap();
        assert_eq!(entry.expires_at, None);
    }

    #[test]
    fn test_set_overwrites_expiry() {
        let handler = create_handler();

        run(&handler, &["SET", "k", "v1", "PX", "20"]);
        run(&handler, &["SET", "k", "v2"]);

        thread::sleep(Duration::from_millis(50));

        assert_eq!(run(&handler, &["GET", "k"]), b"$2\r\nv2\r\n");
    }

    #[test]
    fn test_wrong_arity() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["SET", "k"]),
            b"-ERR wrong number of arguments for 'set' command\r\n"
        );
        assert_eq!(
            run(&handler, &["GET"]),
            b"-ERR wrong number of arguments for 'get' command\r\n"
        );
        assert_eq!(
            run(&handler, &["CONFIG", "GET"]),
            b"-ERR wrong number of arguments for 'config' command\r\n"
        );
    }

    #[test]
    fn test_set_syntax_error() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "k", "v", "EX", "1"]), b"-ERR syntax error\r\n");
        assert_eq!(run(&handler, &["GET", "k"]), b"$-1\r\n");
    }

    #[test]
    fn test_config_get() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["CONFIG", "GET", "dir"]),
            b"*2\r\n$3\r\ndir\r\n$16\r\n/tmp/redis-files\r\n"
        );
        assert_eq!(
            run(&handler, &["config", "get", "dbfilename"]),
            b"*2\r\n$10\r\ndbfilename\r\n$8\r\ndump.rdb\r\n"
        );
        assert_eq!(run(&handler, &["CONFIG", "GET", "maxmemory"]), b"$-1\r\n");
    }

    #[test]
    fn test_config_unknown_subcommand() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["CONFIG", "SET", "dir"]),
            b"-ERR unknown subcommand 'SET' for 'config'\r\n"
        );
    }

    #[test]
    fn test_unknown_command() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["FLUSHALL"]),
            b"-ERR unknown command 'FLUSHALL'\r\n"
        );
    }

    #[test]
    fn test_empty_command() {
        let handler = create_handler();
        assert!(handler.execute(&[]).is_error());
    }

    #[test]
    fn test_concurrent_sets_from_many_handlers() {
        let handler = create_handler();

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let handler = handler.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("key:{}:{}", t, i);
                        let reply = run(&handler, &["SET", key.as_str(), "v"]);
                        assert_eq!(reply, b"+OK\r\n");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..16 {
            for i in 0..200 {
                let key = format!("key:{}:{}", t, i);
                assert_eq!(run(&handler, &["GET", key.as_str()]), b"$1\r\nv\r\n");
            }
        }
    }
}
