//! Command Parsing
//!
//! Turns a tokenized request line into a [`Command`], validating arity and
//! options up front so execution never has to look at raw tokens again.

use crate::protocol::RespValue;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PING [message]`
    Ping(Option<Bytes>),

    /// `ECHO message`; `None` when no message was given
    Echo(Option<Bytes>),

    /// `SET key value [PX milliseconds]`
    Set {
        key: Bytes,
        value: Bytes,
        ttl: Option<Duration>,
    },

    /// `GET key`
    Get { key: Bytes },

    /// `CONFIG GET parameter`
    ConfigGet { name: Bytes },

    /// Any verb not listed above
    Unknown(String),
}

/// Errors reported to the client for a single malformed command.
///
/// None of these close the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("syntax error")]
    Syntax,

    #[error("unknown subcommand '{subcommand}' for '{command}'")]
    UnknownSubcommand {
        command: &'static str,
        subcommand: String,
    },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("empty command")]
    Empty,
}

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        RespValue::error(format!("ERR {}", err))
    }
}

impl Command {
    /// Parses a tokenized line. The first token is the verb.
    ///
    /// Verbs, the `PX` option and the `CONFIG` subcommand are matched
    /// case-insensitively; keys and values are taken verbatim.
    ///
    /// # Example
    ///
    /// ```
    /// use linekv::commands::Command;
    /// use bytes::Bytes;
    ///
    /// let tokens: Vec<Bytes> = ["get", "Name"].into_iter().map(Bytes::from).collect();
    /// assert_eq!(
    ///     Command::parse(&tokens).unwrap(),
    ///     Command::Get { key: Bytes::from("Name") }
    /// );
    /// ```
    pub fn parse(tokens: &[Bytes]) -> Result<Command, CommandError> {
        let (verb, args) = tokens.split_first().ok_or(CommandError::Empty)?;
        let verb = String::from_utf8_lossy(verb).to_ascii_uppercase();

        match verb.as_str() {
            "PING" => parse_ping(args),
            "ECHO" => Ok(parse_echo(args)),
            "SET" => parse_set(args),
            "GET" => parse_get(args),
            "CONFIG" => parse_config(args),
            _ => Ok(Command::Unknown(verb)),
        }
    }

    /// The upper-case verb, for logging.
    pub fn name(&self) -> &str {
        match self {
            Command::Ping(_) => "PING",
            Command::Echo(_) => "ECHO",
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::ConfigGet { .. } => "CONFIG",
            Command::Unknown(verb) => verb.as_str(),
        }
    }
}

fn parse_ping(args: &[Bytes]) -> Result<Command, CommandError> {
    match args {
        [] => Ok(Command::Ping(None)),
        [message] => Ok(Command::Ping(Some(message.clone()))),
        _ => Err(CommandError::WrongArity("ping")),
    }
}

/// Several tokens are rejoined with single spaces, since the line was split
/// on whitespace before it got here.
fn parse_echo(args: &[Bytes]) -> Command {
    match args {
        [] => Command::Echo(None),
        [message] => Command::Echo(Some(message.clone())),
        words => Command::Echo(Some(Bytes::from(words.join(&b' ')))),
    }
}

fn parse_set(args: &[Bytes]) -> Result<Command, CommandError> {
    match args {
        [key, value] => Ok(Command::Set {
            key: key.clone(),
            value: value.clone(),
            ttl: None,
        }),
        [key, value, option, millis] if option.eq_ignore_ascii_case(b"PX") => Ok(Command::Set {
            key: key.clone(),
            value: value.clone(),
            ttl: parse_millis(millis),
        }),
        [_] | [] => Err(CommandError::WrongArity("set")),
        _ => Err(CommandError::Syntax),
    }
}

/// An unparsable or zero expiry means the key never expires.
fn parse_millis(millis: &[u8]) -> Option<Duration> {
    std::str::from_utf8(millis)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}

fn parse_get(args: &[Bytes]) -> Result<Command, CommandError> {
    match args {
        [key] => Ok(Command::Get { key: key.clone() }),
        _ => Err(CommandError::WrongArity("get")),
    }
}

fn parse_config(args: &[Bytes]) -> Result<Command, CommandError> {
    match args {
        [subcommand, name] if subcommand.eq_ignore_ascii_case(b"GET") => {
            Ok(Command::ConfigGet { name: name.clone() })
        }
        [subcommand, _] => Err(CommandError::UnknownSubcommand {
            command: "config",
            subcommand: String::from_utf8_lossy(subcommand).into_owned(),
        }),
        _ => Err(CommandError::WrongArity("config")),
    }
}
