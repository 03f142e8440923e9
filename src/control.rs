// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The text control protocol.
//!
//! Each UDP datagram carries one command: `<clip-name> [volume]`. The protocol is
//! fire-and-forget: nothing is ever sent back, and anything that can't be parsed
//! is dropped.

mod listener;

use std::fmt;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

pub use listener::Listener;

/// Default address the listener binds to.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:5001";

/// Largest datagram the listener reads. Anything beyond this is truncated.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// A decoded "play clip X at volume V" command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Lowercased clip name.
    pub name: String,
    /// Volume multiplier, if a valid one was supplied.
    pub volume: Option<f32>,
}

impl Command {
    /// Creates a command, folding the name to lowercase.
    pub fn new(name: &str, volume: Option<f32>) -> Command {
        Command {
            name: name.to_lowercase(),
            volume,
        }
    }

    /// Decodes a datagram. Returns None for empty or non-text datagrams. A missing
    /// or malformed volume token is treated as no override.
    pub fn parse(datagram: &[u8]) -> Option<Command> {
        let text = std::str::from_utf8(datagram).ok()?;
        let mut tokens = text.split_whitespace();

        let name = tokens.next()?;
        let volume = tokens.next().and_then(parse_volume);

        Some(Command::new(name, volume))
    }
}

/// Parses a volume token. Only finite, non-negative numbers are accepted.
fn parse_volume(token: &str) -> Option<f32> {
    token
        .parse::<f32>()
        .ok()
        .filter(|volume| volume.is_finite() && *volume >= 0.0)
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume {
            Some(volume) => write!(f, "{} {}", self.name, volume),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Errors from sending a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("clip name must be a single non-empty token, got {0:?}")]
    InvalidName(String),

    #[error("volume must be a finite non-negative number, got {0}")]
    InvalidVolume(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sends a single command to a listener.
pub async fn send_command(addr: SocketAddr, command: &Command) -> Result<(), CommandError> {
    if command.name.is_empty() || command.name.split_whitespace().count() != 1 {
        return Err(CommandError::InvalidName(command.name.clone()));
    }
    if let Some(volume) = command.volume {
        if parse_volume(&volume.to_string()).is_none() {
            return Err(CommandError::InvalidVolume(volume));
        }
    }

    let bind_addr: SocketAddr = if addr.is_ipv4() {
        ([0u8; 4], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.send_to(command.to_string().as_bytes(), addr).await?;
    Ok(())
}
