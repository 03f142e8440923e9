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
use std::net::SocketAddr;

use serde::Deserialize;

use super::error::ConfigError;
use crate::control::DEFAULT_ADDRESS;

/// The control listener configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Listener {
    /// The address to bind (default: 127.0.0.1:5001).
    address: Option<String>,
}

impl Listener {
    /// Returns the parsed bind address.
    pub fn address(&self) -> Result<SocketAddr, ConfigError> {
        let address = self.address.as_deref().unwrap_or(DEFAULT_ADDRESS);
        address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                address: address.to_string(),
                source,
            })
    }

    /// Overrides the configured address.
    pub fn set_address(&mut self, address: &str) {
        self.address = Some(address.to_string());
    }
}
