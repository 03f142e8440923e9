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
use serde::Deserialize;

use super::error::ConfigError;
use crate::mixer::{DEFAULT_QUEUE_CAPACITY, DEFAULT_VOICE_CAPACITY};

/// Mixer sizing.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Mixer {
    /// Instances mixed at once without allocating (default: 256).
    voice_capacity: Option<usize>,

    /// Length of the pending trigger queue (default: 1024).
    queue_capacity: Option<usize>,
}

impl Mixer {
    pub fn voice_capacity(&self) -> usize {
        self.voice_capacity.unwrap_or(DEFAULT_VOICE_CAPACITY)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voice_capacity() == 0 {
            return Err(ConfigError::ZeroCapacity("mixer.voice_capacity"));
        }
        if self.queue_capacity() == 0 {
            return Err(ConfigError::ZeroCapacity("mixer.queue_capacity"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacities() {
        let mixer = Mixer::default();
        assert_eq!(mixer.voice_capacity(), 256);
        assert_eq!(mixer.queue_capacity(), 1024);
        assert!(mixer.validate().is_ok());

        let mixer = Mixer {
            voice_capacity: Some(0),
            queue_capacity: None,
        };
        assert!(matches!(
            mixer.validate(),
            Err(ConfigError::ZeroCapacity("mixer.voice_capacity"))
        ));
    }
}
