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
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use super::error::ConfigError;
use crate::clips::loader::{LoadOptions, DEFAULT_VOLUME};

const DEFAULT_SOUNDS_PATH: &str = "sounds";

/// Where clips come from and how loud they play by default.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Clips {
    /// The sound directory (default: "sounds").
    path: Option<PathBuf>,

    /// Default volume for clips without an entry in `volumes` (default: 0.5).
    default_volume: Option<f32>,

    /// Per-clip default volumes.
    volumes: Option<HashMap<String, f32>>,
}

impl Clips {
    /// Returns the sound directory.
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SOUNDS_PATH))
    }

    /// Overrides the sound directory.
    pub fn set_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
    }

    /// Returns the default clip volume.
    pub fn default_volume(&self) -> f32 {
        self.default_volume.unwrap_or(DEFAULT_VOLUME)
    }

    /// Checks every configured volume.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_volume("default_volume", self.default_volume())?;
        for (name, volume) in self.volumes.iter().flatten() {
            check_volume(name, *volume)?;
        }
        Ok(())
    }

    /// Builds loader options for the given output rate. Clip names are matched
    /// case-insensitively.
    pub fn load_options(&self, sample_rate: u32) -> LoadOptions {
        let mut options = LoadOptions::new(sample_rate);
        options.default_volume = self.default_volume();
        options.volumes = self
            .volumes
            .iter()
            .flatten()
            .map(|(name, volume)| (name.to_lowercase(), *volume))
            .collect();
        options
    }
}

fn check_volume(name: &str, volume: f32) -> Result<(), ConfigError> {
    if volume.is_finite() && volume >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidVolume {
            name: name.to_string(),
            volume,
        })
    }
}
