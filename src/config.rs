// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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

//! Board configuration.
//!
//! Read from an optional YAML file, then from `UDPBOARD_`-prefixed environment
//! variables using `__` for nesting, e.g. `UDPBOARD_LISTENER__ADDRESS`. Every
//! field is optional.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

mod audio;
mod clips;
mod error;
mod listener;
mod mixer;

pub use audio::Audio;
pub use clips::Clips;
pub use error::ConfigError;
pub use listener::Listener;
pub use mixer::Mixer;

const ENV_PREFIX: &str = "UDPBOARD";

/// The full board configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Board {
    #[serde(default)]
    audio: Audio,
    #[serde(default)]
    listener: Listener,
    #[serde(default)]
    clips: Clips,
    #[serde(default)]
    mixer: Mixer,
}

impl Board {
    /// Loads the configuration from the given file (if any) and the environment,
    /// then validates it.
    pub fn load(path: Option<&Path>) -> Result<Board, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Board::build(builder)
    }

    /// Parses a YAML document, layered under the environment like a file would be.
    pub fn from_yaml(yaml: &str) -> Result<Board, ConfigError> {
        Board::build(Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Board, ConfigError> {
        let board: Board = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        board.validate()?;
        Ok(board)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audio.output_format()?;
        self.listener.address()?;
        self.clips.validate()?;
        self.mixer.validate()
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut Listener {
        &mut self.listener
    }

    pub fn clips(&self) -> &Clips {
        &self.clips
    }

    pub fn clips_mut(&mut self) -> &mut Clips {
        &mut self.clips
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}
