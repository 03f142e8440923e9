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
use crate::audio::{OutputFormat, SampleFormat};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_BLOCK_SIZE: u32 = 256;
const DEFAULT_SAMPLE_FORMAT: SampleFormat = SampleFormat::Float;
const DEFAULT_BITS_PER_SAMPLE: u16 = 32;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Audio {
    /// The audio device. When absent, the operator picks one at startup.
    device: Option<String>,

    /// Output sample rate in Hz (default: 44100). Every clip must match it.
    sample_rate: Option<u32>,

    /// Frames per render pass (default: 256).
    block_size: Option<u32>,

    /// Output sample format (default: "float").
    sample_format: Option<SampleFormat>,

    /// Output bits per sample (default: 32).
    bits_per_sample: Option<u16>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Overrides the configured device.
    pub fn set_device(&mut self, device: &str) {
        self.device = Some(device.to_string());
    }

    /// Returns the output sample rate (default: 44100)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the frames per render pass (default: 256)
    pub fn block_size(&self) -> u32 {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    /// Returns the output sample format (default: Float)
    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format.unwrap_or(DEFAULT_SAMPLE_FORMAT)
    }

    /// Returns the output bits per sample (default: 32)
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample.unwrap_or(DEFAULT_BITS_PER_SAMPLE)
    }

    /// Returns the validated output format.
    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        Ok(OutputFormat::new(
            self.sample_rate(),
            self.block_size(),
            self.sample_format(),
            self.bits_per_sample(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::audio::FormatError;

    fn parse(yaml: &str) -> Audio {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let audio = Audio::default();
        assert_eq!(audio.device(), None);
        assert_eq!(audio.output_format().unwrap(), OutputFormat::default());
    }

    #[test]
    fn test_deserialize() {
        let audio = parse(
            r#"
            device: USB Interface
            sample_rate: 48000
            block_size: 128
            sample_format: int
            bits_per_sample: 16
        "#,
        );

        assert_eq!(audio.device(), Some("USB Interface"));
        let format = audio.output_format().unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.block_size, 128);
        assert_eq!(format.sample_format, SampleFormat::Int);
        assert_eq!(format.bits_per_sample, 16);
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            parse("sample_rate: 0").output_format(),
            Err(ConfigError::Format(FormatError::ZeroSampleRate))
        ));
        assert!(matches!(
            parse("block_size: 0").output_format(),
            Err(ConfigError::Format(FormatError::ZeroBlockSize))
        ));
        assert!(matches!(
            parse("sample_format: int\nbits_per_sample: 24").output_format(),
            Err(ConfigError::Format(FormatError::UnsupportedBitDepth { .. }))
        ));
    }

    #[test]
    fn test_set_device() {
        let mut audio = parse("device: first");
        audio.set_device("mock-second");
        assert_eq!(audio.device(), Some("mock-second"));
    }
}
