// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Sample encoding written to the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed integer samples (16 or 32 bit).
    #[serde(alias = "Int")]
    Int,
    /// 32-bit float samples. The mixer works in f32, so no conversion happens.
    #[serde(alias = "Float")]
    Float,
}

impl FromStr for SampleFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, FormatError> {
        match s {
            "float" | "Float" => Ok(SampleFormat::Float),
            "int" | "Int" => Ok(SampleFormat::Int),
            _ => Err(FormatError::UnknownSampleFormat(s.to_string())),
        }
    }
}

impl SampleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::Float => "float",
            SampleFormat::Int => "int",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from building an output format.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("unsupported sample format: {0}")]
    UnknownSampleFormat(String),

    #[error("sample rate must be greater than 0")]
    ZeroSampleRate,

    #[error("block size must be greater than 0")]
    ZeroBlockSize,

    #[error("{bits_per_sample}-bit {sample_format} output is not supported")]
    UnsupportedBitDepth {
        sample_format: SampleFormat,
        bits_per_sample: u16,
    },
}

/// What the output stream looks like: always two interleaved channels, at a fixed
/// rate and block size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputFormat {
    /// Sample rate in Hz. Every clip must match it.
    pub sample_rate: u32,
    /// Frames per render pass.
    pub block_size: u32,
    /// Sample encoding for the device.
    pub sample_format: SampleFormat,
    /// Bits per sample for the device.
    pub bits_per_sample: u16,
}

impl OutputFormat {
    /// Number of output channels. The mixer only produces stereo.
    pub const CHANNELS: u16 = 2;

    /// Creates a validated output format.
    pub fn new(
        sample_rate: u32,
        block_size: u32,
        sample_format: SampleFormat,
        bits_per_sample: u16,
    ) -> Result<OutputFormat, FormatError> {
        if sample_rate == 0 {
            return Err(FormatError::ZeroSampleRate);
        }
        if block_size == 0 {
            return Err(FormatError::ZeroBlockSize);
        }

        let supported = match sample_format {
            SampleFormat::Float => bits_per_sample == 32,
            SampleFormat::Int => bits_per_sample == 16 || bits_per_sample == 32,
        };
        if !supported {
            return Err(FormatError::UnsupportedBitDepth {
                sample_format,
                bits_per_sample,
            });
        }

        Ok(OutputFormat {
            sample_rate,
            block_size,
            sample_format,
            bits_per_sample,
        })
    }

    /// Interleaved samples in one block.
    pub fn block_samples(&self) -> usize {
        self.block_size as usize * Self::CHANNELS as usize
    }

    /// Wall-clock length of one block.
    pub fn block_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(f64::from(self.block_size) / f64::from(self.sample_rate))
    }
}

impl Default for OutputFormat {
    /// 44.1kHz, 256-frame blocks, f32.
    fn default() -> Self {
        OutputFormat {
            sample_rate: 44100,
            block_size: 256,
            sample_format: SampleFormat::Float,
            bits_per_sample: 32,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz {}-bit {} stereo, {} frames per block",
            self.sample_rate, self.bits_per_sample, self.sample_format, self.block_size
        )
    }
}
