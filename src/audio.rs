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
use std::{error::Error, fmt, sync::Arc, thread};

use tracing::{error, info};

use crate::config;
use crate::mixer::Renderer;

pub mod cpal;
pub mod format;
pub mod mock;
mod select;
mod thread_priority;

pub use format::{FormatError, OutputFormat, SampleFormat};
pub use select::select_device;

/// An output device the mixer can render into.
pub trait Device: fmt::Display + Send + Sync {
    /// The device name, as used in configuration.
    fn name(&self) -> &str;

    /// The format the device will be driven at.
    fn format(&self) -> OutputFormat;

    /// Starts a stream that calls `renderer` once per block until the returned
    /// handle is dropped.
    fn start(&self, renderer: Renderer) -> Result<OutputHandle, Box<dyn Error>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Keeps an output stream alive. Dropping it stops the stream and joins the thread
/// that owns it.
pub struct OutputHandle {
    device: String,
    stop: Option<crossbeam_channel::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl OutputHandle {
    fn new(
        device: &str,
        stop: crossbeam_channel::Sender<()>,
        thread: thread::JoinHandle<()>,
    ) -> OutputHandle {
        OutputHandle {
            device: device.to_string(),
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    /// The device this stream is running on.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Stops the stream and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // The output thread waits for the sender to disconnect.
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(device = self.device, "Audio output thread panicked");
            } else {
                info!(device = self.device, "Audio output stopped.");
            }
        }
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputHandle")
            .field("device", &self.device)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device named by the configuration. Names starting with "mock" produce
/// a mock device.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = match config.device() {
        Some(device) => device,
        None => return Err("there must be an audio device specified".into()),
    };

    let format = config.output_format()?;
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, format)));
    };

    Ok(Arc::new(cpal::Device::get(device, format)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mock_device() -> Result<(), Box<dyn Error>> {
        let config = config::Audio::new("mock-device");
        let device = get_device(&config)?;

        assert_eq!(device.name(), "mock-device");
        assert_eq!(device.format(), OutputFormat::default());
        assert_eq!(device.to_string(), "mock-device (Mock)");
        assert!(device.to_mock().is_ok());
        Ok(())
    }

    #[test]
    fn test_get_device_requires_name() {
        let config = config::Audio::default();
        assert!(get_device(&config).is_err());
    }
}
