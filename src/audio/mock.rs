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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use crossbeam_channel::TryRecvError;
use parking_lot::Mutex;
use tracing::{info, span, Level};

use super::{OutputFormat, OutputHandle};
use crate::mixer::Renderer;

/// How much rendered audio the mock keeps, in seconds.
const MAX_RECORDED_SECONDS: usize = 60;

/// A mock device. Renders blocks on its own thread at the real block rate and
/// records what it renders instead of playing it.
#[derive(Clone)]
pub struct Device {
    name: String,
    format: OutputFormat,
    recorded: Arc<Mutex<Vec<f32>>>,
    passes: Arc<AtomicUsize>,
    is_running: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, format: OutputFormat) -> Device {
        Device {
            name: name.to_string(),
            format,
            recorded: Arc::new(Mutex::new(Vec::new())),
            passes: Arc::new(AtomicUsize::new(0)),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true while a stream is running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Number of render passes so far.
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Relaxed)
    }

    /// A copy of the interleaved output rendered so far.
    pub fn recorded(&self) -> Vec<f32> {
        self.recorded.lock().clone()
    }

    /// Largest recorded sample magnitude.
    pub fn peak(&self) -> f32 {
        self.recorded
            .lock()
            .iter()
            .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> OutputFormat {
        self.format
    }

    fn start(&self, mut renderer: Renderer) -> Result<OutputHandle, Box<dyn Error>> {
        if self.is_running.swap(true, Ordering::Relaxed) {
            return Err(format!("mock device {} is already running", self.name).into());
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let device = self.clone();
        let period = self.format.block_period();
        let max_recorded =
            self.format.sample_rate as usize * OutputFormat::CHANNELS as usize * MAX_RECORDED_SECONDS;

        let spawned = thread::Builder::new()
            .name(format!("mock-output-{}", self.name))
            .spawn(move || {
                let span = span!(Level::INFO, "audio output (mock)");
                let _enter = span.enter();
                info!(device = device.name, format = %device.format, "Mock output started.");

                let mut block = vec![0.0f32; device.format.block_samples()];
                let mut deadline = Instant::now();
                loop {
                    match stop_rx.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                    }

                    renderer.render(&mut block);
                    device.passes.fetch_add(1, Ordering::Relaxed);
                    {
                        let mut recorded = device.recorded.lock();
                        if recorded.len() < max_recorded {
                            recorded.extend_from_slice(&block);
                        }
                    }

                    deadline += period;
                    spin_sleep::sleep(deadline.saturating_duration_since(Instant::now()));
                }

                device.is_running.store(false, Ordering::Relaxed);
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.is_running.store(false, Ordering::Relaxed);
                return Err(e.into());
            }
        };

        Ok(OutputHandle::new(&self.name, stop_tx, thread))
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
