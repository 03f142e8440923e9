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
use std::{error::Error, fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use super::{
    thread_priority::CallbackPriority, Device as AudioDevice, OutputFormat, OutputHandle,
    SampleFormat,
};
use crate::mixer::Renderer;

/// Scratch space for integer output, in blocks. Callbacks larger than this are
/// rendered in several passes.
const SCRATCH_BLOCKS: usize = 4;

/// A small wrapper around a cpal::Device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The format the stream is opened with.
    format: OutputFormat,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices that can play stereo.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let output_configs = match device.supported_output_configs() {
                    Ok(output_configs) => output_configs,
                    Err(_) => continue,
                };
                let max_channels = output_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels >= OutputFormat::CHANNELS {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                        format: OutputFormat::default(),
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the given cpal device.
    pub fn get(name: &str, format: OutputFormat) -> Result<Device, Box<dyn Error>> {
        match Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
        {
            Some(mut device) => {
                device.format = format;
                Ok(device)
            }
            None => Err(format!("no device found with name {}", name).into()),
        }
    }

    fn stream_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: OutputFormat::CHANNELS,
            sample_rate: cpal::SampleRate(self.format.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.format.block_size),
        }
    }
}

/// Builds the output stream for the device's sample format. The renderer moves
/// into the callback.
fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    format: OutputFormat,
    renderer: Renderer,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let on_error = |err: cpal::StreamError| error!(err = %err, "CPAL output stream error");

    let stream = match (format.sample_format, format.bits_per_sample) {
        (SampleFormat::Float, _) => {
            device.build_output_stream(config, f32_callback(renderer), on_error, None)?
        }
        (SampleFormat::Int, 16) => device.build_output_stream(
            config,
            int_callback::<i16>(renderer, format),
            on_error,
            None,
        )?,
        (SampleFormat::Int, 32) => device.build_output_stream(
            config,
            int_callback::<i32>(renderer, format),
            on_error,
            None,
        )?,
        (SampleFormat::Int, bits) => {
            return Err(format!("unsupported bit depth for integer output: {}", bits).into())
        }
    };
    Ok(stream)
}

/// f32 callback: render straight into the device buffer.
fn f32_callback(
    mut renderer: Renderer,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    let mut priority = CallbackPriority::from_env();
    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        priority.apply_once();
        renderer.render(data);
    }
}

/// Integer callback: render into preallocated scratch space and convert.
fn int_callback<T>(
    mut renderer: Renderer,
    format: OutputFormat,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32> + 'static,
{
    let mut priority = CallbackPriority::from_env();
    let mut scratch = vec![0.0f32; format.block_samples() * SCRATCH_BLOCKS];
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        priority.apply_once();
        render_converted(&mut renderer, &mut scratch, data);
    }
}

/// Renders `data.len()` samples through `scratch`, one scratch-sized pass at a time.
fn render_converted<T>(renderer: &mut Renderer, scratch: &mut [f32], data: &mut [T])
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    for chunk in data.chunks_mut(scratch.len()) {
        let block = &mut scratch[..chunk.len()];
        renderer.render(block);
        for (dst, &src) in chunk.iter_mut().zip(block.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

impl AudioDevice for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> OutputFormat {
        self.format
    }

    /// Opens the stream on a dedicated thread, which owns it until the handle is
    /// dropped. Errors building the stream are reported back to the caller.
    fn start(&self, renderer: Renderer) -> Result<OutputHandle, Box<dyn Error>> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let device = self.device.clone();
        let config = self.stream_config();
        let format = self.format;
        let name = self.name.clone();

        let thread = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "audio output (cpal)");
                let _enter = span.enter();

                let stream = match build_stream(&device, &config, format, renderer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("failed to create stream: {}", e)));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(format!("failed to start stream: {}", e)));
                    return;
                }

                info!(device = name, format = %format, "CPAL output stream started.");
                let _ = ready_tx.send(Ok(()));

                // Keep the stream alive until the handle goes away.
                let _ = stop_rx.recv();
                drop(stream);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(OutputHandle::new(&self.name, stop_tx, thread)),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e.into())
            }
            Err(_) => {
                let _ = thread.join();
                Err("audio output thread exited before the stream started".into())
            }
        }
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<std::sync::Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock".into())
    }
}
