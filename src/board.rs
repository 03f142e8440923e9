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
use std::{error::Error, future::Future, io, net::SocketAddr, sync::Arc};

use tokio::{select, sync::watch, task::JoinHandle};
use tracing::info;

use crate::{
    audio::{self, Device, OutputHandle},
    clips::{self, ClipBank},
    config,
    control::Listener,
    mixer::{self, Trigger},
};

/// A running soundboard: a loaded bank, an output stream rendering the mixer and a
/// control listener feeding it.
pub struct Board {
    bank: Arc<ClipBank>,
    device: Arc<dyn Device>,
    trigger: Trigger,
    output: OutputHandle,
    listener_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    listener: JoinHandle<io::Result<()>>,
}

impl Board {
    /// Loads the clip bank, opens the output device and binds the control listener.
    /// Any failure here is fatal and nothing is left running.
    pub async fn start(config: &config::Board) -> Result<Board, Box<dyn Error>> {
        let format = config.audio().output_format()?;
        let bank = Arc::new(clips::load_directory(
            config.clips().path(),
            &config.clips().load_options(format.sample_rate),
        )?);

        let device = audio::get_device(config.audio())?;
        let (trigger, renderer) = mixer::new(
            bank.clone(),
            config.mixer().voice_capacity(),
            config.mixer().queue_capacity(),
        );
        let output = device.start(renderer)?;
        info!(device = device.name(), format = %device.format(), "Audio stream running.");

        // Dropping `output` on error stops the stream again.
        let listener = Listener::bind(config.listener().address()?, trigger.clone()).await?;
        let listener_addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let listener = listener.spawn(shutdown_rx);

        Ok(Board {
            bank,
            device,
            trigger,
            output,
            listener_addr,
            shutdown,
            listener,
        })
    }

    pub fn bank(&self) -> &Arc<ClipBank> {
        &self.bank
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// A trigger into the running mixer, for callers other than the listener.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// The address the control listener is bound to.
    pub fn listener_addr(&self) -> SocketAddr {
        self.listener_addr
    }

    /// Runs until `signal` completes, then shuts down. Returns an error if the
    /// listener stops on its own first.
    pub async fn run_until<F: Future>(mut self, signal: F) -> Result<(), Box<dyn Error>> {
        let listener_result = select! {
            _ = signal => None,
            result = &mut self.listener => Some(result),
        };

        match listener_result {
            None => self.stop().await,
            Some(result) => {
                self.output.stop();
                result??;
                Err("control listener exited unexpectedly".into())
            }
        }
    }

    /// Stops the listener, then the output stream.
    pub async fn stop(self) -> Result<(), Box<dyn Error>> {
        // The listener may already be gone, in which case there's nobody to tell.
        let _ = self.shutdown.send(true);
        let result = self.listener.await;
        self.output.stop();
        info!("Board stopped.");

        result??;
        Ok(())
    }
}
