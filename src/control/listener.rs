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
use std::{io, net::SocketAddr};

use tokio::{net::UdpSocket, select, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, info_span, Instrument};

use super::{Command, MAX_DATAGRAM_SIZE};
use crate::mixer::{Trigger, TriggerOutcome};

/// Receives control datagrams and turns them into triggers.
pub struct Listener {
    /// The bound socket.
    socket: UdpSocket,
    /// Where parsed commands go.
    trigger: Trigger,
}

impl Listener {
    /// Binds the listener to the given address.
    pub async fn bind(addr: SocketAddr, trigger: Trigger) -> io::Result<Listener> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Listener { socket, trigger })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the listener on the tokio runtime until `shutdown` flips to true or its
    /// sender is dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<io::Result<()>> {
        tokio::spawn(self.run(shutdown).instrument(info_span!("control listener")))
    }

    /// Receives datagrams until shutdown is requested. Receive errors are logged and
    /// skipped; a bad packet from one sender shouldn't stop the board.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        info!(addr = ?self.local_addr()?, "Control listener started.");

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((size, sender)) => {
                            self.handle_datagram(&buf[..size], sender);
                        }
                        Err(e) => error!(err = e.to_string(), "Error receiving UDP."),
                    }
                }
            }
        }

        info!("Control listener closing.");
        Ok(())
    }

    /// Decodes a single datagram and triggers the clip it names. Returns None when
    /// the datagram couldn't be parsed.
    pub(crate) fn handle_datagram(
        &self,
        datagram: &[u8],
        sender: SocketAddr,
    ) -> Option<TriggerOutcome> {
        let command = match Command::parse(datagram) {
            Some(command) => command,
            None => {
                debug!(sender = ?sender, size = datagram.len(), "Ignoring unparseable datagram");
                return None;
            }
        };

        let outcome = self.trigger.trigger(&command.name, command.volume);
        debug!(
            sender = ?sender,
            clip = command.name,
            volume = ?command.volume,
            outcome = ?outcome,
            "Received command."
        );
        Some(outcome)
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc, time::Duration};

    use tokio::{net::UdpSocket, sync::watch, time::timeout};

    use crate::{
        clips::{Clip, ClipBank},
        mixer::{self, Renderer, TriggerOutcome},
        testutil::eventually,
    };

    use super::Listener;

    fn mixer() -> (mixer::Trigger, Renderer) {
        let bank = Arc::new(ClipBank::new(
            44100,
            vec![Clip::new("chime", vec![[1.0, 1.0]; 4], 0.5)],
        ));
        mixer::new(bank, 16, 16)
    }

    #[tokio::test]
    async fn test_handle_datagram() -> Result<(), Box<dyn Error>> {
        let (trigger, renderer) = mixer();
        let listener = Listener::bind("127.0.0.1:0".parse()?, trigger).await?;
        let sender = "127.0.0.1:1234".parse()?;

        assert_eq!(
            listener.handle_datagram(b"chime", sender),
            Some(TriggerOutcome::Triggered)
        );
        assert_eq!(
            listener.handle_datagram(b"CHIME abc", sender),
            Some(TriggerOutcome::Triggered)
        );
        assert_eq!(
            listener.handle_datagram(b"bell 0.5", sender),
            Some(TriggerOutcome::Ignored)
        );
        assert_eq!(listener.handle_datagram(b"", sender), None);
        assert_eq!(listener.handle_datagram(b" \n", sender), None);
        assert_eq!(renderer.registry_len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_volume_renders_like_default() -> Result<(), Box<dyn Error>> {
        let (trigger, mut renderer) = mixer();
        let listener = Listener::bind("127.0.0.1:0".parse()?, trigger).await?;
        let sender = "127.0.0.1:1234".parse()?;

        let mut plain = vec![0.0; 8];
        listener.handle_datagram(b"chime", sender);
        renderer.render(&mut plain);

        let mut malformed = vec![0.0; 8];
        listener.handle_datagram(b"chime abc", sender);
        renderer.render(&mut malformed);

        assert_eq!(plain, malformed);
        assert_eq!(plain, vec![0.5; 8]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_listener_over_udp() -> Result<(), Box<dyn Error>> {
        let (trigger, renderer) = mixer();
        let listener = Listener::bind("127.0.0.1:0".parse()?, trigger).await?;
        let server_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = listener.spawn(shutdown_rx);

        let client = UdpSocket::bind("127.0.0.1:0").await?;
        client.send_to(b"chime 0.5", server_addr).await?;
        client.send_to(b"nothing", server_addr).await?;
        client.send_to(b"chime", server_addr).await?;

        eventually(
            || renderer.registry_len() == 2,
            "Listener never triggered both chimes",
        );

        shutdown_tx.send(true)?;
        timeout(Duration::from_secs(3), handle).await???;

        // Nothing is ever sent back.
        let mut buf = [0u8; 64];
        assert!(
            timeout(Duration::from_millis(100), client.recv_from(&mut buf))
                .await
                .is_err()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_listener_stops_when_shutdown_sender_dropped() -> Result<(), Box<dyn Error>> {
        let (trigger, _renderer) = mixer();
        let listener = Listener::bind("127.0.0.1:0".parse()?, trigger).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = listener.spawn(shutdown_rx);
        drop(shutdown_tx);

        timeout(Duration::from_secs(3), handle).await???;
        Ok(())
    }
}
