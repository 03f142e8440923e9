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
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::registry::{InsertError, PlaybackInstance, RegistryHandle};
use crate::clips::ClipBank;

/// The result of a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new instance was queued for playback.
    Triggered,
    /// The clip name isn't in the bank. Nothing changed.
    Ignored,
    /// Every voice is busy, the pending queue is full or the renderer is gone.
    /// Nothing changed.
    Dropped,
}

/// The control half of the mixer. Cloneable and safe to call from any thread.
#[derive(Clone)]
pub struct Trigger {
    bank: Arc<ClipBank>,
    registry: RegistryHandle,
}

impl Trigger {
    pub(super) fn new(bank: Arc<ClipBank>, registry: RegistryHandle) -> Trigger {
        Trigger { bank, registry }
    }

    /// Starts a new playback of the named clip. The effective gain is the clip's
    /// default volume scaled by the override, if one was given. A triggered clip
    /// is always heard from the next render pass on.
    pub fn trigger(&self, name: &str, volume_override: Option<f32>) -> TriggerOutcome {
        let clip = match self.bank.lookup(name) {
            Some(clip) => clip,
            None => {
                debug!(clip = name, "Unknown clip, ignoring");
                return TriggerOutcome::Ignored;
            }
        };

        let gain = clip.default_volume() * volume_factor(volume_override);
        match self.registry.insert(PlaybackInstance::new(clip.clone(), gain)) {
            Ok(()) => {
                debug!(clip = clip.name(), gain, "Clip triggered");
                TriggerOutcome::Triggered
            }
            Err(InsertError::VoicesFull(_)) => {
                warn!(
                    clip = clip.name(),
                    voices = self.registry.voices(),
                    "All voices busy, dropping trigger"
                );
                TriggerOutcome::Dropped
            }
            Err(InsertError::QueueFull(_)) => {
                warn!(
                    clip = clip.name(),
                    pending = self.registry.pending_len(),
                    "Trigger queue full, dropping trigger"
                );
                TriggerOutcome::Dropped
            }
            Err(InsertError::Disconnected(_)) => {
                warn!(clip = clip.name(), "Renderer has stopped, dropping trigger");
                TriggerOutcome::Dropped
            }
        }
    }

    /// The bank this trigger resolves names against.
    pub fn bank(&self) -> &Arc<ClipBank> {
        &self.bank
    }
}

/// The factor applied to a clip's default volume. Anything but a finite,
/// non-negative override plays the clip at its default volume.
fn volume_factor(volume_override: Option<f32>) -> f32 {
    volume_override
        .filter(|volume| volume.is_finite() && *volume >= 0.0)
        .unwrap_or(1.0)
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("clips", &self.bank.len())
            .field("pending", &self.registry.pending_len())
            .field("voices", &self.registry.voices())
            .finish()
    }
}
