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

//! The set of currently playing instances.
//!
//! Instances enter through a bounded channel ([`RegistryHandle`]) and are moved
//! into the active list by the render thread, which is the only owner of the
//! active list and the only mutator of cursors. A shared voice count caps pending
//! plus active instances at the active list's preallocated capacity.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::clips::Clip;

/// One in-progress playback of a clip.
pub struct PlaybackInstance {
    /// The clip being played. The bank holds its own reference, so dropping an
    /// instance never frees sample data.
    clip: Arc<Clip>,
    /// Frame offset of the next frame to be mixed.
    cursor: usize,
    /// Resolved linear gain.
    gain: f32,
}

impl PlaybackInstance {
    /// Creates a new instance positioned at the start of the clip.
    pub fn new(clip: Arc<Clip>, gain: f32) -> PlaybackInstance {
        PlaybackInstance {
            clip,
            cursor: 0,
            gain,
        }
    }

    pub fn clip(&self) -> &Arc<Clip> {
        &self.clip
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Frames left to play.
    pub fn remaining(&self) -> usize {
        self.clip.len() - self.cursor
    }

    /// True once every frame of the clip has been mixed.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.clip.len()
    }

    /// Adds up to `out.len() / 2` frames of this instance into the interleaved
    /// stereo buffer `out`, scaled by gain, and advances the cursor. Returns the
    /// number of frames mixed.
    #[inline]
    pub(super) fn mix_into(&mut self, out: &mut [f32]) -> usize {
        let count = (out.len() / 2).min(self.remaining());
        let source = &self.clip.frames()[self.cursor..self.cursor + count];
        let gain = self.gain;

        for (dst, src) in out.chunks_exact_mut(2).zip(source) {
            dst[0] += src[0] * gain;
            dst[1] += src[1] * gain;
        }

        self.cursor += count;
        count
    }
}

impl fmt::Debug for PlaybackInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackInstance")
            .field("clip", &self.clip.name())
            .field("cursor", &self.cursor)
            .field("gain", &self.gain)
            .finish()
    }
}

/// Creates a connected handle/registry pair.
pub(super) fn new(voice_capacity: usize, queue_capacity: usize) -> (RegistryHandle, PlaybackRegistry) {
    let voice_capacity = voice_capacity.max(1);
    let (pending_tx, pending_rx) = crossbeam_channel::bounded(queue_capacity.max(1));
    let voices = Arc::new(AtomicUsize::new(0));
    (
        RegistryHandle {
            pending: pending_tx,
            voices: voices.clone(),
            voice_capacity,
        },
        PlaybackRegistry {
            active: Vec::with_capacity(voice_capacity),
            pending: pending_rx,
            voices,
        },
    )
}

/// Why an instance wasn't accepted. Each variant hands the instance back.
#[derive(Debug)]
pub enum InsertError {
    /// Every voice is already playing or about to play.
    VoicesFull(PlaybackInstance),
    /// The pending queue is full.
    QueueFull(PlaybackInstance),
    /// The render side has gone away.
    Disconnected(PlaybackInstance),
}

impl InsertError {
    pub fn into_instance(self) -> PlaybackInstance {
        match self {
            InsertError::VoicesFull(instance)
            | InsertError::QueueFull(instance)
            | InsertError::Disconnected(instance) => instance,
        }
    }
}

/// The producer side of the registry. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct RegistryHandle {
    pending: Sender<PlaybackInstance>,
    /// Pending plus active instances, shared with the render side.
    voices: Arc<AtomicUsize>,
    voice_capacity: usize,
}

impl RegistryHandle {
    /// Queues an instance for the next render pass. Never blocks. A voice is
    /// reserved here, so an accepted instance is always mixed on the next pass.
    pub fn insert(&self, instance: PlaybackInstance) -> Result<(), InsertError> {
        let capacity = self.voice_capacity;
        if self
            .voices
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |voices| {
                (voices < capacity).then_some(voices + 1)
            })
            .is_err()
        {
            return Err(InsertError::VoicesFull(instance));
        }

        self.pending.try_send(instance).map_err(|e| {
            self.voices.fetch_sub(1, Ordering::AcqRel);
            match e {
                TrySendError::Full(instance) => InsertError::QueueFull(instance),
                TrySendError::Disconnected(instance) => InsertError::Disconnected(instance),
            }
        })
    }

    /// Number of instances waiting to be picked up by the renderer.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of reserved voices, pending or active.
    pub fn voices(&self) -> usize {
        self.voices.load(Ordering::Acquire)
    }
}

/// The active instances, owned by the render thread.
pub struct PlaybackRegistry {
    active: Vec<PlaybackInstance>,
    pending: Receiver<PlaybackInstance>,
    voices: Arc<AtomicUsize>,
}

impl PlaybackRegistry {
    /// Moves every queued instance into the active list. Each one reserved a voice
    /// on insert, so the list never grows past its preallocated capacity.
    pub fn admit_pending(&mut self) -> usize {
        let mut admitted = 0;
        while let Ok(instance) = self.pending.try_recv() {
            debug_assert!(self.active.len() < self.active.capacity());
            self.active.push(instance);
            admitted += 1;
        }
        admitted
    }

    /// Active instances, in admission order.
    pub fn active_mut(&mut self) -> &mut [PlaybackInstance] {
        &mut self.active
    }

    /// Removes every finished instance and releases its voice. Returns the number
    /// removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.active.len();
        self.active.retain(|instance| !instance.is_finished());
        let removed = before - self.active.len();
        if removed > 0 {
            self.voices.fetch_sub(removed, Ordering::AcqRel);
        }
        removed
    }

    /// Number of active instances.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of instances still waiting in the queue.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Active plus pending instances.
    pub fn len(&self) -> usize {
        self.active_len() + self.pending_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PlaybackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackRegistry")
            .field("active", &self.active.len())
            .field("capacity", &self.active.capacity())
            .field("pending", &self.pending.len())
            .field("voices", &self.voices.load(Ordering::Relaxed))
            .finish()
    }
}
