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

//! Real-time clip mixing.
//!
//! This module provides:
//! - The playback registry shared between the control path and the render path
//! - [`Trigger`], which admits new playback instances from any thread
//! - [`Renderer`], which mixes every active instance into fixed-size output blocks
//!
//! The two halves only meet at a bounded queue of pending instances and a shared
//! voice count. A trigger reserves its voice up front, so anything accepted is
//! mixed on the next pass. The renderer drains the queue at the start of each pass
//! and otherwise owns the active set outright, so render time never depends on
//! what the control thread is doing.

mod registry;
mod renderer;
mod trigger;

use std::sync::Arc;

use crate::clips::ClipBank;

pub use registry::{InsertError, PlaybackInstance, PlaybackRegistry, RegistryHandle};
pub use renderer::Renderer;
pub use trigger::{Trigger, TriggerOutcome};

/// Number of instances that can be playing or queued at once. Triggers past this
/// are dropped.
pub const DEFAULT_VOICE_CAPACITY: usize = 256;

/// Number of triggered instances that can wait for the next render pass.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Creates the control half and the render half of a mixer over the given bank.
pub fn new(bank: Arc<ClipBank>, voice_capacity: usize, queue_capacity: usize) -> (Trigger, Renderer) {
    let (handle, registry) = registry::new(voice_capacity, queue_capacity);
    (Trigger::new(bank, handle), Renderer::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::Clip;

    fn chime_bank() -> Arc<ClipBank> {
        Arc::new(ClipBank::new(
            44100,
            vec![Clip::new("chime", vec![[1.0, 1.0]; 4], 0.5)],
        ))
    }

    fn render_block(renderer: &mut Renderer, frames: usize) -> Vec<f32> {
        let mut block = vec![0.0; frames * 2];
        renderer.render(&mut block);
        block
    }

    #[test]
    fn test_chime_default_volume() {
        let (trigger, mut renderer) = new(chime_bank(), 16, 16);

        assert_eq!(trigger.trigger("chime", None), TriggerOutcome::Triggered);
        let block = render_block(&mut renderer, 4);

        assert_eq!(block, vec![0.5; 8]);
        assert_eq!(renderer.registry_len(), 0);
    }

    #[test]
    fn test_chime_volume_override() {
        let (trigger, mut renderer) = new(chime_bank(), 16, 16);

        assert_eq!(trigger.trigger("chime", Some(2.0)), TriggerOutcome::Triggered);
        let block = render_block(&mut renderer, 4);

        assert_eq!(block, vec![1.0; 8]);
        assert_eq!(renderer.registry_len(), 0);
    }

    #[test]
    fn test_chime_two_triggers_sum() {
        let (trigger, mut renderer) = new(chime_bank(), 16, 16);

        trigger.trigger("chime", None);
        trigger.trigger("chime", None);
        assert_eq!(renderer.registry_len(), 2);

        let block = render_block(&mut renderer, 4);
        assert_eq!(block, vec![1.0; 8]);
        assert_eq!(renderer.registry_len(), 0);
    }

    #[test]
    fn test_unknown_clip_is_inaudible() {
        let (trigger, mut renderer) = new(chime_bank(), 16, 16);

        assert_eq!(trigger.trigger("bell", Some(1.0)), TriggerOutcome::Ignored);
        assert_eq!(renderer.registry_len(), 0);
        assert_eq!(render_block(&mut renderer, 4), vec![0.0; 8]);

        trigger.trigger("chime", None);
        trigger.trigger("bell", None);
        assert_eq!(renderer.registry_len(), 1);
        assert_eq!(render_block(&mut renderer, 4), vec![0.5; 8]);
    }

    #[test]
    fn test_trigger_is_case_insensitive() {
        let (trigger, mut renderer) = new(chime_bank(), 16, 16);

        assert_eq!(trigger.trigger("CHIME", None), TriggerOutcome::Triggered);
        assert_eq!(render_block(&mut renderer, 4), vec![0.5; 8]);
    }

    #[test]
    fn test_concurrent_triggers_while_rendering() {
        let bank = Arc::new(ClipBank::new(
            44100,
            vec![Clip::new("tick", vec![[0.01, -0.01]; 64], 1.0)],
        ));
        let (trigger, mut renderer) = new(bank, 64, 1024);

        let producer = {
            let trigger = trigger.clone();
            std::thread::spawn(move || {
                let mut triggered = 0;
                for _ in 0..500 {
                    if trigger.trigger("tick", None) == TriggerOutcome::Triggered {
                        triggered += 1;
                    }
                }
                triggered
            })
        };

        let mut block = vec![0.0; 256 * 2];
        while !producer.is_finished() {
            renderer.render(&mut block);
            assert!(block.iter().all(|s| s.abs() <= 1.0));
        }
        let triggered = producer.join().expect("producer thread panicked");
        assert!(triggered > 0);

        // Each tick is shorter than one block, so a handful of passes drains everything.
        for _ in 0..64 {
            renderer.render(&mut block);
        }
        assert_eq!(renderer.registry_len(), 0);
    }
}
