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

use super::registry::PlaybackRegistry;

/// The real-time half of the mixer. Lives inside the audio callback.
pub struct Renderer {
    registry: PlaybackRegistry,
}

impl Renderer {
    pub(super) fn new(registry: PlaybackRegistry) -> Renderer {
        Renderer { registry }
    }

    /// Renders one block of interleaved stereo audio into `out`.
    ///
    /// The block is zeroed, every active instance is summed in at its own gain,
    /// finished instances are dropped from the registry and the result is
    /// hard-clipped to [-1.0, 1.0]. Doesn't allocate, lock or block.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        self.registry.admit_pending();

        // A trailing half frame (odd length) is left silent.
        let stereo_len = out.len() - out.len() % 2;
        let block = &mut out[..stereo_len];
        for instance in self.registry.active_mut() {
            instance.mix_into(block);
        }

        self.registry.sweep();

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Active plus pending instances.
    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Instances currently being mixed.
    pub fn active_len(&self) -> usize {
        self.registry.active_len()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::clips::{Clip, ClipBank};
    use crate::mixer::{self, Trigger, TriggerOutcome};

    use super::*;

    fn bank(clips: Vec<Clip>) -> Arc<ClipBank> {
        Arc::new(ClipBank::new(44100, clips))
    }

    fn ramp(name: &str, frames: usize, volume: f32) -> Clip {
        Clip::new(
            name,
            (0..frames)
                .map(|i| {
                    let v = i as f32 / frames as f32;
                    [v, -v]
                })
                .collect(),
            volume,
        )
    }

    fn render_passes(trigger_names: &[&str], bank: Arc<ClipBank>, passes: usize) -> Vec<f32> {
        let (trigger, mut renderer): (Trigger, Renderer) = mixer::new(bank, 16, 16);
        for name in trigger_names {
            trigger.trigger(name, None);
        }

        let mut output = Vec::new();
        let mut block = vec![0.0; 8];
        for _ in 0..passes {
            renderer.render(&mut block);
            output.extend_from_slice(&block);
        }
        output
    }

    #[test]
    fn test_mixing_is_commutative() {
        let clips = || {
            bank(vec![
                ramp("rise", 10, 0.5),
                Clip::new("buzz", vec![[0.125, -0.25]; 7], 0.5),
            ])
        };

        let ab = render_passes(&["rise", "buzz"], clips(), 4);
        let ba = render_passes(&["buzz", "rise"], clips(), 4);

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_output_is_hard_clipped() {
        let loud = bank(vec![Clip::new("loud", vec![[0.9, -0.9]; 8], 1.0)]);
        let output = render_passes(&["loud", "loud", "loud"], loud, 3);

        assert!(output.iter().all(|s| s.abs() <= 1.0));
        assert_eq!(&output[..2], &[1.0, -1.0]);
    }

    #[test]
    fn test_instance_lifetime_in_passes() {
        // 10 frames with 4-frame blocks -> ceil(10 / 4) = 3 passes.
        let clips = bank(vec![Clip::new("ten", vec![[0.5, 0.5]; 10], 1.0)]);
        let (trigger, mut renderer) = mixer::new(clips, 16, 16);
        trigger.trigger("ten", None);

        let mut block = vec![0.0; 8];
        let mut audible_passes = 0;
        for pass in 0..6 {
            renderer.render(&mut block);
            if block.iter().any(|s| *s != 0.0) {
                audible_passes += 1;
            }
            let expected_len = if pass < 2 { 1 } else { 0 };
            assert_eq!(renderer.registry_len(), expected_len, "pass {}", pass);
        }
        assert_eq!(audible_passes, 3);
    }

    #[test]
    fn test_tail_of_last_block_is_silent() {
        let clips = bank(vec![Clip::new("six", vec![[0.5, 0.5]; 6], 1.0)]);
        let (trigger, mut renderer) = mixer::new(clips, 16, 16);
        trigger.trigger("six", None);

        let mut block = vec![0.0; 8];
        renderer.render(&mut block);
        assert_eq!(block, vec![0.5; 8]);
        renderer.render(&mut block);
        assert_eq!(block, vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_odd_length_buffer() {
        let clips = bank(vec![Clip::new("one", vec![[0.5, 0.5]; 4], 1.0)]);
        let (trigger, mut renderer) = mixer::new(clips, 16, 16);
        trigger.trigger("one", None);

        let mut block = vec![0.3; 5];
        renderer.render(&mut block);
        assert_eq!(block, vec![0.5, 0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_stale_block_contents_are_cleared() {
        let (_trigger, mut renderer) = mixer::new(bank(vec![]), 16, 16);
        let mut block = vec![0.7; 8];
        renderer.render(&mut block);
        assert_eq!(block, vec![0.0; 8]);
    }

    #[test]
    fn test_accepted_triggers_overlap_immediately() {
        let clips = bank(vec![Clip::new("pad", vec![[0.25, 0.25]; 12], 1.0)]);
        let (trigger, mut renderer) = mixer::new(clips, 1, 16);

        assert_eq!(trigger.trigger("pad", None), TriggerOutcome::Triggered);
        assert_eq!(trigger.trigger("pad", None), TriggerOutcome::Dropped);

        let mut block = vec![0.0; 8];
        renderer.render(&mut block);
        assert_eq!(block, vec![0.25; 8]);
        assert_eq!(renderer.active_len(), 1);
        assert_eq!(renderer.registry_len(), 1);

        // A voice frees up only once the first instance has finished.
        renderer.render(&mut block);
        renderer.render(&mut block);
        assert_eq!(renderer.active_len(), 0);
        assert_eq!(trigger.trigger("pad", None), TriggerOutcome::Triggered);
        renderer.render(&mut block);
        assert_eq!(block, vec![0.25; 8]);
    }

    #[test]
    fn test_triggers_within_capacity_sum_on_next_pass() {
        let clips = bank(vec![Clip::new("pad", vec![[0.25, 0.25]; 12], 1.0)]);
        let (trigger, mut renderer) = mixer::new(clips, 2, 16);

        trigger.trigger("pad", None);
        trigger.trigger("pad", None);

        let mut block = vec![0.0; 8];
        renderer.render(&mut block);
        assert_eq!(block, vec![0.5; 8]);
        assert_eq!(renderer.active_len(), 2);
    }
}
