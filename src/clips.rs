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

//! Preloaded clip storage.
//!
//! Clips are decoded entirely into memory at startup so that triggering one
//! never touches the disk. Once built, a [`ClipBank`] is never mutated and can
//! be read from any thread without synchronization.

mod error;
pub mod loader;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

pub use error::ClipBankError;
pub use loader::{load_directory, LoadOptions};

/// A single stereo frame (left, right).
pub type Frame = [f32; 2];

/// A named, fully decoded stereo clip.
pub struct Clip {
    /// The name of the clip as it was found on disk (file stem).
    name: String,
    /// Decoded stereo frames.
    frames: Vec<Frame>,
    /// The gain applied when a trigger doesn't override the volume.
    default_volume: f32,
}

impl Clip {
    /// Creates a new clip from already decoded stereo frames.
    pub fn new(name: &str, frames: Vec<Frame>, default_volume: f32) -> Clip {
        Clip {
            name: name.to_string(),
            frames,
            default_volume,
        }
    }

    /// Returns the original name of the clip.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the decoded frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of frames in the clip.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the clip holds no audio.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the default volume of the clip.
    pub fn default_volume(&self) -> f32 {
        self.default_volume
    }

    /// Returns the playback duration of the clip at the given sample rate.
    pub fn duration(&self, sample_rate: u32) -> Duration {
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames.len() as f64 / sample_rate as f64)
    }

    /// Returns the memory size of the decoded audio in bytes.
    pub fn memory_size(&self) -> usize {
        self.frames.len() * std::mem::size_of::<Frame>()
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("name", &self.name)
            .field("frames", &self.frames.len())
            .field("default_volume", &self.default_volume)
            .finish()
    }
}

/// Read-only mapping from clip name to decoded clip.
///
/// Keys are stored lowercased, so lookups are case-insensitive.
#[derive(Default)]
pub struct ClipBank {
    clips: HashMap<String, Arc<Clip>>,
    sample_rate: u32,
}

impl ClipBank {
    /// Builds a bank from the given clips. When two clips fold to the same key,
    /// the first one wins and the duplicate is reported.
    pub fn new<I>(sample_rate: u32, clips: I) -> ClipBank
    where
        I: IntoIterator<Item = Clip>,
    {
        let mut map: HashMap<String, Arc<Clip>> = HashMap::new();
        for clip in clips {
            let key = clip.name.to_lowercase();
            if let Some(existing) = map.get(&key) {
                warn!(
                    clip = clip.name,
                    existing = existing.name(),
                    "Duplicate clip name, keeping the first one"
                );
                continue;
            }
            map.insert(key, Arc::new(clip));
        }

        ClipBank {
            clips: map,
            sample_rate,
        }
    }

    /// Looks up a clip by name, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&Arc<Clip>> {
        match self.clips.get(name) {
            Some(clip) => Some(clip),
            None => self.clips.get(&name.to_lowercase()),
        }
    }

    /// Returns the number of clips in the bank.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Returns true if no clips were loaded.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// The sample rate every clip in this bank was decoded at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the clips sorted by name.
    pub fn sorted_list(&self) -> Vec<Arc<Clip>> {
        let mut clips: Vec<Arc<Clip>> = self.clips.values().cloned().collect();
        clips.sort_by(|a, b| a.name.cmp(&b.name));
        clips
    }

    /// Returns the total memory used by the decoded clips.
    pub fn total_memory_usage(&self) -> usize {
        self.clips.values().map(|clip| clip.memory_size()).sum()
    }
}

impl fmt::Debug for ClipBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipBank")
            .field("clips", &self.clips.len())
            .field("sample_rate", &self.sample_rate)
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let bank = ClipBank::new(
            44100,
            vec![
                Clip::new("Chime", vec![[1.0, 1.0]; 4], 0.5),
                Clip::new("horn", vec![[0.5, 0.5]; 2], 0.5),
            ],
        );

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.lookup("chime").map(|c| c.name()), Some("Chime"));
        assert_eq!(bank.lookup("CHIME").map(|c| c.name()), Some("Chime"));
        assert_eq!(bank.lookup("Horn").map(|c| c.name()), Some("horn"));
        assert!(bank.lookup("bell").is_none());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let bank = ClipBank::new(
            44100,
            vec![
                Clip::new("chime", vec![[1.0, 1.0]; 4], 0.5),
                Clip::new("CHIME", vec![[1.0, 1.0]; 8], 0.5),
            ],
        );

        assert_eq!(bank.len(), 1);
        assert_eq!(bank.lookup("chime").map(|c| c.len()), Some(4));
    }

    #[test]
    fn test_sorted_list_and_memory() {
        let bank = ClipBank::new(
            48000,
            vec![
                Clip::new("zap", vec![[0.0, 0.0]; 10], 0.5),
                Clip::new("air", vec![[0.0, 0.0]; 6], 0.5),
            ],
        );

        let names: Vec<String> = bank
            .sorted_list()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["air", "zap"]);
        assert_eq!(bank.total_memory_usage(), 16 * 8);
        assert_eq!(bank.sample_rate(), 48000);
    }

    #[test]
    fn test_clip_duration() {
        let clip = Clip::new("tick", vec![[0.0, 0.0]; 22050], 0.5);
        assert_eq!(clip.duration(44100), Duration::from_millis(500));
        assert_eq!(clip.duration(0), Duration::ZERO);
    }
}
