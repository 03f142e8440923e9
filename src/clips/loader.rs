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

//! Loads a directory of audio files into a [`ClipBank`].
//!
//! Every file is decoded fully into memory with symphonia. Files are decoded in
//! parallel since loading happens once, before any audio or network activity.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info, warn};

use super::{Clip, ClipBank, ClipBankError, Frame};

/// File extensions that are picked up from the sound directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg"];

/// Default volume for clips without a configured override.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// A minute at 48kHz.
const MAX_PREALLOCATED_FRAMES: u64 = 48_000 * 60;

/// Options that control how a sound directory is turned into clips.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Every clip must be encoded at this rate.
    pub sample_rate: u32,
    /// The default volume for clips without an entry in `volumes`.
    pub default_volume: f32,
    /// Per-clip default volumes, keyed by lowercased clip name.
    pub volumes: HashMap<String, f32>,
}

impl LoadOptions {
    /// Creates load options with the standard default volume.
    pub fn new(sample_rate: u32) -> LoadOptions {
        LoadOptions {
            sample_rate,
            default_volume: DEFAULT_VOLUME,
            volumes: HashMap::new(),
        }
    }

    /// Returns the default volume for the given clip name.
    pub fn volume_for(&self, name: &str) -> f32 {
        self.volumes
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(self.default_volume)
    }
}

/// Returns true if the path has one of the supported audio extensions.
fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Lists the supported audio files directly inside the given directory, sorted by path.
pub fn list_clip_files(path: &Path) -> Result<Vec<PathBuf>, ClipBankError> {
    if !path.is_dir() {
        return Err(ClipBankError::MissingDirectory(path.to_path_buf()));
    }

    let entries = fs::read_dir(path).map_err(|source| ClipBankError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ClipBankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_path = entry.path();
        if file_path.is_file() && is_supported(&file_path) {
            files.push(file_path);
        }
    }

    files.sort();
    Ok(files)
}

/// Loads every supported file in the directory (non-recursively) into a clip bank.
pub fn load_directory(path: &Path, options: &LoadOptions) -> Result<ClipBank, ClipBankError> {
    let files = list_clip_files(path)?;
    info!(
        path = ?path,
        files = files.len(),
        sample_rate = options.sample_rate,
        "Loading clips"
    );

    let clips = files
        .par_iter()
        .map(|file| load_clip(file, options))
        .collect::<Result<Vec<Clip>, ClipBankError>>()?;

    let bank = ClipBank::new(options.sample_rate, clips);
    info!(
        clips = bank.len(),
        memory_kb = bank.total_memory_usage() / 1024,
        "Loaded clips"
    );

    Ok(bank)
}

/// Decodes a single file into a clip, named after the file stem.
pub fn load_clip(path: &Path, options: &LoadOptions) -> Result<Clip, ClipBankError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let frames = decode_stereo(path, options.sample_rate)?;
    let volume = options.volume_for(&name);

    debug!(
        clip = name,
        frames = frames.len(),
        volume,
        "Clip decoded"
    );

    Ok(Clip::new(&name, frames, volume))
}

/// Decodes an audio file into stereo frames. Mono files have their channel duplicated,
/// and files with more than two channels keep only the first two.
pub fn decode_stereo(path: &Path, expected_rate: u32) -> Result<Vec<Frame>, ClipBankError> {
    let decode_err = |source: SymphoniaError| ClipBankError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| ClipBankError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_err)?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ClipBankError::NoAudioTrack(path.to_path_buf()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| ClipBankError::UnknownSampleRate(path.to_path_buf()))?;
    if sample_rate != expected_rate {
        return Err(ClipBankError::SampleRateMismatch {
            path: path.to_path_buf(),
            expected: expected_rate,
            found: sample_rate,
        });
    }

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut frames: Vec<Frame> =
        Vec::with_capacity(initial_frame_capacity(track.codec_params.n_frames));
    let mut sample_buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_err(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packets are skipped, the rest of the file is still usable.
                warn!(path = ?path, err = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(decode_err(e)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 || decoded.frames() == 0 {
            continue;
        }

        let required = decoded.capacity() * channels;
        if sample_buffer
            .as_ref()
            .map_or(true, |buffer| buffer.capacity() < required)
        {
            sample_buffer = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        if let Some(buffer) = sample_buffer.as_mut() {
            buffer.copy_interleaved_ref(decoded);
            append_stereo(&mut frames, buffer.samples(), channels);
        }
    }

    Ok(frames)
}

/// How many frames to reserve up front. The header's frame count is only a hint and
/// may be corrupt, so anything past the cap grows as packets decode.
fn initial_frame_capacity(n_frames: Option<u64>) -> usize {
    n_frames
        .map(|n| n.min(MAX_PREALLOCATED_FRAMES))
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// Appends interleaved samples with the given channel count to a stereo frame list.
fn append_stereo(frames: &mut Vec<Frame>, samples: &[f32], channels: usize) {
    match channels {
        0 => {}
        1 => frames.extend(samples.iter().map(|&s| [s, s])),
        _ => frames.extend(
            samples
                .chunks_exact(channels)
                .map(|frame| [frame[0], frame[1]]),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_append_stereo_mono_duplicates_channel() {
        let mut frames = Vec::new();
        append_stereo(&mut frames, &[0.1, 0.2, 0.3], 1);
        assert_eq!(frames, vec![[0.1, 0.1], [0.2, 0.2], [0.3, 0.3]]);
    }

    #[test]
    fn test_initial_frame_capacity_is_capped() {
        assert_eq!(initial_frame_capacity(None), 0);
        assert_eq!(initial_frame_capacity(Some(1024)), 1024);
        assert_eq!(
            initial_frame_capacity(Some(u64::MAX)),
            MAX_PREALLOCATED_FRAMES as usize
        );
    }

    #[test]
    fn test_append_stereo_drops_extra_channels() {
        let mut frames = Vec::new();
        append_stereo(&mut frames, &[0.1, 0.2, 0.9, 0.3, 0.4, 0.9], 3);
        assert_eq!(frames, vec![[0.1, 0.2], [0.3, 0.4]]);
    }

    #[test]
    fn test_load_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write_wav(&dir.path().join("chime.wav"), 2, 44100, &[0.5; 8])?;
        write_wav(&dir.path().join("Horn.WAV"), 1, 44100, &[0.25; 3])?;
        fs::write(dir.path().join("notes.txt"), "not audio")?;
        fs::create_dir(dir.path().join("nested"))?;
        write_wav(&dir.path().join("nested").join("deep.wav"), 1, 44100, &[0.1])?;

        let mut options = LoadOptions::new(44100);
        options.volumes.insert("horn".to_string(), 0.8);
        let bank = load_directory(dir.path(), &options)?;

        assert_eq!(bank.len(), 2);
        assert!(bank.lookup("deep").is_none());

        let chime = bank.lookup("chime").ok_or("missing chime")?;
        assert_eq!(chime.len(), 4);
        assert_eq!(chime.default_volume(), DEFAULT_VOLUME);
        for frame in chime.frames() {
            assert!((frame[0] - 0.5).abs() < 1e-3);
            assert!((frame[1] - 0.5).abs() < 1e-3);
        }

        let horn = bank.lookup("horn").ok_or("missing horn")?;
        assert_eq!(horn.name(), "Horn");
        assert_eq!(horn.len(), 3);
        assert_eq!(horn.default_volume(), 0.8);
        for frame in horn.frames() {
            assert!((frame[0] - 0.25).abs() < 1e-3);
            assert_eq!(frame[0], frame[1]);
        }

        Ok(())
    }

    #[test]
    fn test_sample_rate_mismatch_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write_wav(&dir.path().join("fast.wav"), 2, 48000, &[0.0; 4])?;

        match load_directory(dir.path(), &LoadOptions::new(44100)) {
            Err(ClipBankError::SampleRateMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, 44100);
                assert_eq!(found, 48000);
            }
            other => panic!("expected sample rate mismatch, got {:?}", other.map(|b| b.len())),
        }

        Ok(())
    }

    #[test]
    fn test_missing_directory() {
        let result = load_directory(Path::new("/nonexistent/udpboard/sounds"), &LoadOptions::new(44100));
        assert!(matches!(result, Err(ClipBankError::MissingDirectory(_))));
    }

    #[test]
    fn test_undecodable_file_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("broken.wav"), b"definitely not a wav file")?;

        assert!(load_directory(dir.path(), &LoadOptions::new(44100)).is_err());
        Ok(())
    }
}
