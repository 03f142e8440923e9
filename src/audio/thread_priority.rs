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

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{debug, info, warn};

const PRIORITY_ENV: &str = "UDPBOARD_THREAD_PRIORITY";
const DISABLE_RT_ENV: &str = "UDPBOARD_DISABLE_RT_AUDIO";

/// Priority for the audio callback thread when UDPBOARD_THREAD_PRIORITY is unset.
const DEFAULT_CALLBACK_THREAD_PRIORITY: u8 = 70;

/// Priority settings for the render thread, read once when the stream is built.
#[derive(Debug, Clone, Copy)]
pub struct CallbackPriority {
    priority: u8,
    rt_audio: bool,
    applied: bool,
}

impl CallbackPriority {
    /// Reads UDPBOARD_THREAD_PRIORITY (0-99) and UDPBOARD_DISABLE_RT_AUDIO.
    pub fn from_env() -> CallbackPriority {
        CallbackPriority {
            priority: callback_thread_priority(std::env::var(PRIORITY_ENV).ok().as_deref()),
            rt_audio: !env_flag(DISABLE_RT_ENV),
            applied: false,
        }
    }

    /// Raises the priority of the calling thread. Only the first call does anything;
    /// the callback calls this on every block.
    #[inline]
    pub fn apply_once(&mut self) {
        if self.applied {
            return;
        }
        self.applied = true;
        configure_current_thread(self.priority, self.rt_audio);
    }
}

fn callback_thread_priority(value: Option<&str>) -> u8 {
    value
        .and_then(|v| v.trim().parse::<u8>().ok())
        .filter(|n| *n < 100)
        .unwrap_or(DEFAULT_CALLBACK_THREAD_PRIORITY)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| flag_value(&v))
}

fn flag_value(v: &str) -> bool {
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

fn configure_current_thread(priority: u8, rt_audio: bool) {
    let priority = match ThreadPriorityValue::try_from(priority) {
        Ok(priority) => priority,
        Err(e) => {
            warn!(priority, error = e, "Invalid audio callback thread priority");
            return;
        }
    };
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        debug!(error = ?e, "Unable to raise audio callback thread priority");
    }

    #[cfg(unix)]
    if rt_audio {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        match set_thread_priority_and_policy(
            thread_native_id(),
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for audio callback thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for audio callback thread"),
        }
    }

    #[cfg(not(unix))]
    let _ = rt_audio;
}
