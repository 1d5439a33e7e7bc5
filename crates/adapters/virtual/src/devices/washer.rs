//! Virtual washer — a status blob driven by power and setting commands.
//!
//! The simulated firmware follows the real one where it matters to the
//! bridge: a remote `start` is ignored while the machine sits in standby, a
//! running cycle counts `washing_left` down on the tokio clock, and program
//! or mode writes are ignored while a cycle runs.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use washhub_domain::device::Device;
use washhub_domain::error::CloudError;

use super::unsupported;

const STANDBY: i64 = 1;
const WASHING: i64 = 2;
const PAUSED: i64 = 10;
const FINISHED: i64 = 11;
const READY: i64 = 12;

/// A simulated washing machine.
pub struct VirtualWasher {
    device: Device,
    state: Mutex<WasherState>,
}

impl VirtualWasher {
    /// Create a washer in standby with factory settings.
    #[must_use]
    pub fn new(device: Device) -> Self {
        Self {
            device,
            state: Mutex::new(WasherState::default()),
        }
    }

    /// Start from the ready state, as if someone pressed the panel button.
    #[must_use]
    pub fn powered_on(self) -> Self {
        self.press_power();
        self
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Press the physical power button: standby wakes to ready, anything
    /// else goes back to standby.
    pub fn press_power(&self) {
        let mut state = self.lock_state();
        state.settle(Instant::now());
        if state.status == STANDBY {
            state.status = READY;
            state.left = state.cycle_length();
        } else {
            state.stop();
        }
    }

    /// The full status blob as the cloud would return it.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        let now = Instant::now();
        let mut state = self.lock_state();
        state.settle(now);
        state.blob(now)
    }

    /// Apply one protocol write.
    ///
    /// # Errors
    ///
    /// Returns a transport error for codes the washer does not know.
    pub fn apply(&self, code: u16, value: i64) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut state = self.lock_state();
        state.settle(now);
        match code {
            200 => state.start(now),
            201 => state.pause(now),
            202 => state.stop(),
            204 | 205 if state.is_running() => {
                tracing::debug!(code, "setting ignored while a cycle runs");
            }
            204 => {
                state.mode = value;
                state.preview();
            }
            205 => {
                state.program = value;
                state.preview();
            }
            207 => state.temp = value,
            208 => state.rinse_times = value,
            209 => state.spin_level = value,
            210 => state.drying_mode = value,
            213 => state.detergent_type = value,
            223 => state.sound_set = value != 0,
            _ => return Err(unsupported(code)),
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, WasherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct WasherState {
    status: i64,
    /// End of the running cycle; `None` when not running.
    running_until: Option<Instant>,
    /// Remaining cycle time while not running.
    left: Duration,
    times_after_clean: i64,
    mode: i64,
    program: i64,
    temp: i64,
    spin_level: i64,
    rinse_times: i64,
    drying_mode: i64,
    detergent_type: i64,
    sound_set: bool,
}

impl Default for WasherState {
    fn default() -> Self {
        Self {
            status: STANDBY,
            running_until: None,
            left: Duration::ZERO,
            times_after_clean: 3,
            mode: 1,
            program: 1,
            temp: 3,
            spin_level: 5,
            rinse_times: 2,
            drying_mode: 0,
            detergent_type: 2,
            sound_set: true,
        }
    }
}

impl WasherState {
    fn is_running(&self) -> bool {
        self.running_until.is_some()
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.running_until
            .map_or(self.left, |until| until.saturating_duration_since(now))
    }

    /// Finish the cycle if its time is up.
    fn settle(&mut self, now: Instant) {
        let Some(until) = self.running_until else {
            return;
        };
        if until <= now {
            self.running_until = None;
            self.left = Duration::ZERO;
            self.status = FINISHED;
            self.times_after_clean += 1;
        }
    }

    fn start(&mut self, now: Instant) {
        match self.status {
            READY | FINISHED => self.left = self.cycle_length(),
            PAUSED => {}
            _ => return,
        }
        self.running_until = Some(now + self.left);
        self.status = WASHING;
    }

    fn pause(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        self.left = self.remaining(now);
        self.running_until = None;
        self.status = PAUSED;
    }

    fn stop(&mut self) {
        self.running_until = None;
        self.left = Duration::ZERO;
        self.status = STANDBY;
    }

    fn preview(&mut self) {
        if self.status == READY {
            self.left = self.cycle_length();
        }
    }

    fn cycle_length(&self) -> Duration {
        let wash: u64 = match self.program {
            2 => 15,
            11 => 12,
            10 => 20,
            1 => 60,
            4 | 9 | 21 => 45,
            _ => 90,
        };
        let dry = match self.mode {
            2 => 60,
            3 => 90,
            _ => 0,
        };
        let minutes = if self.mode == 3 { dry } else { wash + dry };
        Duration::from_secs(minutes * 60)
    }

    fn blob(&self, now: Instant) -> serde_json::Value {
        json!({
            "status": self.status,
            "countdown": 0,
            "washing_left": self.remaining(now).as_secs().div_ceil(60),
            "error": 0,
            "times_after_clean": self.times_after_clean,
            "detergent_empty": i64::from(self.detergent_type == 0),
            "mode": self.mode,
            "program": self.program,
            "temp": self.temp,
            "spin_level": self.spin_level,
            "rinse_times": self.rinse_times,
            "drying_mode": self.drying_mode,
            "detergent_type": self.detergent_type,
            "sound_set": i64::from(self.sound_set),
        })
    }
}
