//! Time mode (spec.md §3.3, §6.2): whether `timestamp` advances from wall clock
//! (`Realtime`) or by a fixed `dt` per scan (`FixedStep`), regardless of wall clock.

/// `wall_clock_seconds` supplies the time source for `Realtime` mode and for RTC offsets; a
/// test harness substitutes a deterministic clock here instead of the real one (mirroring
/// `ladder_sys::SystemPointRuntime::new`'s same parameter).
pub type WallClock = fn() -> f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeMode {
    Realtime,
    FixedStep { dt: f64 },
}

/// Tracks the last wall-clock reading so `Realtime` mode can compute a `dt` between scans.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    mode: TimeMode,
    wall_clock: WallClock,
    last_wall_clock_seconds: f64,
}

impl Clock {
    pub fn new(mode: TimeMode, wall_clock: WallClock) -> Self {
        Clock {
            mode,
            wall_clock,
            last_wall_clock_seconds: wall_clock(),
        }
    }

    pub fn set_mode(&mut self, mode: TimeMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    pub fn wall_clock_seconds(&self) -> f64 {
        (self.wall_clock)()
    }

    /// Resets the `Realtime` baseline; called on Stop->Run and Reboot transitions so the
    /// first scan after a restart does not see a large, stale `dt`.
    pub fn resync(&mut self) {
        self.last_wall_clock_seconds = (self.wall_clock)();
    }

    /// The `dt` for the next scan (spec.md §6.2): `FixedStep` ignores wall time entirely;
    /// `Realtime` measures elapsed wall-clock seconds since the previous call.
    pub fn next_dt(&mut self) -> f64 {
        match self.mode {
            TimeMode::FixedStep { dt } => dt,
            TimeMode::Realtime => {
                let now = (self.wall_clock)();
                let dt = (now - self.last_wall_clock_seconds).max(0.0);
                self.last_wall_clock_seconds = now;
                dt
            }
        }
    }
}
