//! Time management for XBoard's `level` time control.
//!
//! Reduces a `level <moves> <time> <increment>` command to a single "has
//! this move's budget run out" predicate, fed to `proceed_with_batch`
//! rather than threaded through the search itself.

use std::time::{Duration, Instant};

use crate::error::{self, ErrorKind};

/// A parsed `level <moves> <time> <increment>` command: `moves` moves must
/// be made within `time`, gaining `increment` seconds back after each one.
/// `moves == 0` means the whole rest of the game falls in one period.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TimeControl {
    pub moves_per_period: u32,
    pub seconds_per_period: u32,
    pub increment: u32,
}

impl TimeControl {
    pub fn new(moves_per_period: u32, seconds_per_period: u32, increment: u32) -> Self {
        Self {
            moves_per_period,
            seconds_per_period,
            increment,
        }
    }

    /// `increment + seconds_per_period / moves_per_period`. A
    /// `moves_per_period` of 0 (the rest of the game in one period) is
    /// treated as 1 move, since dividing by the actual remaining move
    /// count isn't information this type tracks.
    pub fn guaranteed_time_per_move(&self) -> Duration {
        let divisor = self.moves_per_period.max(1);
        let seconds = self.increment as u64 + (self.seconds_per_period as u64 / divisor as u64);
        Duration::from_secs(seconds)
    }

    /// Parses the three space-separated fields of an XBoard `level`
    /// command. `<time>` is `MM` or `MM:SS`.
    pub fn parse(moves: &str, time: &str, increment: &str) -> error::Result<Self> {
        let moves_per_period: u32 = moves
            .parse()
            .map_err(|_| error::Error::from((ErrorKind::ModeNotSatisfied, "level: bad moves field")))?;
        let seconds_per_period = parse_time_field(time)?;
        let increment: u32 = increment
            .parse()
            .map_err(|_| error::Error::from((ErrorKind::ModeNotSatisfied, "level: bad increment field")))?;

        Ok(Self::new(moves_per_period, seconds_per_period, increment))
    }
}

/// Parses `MM` or `MM:SS` into a total second count.
fn parse_time_field(time: &str) -> error::Result<u32> {
    match time.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes
                .parse()
                .map_err(|_| error::Error::from((ErrorKind::ModeNotSatisfied, "level: bad minutes field")))?;
            let seconds: u32 = seconds
                .parse()
                .map_err(|_| error::Error::from((ErrorKind::ModeNotSatisfied, "level: bad seconds field")))?;
            Ok(minutes * 60 + seconds)
        }
        None => {
            let minutes: u32 = time
                .parse()
                .map_err(|_| error::Error::from((ErrorKind::ModeNotSatisfied, "level: bad minutes field")))?;
            Ok(minutes * 60)
        }
    }
}

/// Tracks how long the current move has been thinking against a
/// [`TimeControl`]'s guaranteed budget: Play-mode's `proceed_with_batch`
/// keeps going while under 95% of the guaranteed time per move.
#[derive(Debug, Copy, Clone)]
pub struct MoveClock {
    control: TimeControl,
    started_at: Instant,
}

impl MoveClock {
    pub fn start(control: TimeControl) -> Self {
        Self {
            control,
            started_at: Instant::now(),
        }
    }

    /// True while elapsed time is under 95% of the guaranteed budget.
    pub fn within_budget(&self) -> bool {
        let budget = self.control.guaranteed_time_per_move();
        let threshold = budget.mul_f64(0.95);
        self.started_at.elapsed() < threshold
    }
}
