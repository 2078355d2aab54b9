// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! A fixed-period tick accumulator: the server loop's "while the
//! accumulator is >= frameMsec, run one tick" driver, decoupled from
//! whatever clock or async runtime feeds it elapsed time.

use arena_core::FRAME_MSEC;

/// Accumulates elapsed milliseconds and yields how many whole server ticks
/// have become due, draining the accumulator by that many `frame_msec`
/// periods.
#[derive(Debug, Clone, Copy)]
pub struct TickAccumulator {
    frame_msec: u32,
    accumulated: u32,
    level_time: u32,
}

impl TickAccumulator {
    pub fn new() -> Self {
        Self::with_frame_msec(FRAME_MSEC)
    }

    pub fn with_frame_msec(frame_msec: u32) -> Self {
        Self { frame_msec, accumulated: 0, level_time: 0 }
    }

    pub fn level_time(&self) -> u32 {
        self.level_time
    }

    /// Adds `elapsed_msec` of real time and returns the number of ticks
    /// that are now due. Each due tick advances `level_time` by
    /// `frame_msec`.
    pub fn advance(&mut self, elapsed_msec: u32) -> u32 {
        self.accumulated += elapsed_msec;
        let mut ticks = 0;
        while self.accumulated >= self.frame_msec {
            self.accumulated -= self.frame_msec;
            self.level_time += self.frame_msec;
            ticks += 1;
        }
        ticks
    }
}

impl Default for TickAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_yields_matching_tick_count() {
        let mut acc = TickAccumulator::with_frame_msec(50);
        assert_eq!(acc.advance(175), 3);
        assert_eq!(acc.level_time(), 150);
    }

    #[test]
    fn leftover_time_carries_to_the_next_advance() {
        let mut acc = TickAccumulator::with_frame_msec(50);
        assert_eq!(acc.advance(60), 1);
        assert_eq!(acc.advance(45), 1);
        assert_eq!(acc.level_time(), 100);
    }
}
