//! Cancellable one-shot timers for deferred work.

use core::time::Duration;

use heapless::Vec;

use crate::sync::IrqMutex;
use crate::work::Work;

/// Number of timers the wheel can hold; one per [`Work`] kind.
const MAX_TIMERS: usize = 3;

/// Work items that expired during one [`TimerWheel::advance`], earliest first.
pub type Expired = Vec<Work, MAX_TIMERS>;

/// One-shot timer that posts `work` when it runs out.
#[derive(Debug, Clone, Copy)]
struct DelayedWork {
    work: Work,
    remaining_ms: u64,
    armed: bool,
}

impl DelayedWork {
    fn arm(&mut self, delay_ms: u64) {
        self.remaining_ms = delay_ms;
        self.armed = true;
    }

    fn disarm(&mut self) -> bool {
        let was_armed = self.armed;
        self.armed = false;
        self.remaining_ms = 0;
        was_armed
    }
}

/// Millisecond timer wheel driven by [`TimerWheel::advance`].
///
/// Arming a timer that is already armed restarts it with the new delay.
/// Timers are one-shot: periodic users re-arm from the work they post, so the
/// period counts from when the work actually ran.
///
/// Interrupt entry points arm timers while the worker may be advancing the
/// wheel, so the timers live behind an [`IrqMutex`].
pub struct TimerWheel {
    timers: IrqMutex<Vec<DelayedWork, MAX_TIMERS>>,
}

impl TimerWheel {
    pub const fn new() -> Self {
        Self {
            timers: IrqMutex::new(Vec::new()),
        }
    }

    pub fn arm(&self, work: Work, delay: Duration) {
        let delay_ms = duration_ms(delay);
        self.timers.with(|timers| {
            if let Some(timer) = timers.iter_mut().find(|t| t.work == work) {
                timer.arm(delay_ms);
                return;
            }
            let mut timer = DelayedWork {
                work,
                remaining_ms: 0,
                armed: false,
            };
            timer.arm(delay_ms);
            // One slot per work kind, cannot overflow
            let _ = timers.push(timer);
        });
    }

    /// Disarms the timer for `work`, returning whether it was armed.
    pub fn cancel(&self, work: Work) -> bool {
        self.timers.with(|timers| {
            timers
                .iter_mut()
                .find(|t| t.work == work)
                .map(DelayedWork::disarm)
                .unwrap_or(false)
        })
    }

    pub fn is_armed(&self, work: Work) -> bool {
        self.remaining(work).is_some()
    }

    /// Time left before `work` is posted, if its timer is armed.
    pub fn remaining(&self, work: Work) -> Option<Duration> {
        self.timers.with(|timers| {
            timers
                .iter()
                .find(|t| t.work == work && t.armed)
                .map(|t| Duration::from_millis(t.remaining_ms))
        })
    }

    /// Moves time forward and returns the work whose timers ran out.
    pub fn advance(&self, elapsed: Duration) -> Expired {
        let elapsed_ms = duration_ms(elapsed);
        let mut due: Vec<(u64, Work), MAX_TIMERS> = Vec::new();

        self.timers.with(|timers| {
            for timer in timers.iter_mut().filter(|t| t.armed) {
                if timer.remaining_ms <= elapsed_ms {
                    let _ = due.push((timer.remaining_ms, timer.work));
                    timer.disarm();
                } else {
                    timer.remaining_ms -= elapsed_ms;
                }
            }
        });

        due.sort_unstable_by_key(|&(remaining, _)| remaining);
        due.into_iter().map(|(_, work)| work).collect()
    }
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
