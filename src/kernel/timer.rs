// One-shot deadline timer
//
// start() arms relative to the clock's current tick; is_expired() is a
// level: once the deadline passes it stays true until the next start().
// A timer that was never started is unarmed and reads as not expired,
// so awaiting it suspends until someone arms it.

use core::convert::Infallible;

use log::trace;

use super::clock::{Clock, Ticks};
use super::task::Awaitable;

pub struct Timer<C: Clock> {
    clock: C,
    deadline: Option<Ticks>,
}

impl<C: Clock> Timer<C> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            deadline: None,
        }
    }

    pub fn start(&mut self, duration_ms: u32) {
        let now = self.clock.now_ms();
        let deadline = now.saturating_add(Ticks::from(duration_ms));
        trace!("timer: armed at {} for {}ms", now, duration_ms);
        self.deadline = Some(deadline);
    }

    /// Drop the deadline; the timer reads as unarmed again.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => self.clock.now_ms() >= deadline,
            None => false,
        }
    }

    /// Milliseconds left before expiry, `None` while unarmed.
    pub fn remaining(&self) -> Option<Ticks> {
        self.deadline
            .map(|deadline| deadline.saturating_sub(self.clock.now_ms()))
    }

    pub fn deadline(&self) -> Option<Ticks> {
        self.deadline
    }

    /// Non-blocking wait: `WouldBlock` until the deadline has passed.
    pub fn wait(&self) -> nb::Result<(), Infallible> {
        if self.is_expired() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<C: Clock> Awaitable for Timer<C> {
    #[inline]
    fn is_incomplete(&mut self) -> bool {
        !self.is_expired()
    }
}

impl<C: Clock> core::fmt::Debug for Timer<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timer")
            .field("deadline", &self.deadline)
            .finish()
    }
}
