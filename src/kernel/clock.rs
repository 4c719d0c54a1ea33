// Millisecond tick sources
//
// Timers sample a Clock on demand; nobody owns the tick. On target the
// tick comes from a periodic timer interrupt feeding UptimeClock, hosted
// builds use SystemClock, and simulations drive a ManualClock by hand.
// Every source must be monotonic non-decreasing.

use alloc::rc::Rc;
use core::cell::Cell;

use log::warn;

/// Milliseconds since an arbitrary epoch.
pub type Ticks = u64;

pub trait Clock {
    fn now_ms(&self) -> Ticks;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> Ticks {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    #[inline]
    fn now_ms(&self) -> Ticks {
        (**self).now_ms()
    }
}

// cs: riscv32imc has no 64-bit atomics
static UPTIME_MS: critical_section::Mutex<Cell<Ticks>> =
    critical_section::Mutex::new(Cell::new(0));

/// Global uptime counter advanced from the tick interrupt.
#[derive(Debug, Clone, Copy, Default)]
pub struct UptimeClock;

impl UptimeClock {
    /// Call from the periodic timer ISR with the elapsed period.
    #[inline]
    pub fn advance(ms: u32) {
        critical_section::with(|cs| {
            let ticks = UPTIME_MS.borrow(cs);
            ticks.set(ticks.get().saturating_add(Ticks::from(ms)));
        });
    }

    pub fn uptime_ms() -> Ticks {
        critical_section::with(|cs| UPTIME_MS.borrow(cs).get())
    }
}

impl Clock for UptimeClock {
    #[inline]
    fn now_ms(&self) -> Ticks {
        Self::uptime_ms()
    }
}

/// Hand-driven clock for simulations and tests.
///
/// Clones share the same tick, so one clone can be handed to every
/// timer while the driver loop keeps another to advance time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Ticks>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now: Ticks) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn now(&self) -> Ticks {
        self.now.get()
    }

    pub fn advance(&self, ms: Ticks) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to an absolute tick. Moving backwards is ignored.
    pub fn set(&self, now: Ticks) {
        if now < self.now.get() {
            warn!(
                "clock: refusing to move backwards ({} -> {})",
                self.now.get(),
                now
            );
            return;
        }
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> Ticks {
        self.now.get()
    }
}

/// Monotonic OS clock, counting from its own construction.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> Ticks {
        Ticks::try_from(self.epoch.elapsed().as_millis()).unwrap_or(Ticks::MAX)
    }
}

/// Embassy time driver tick, for firmware already running embassy.
#[cfg(feature = "embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    #[inline]
    fn now_ms(&self) -> Ticks {
        embassy_time::Instant::now().as_millis()
    }
}
