// Sleeping countdowns on the dynamic scheduler
//
// Each Countdown sleeps `period_ms`, logs its count, and counts down to
// zero inclusive. Two of them with different periods are fired into a
// Scheduler and driven until both have retired.

use log::info;

use crate::kernel::{Clock, Flow, Routine, Scheduler, Timer};
use crate::{await_at, sleep_at};

/// (name, start count, period) of the countdowns the demo fires.
pub const DEMO_COUNTDOWNS: [(&str, i32, u32); 2] = [("n1", 12, 100), ("n2", 23, 113)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Sleeping,
}

pub struct Countdown<C: Clock> {
    name: &'static str,
    count: i32,
    period_ms: u32,
    timer: Timer<C>,
}

impl<C: Clock> Countdown<C> {
    pub fn new(name: &'static str, count: i32, period_ms: u32, clock: C) -> Self {
        Self {
            name,
            count,
            period_ms,
            timer: Timer::new(clock),
        }
    }

    pub fn count(&self) -> i32 {
        self.count
    }
}

impl<C: Clock> Routine for Countdown<C> {
    type Marker = Mark;

    fn resume(&mut self, at: Option<Mark>) -> Flow<Mark> {
        if at.is_some() {
            await_at!(Mark::Sleeping, self.timer);
            info!("{} c={}", self.name, self.count);
            self.count -= 1;
        }
        if self.count < 0 {
            return Flow::Done;
        }
        sleep_at!(Mark::Sleeping, self.timer, self.period_ms)
    }
}

impl<C: Clock> Drop for Countdown<C> {
    fn drop(&mut self) {
        info!("{} - done", self.name);
    }
}

/// Fire the demo countdowns into `sched`.
pub fn fire_countdowns<C: Clock + Clone + 'static>(sched: &mut Scheduler, clock: &C) {
    for (name, count, period_ms) in DEMO_COUNTDOWNS {
        sched.fire(Countdown::new(name, count, period_ms, clock.clone()));
    }
}

/// Fire the demo countdowns and heartbeat until all have retired.
/// Returns the number of rounds it took.
pub fn run_countdowns<C: Clock + Clone + 'static>(
    clock: C,
    between_rounds: impl FnMut(),
) -> usize {
    let mut sched = Scheduler::new();
    fire_countdowns(&mut sched, &clock);
    let rounds = sched.run(between_rounds);
    info!("done dynamic tasks");
    rounds
}
