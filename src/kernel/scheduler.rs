// Round-robin cooperative scheduler
//
// Two task lists trade roles every round: the active list is walked in
// insertion order, each task gets exactly one step, and survivors are
// moved to the passive list, which becomes the next round's active list.
// Finished tasks are dropped from the schedule the moment they report
// done.
//
// Tasks spawned while a round is in progress go through a Spawner into a
// pending buffer, never into the list being walked; they join the active
// list at the start of the next round.
//
// NOTE: no priorities, no fairness beyond list order, one thread only.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem;

use log::{debug, trace, warn};

use super::task::{Coroutine, Flow, Routine};
use crate::yield_at;

/// One-step-at-a-time view of a coroutine, independent of its routine type.
pub trait Pollable {
    /// Run one step; `true` once the task is finished.
    fn poll(&mut self) -> bool;
}

impl<R: Routine> Pollable for Coroutine<R> {
    #[inline]
    fn poll(&mut self) -> bool {
        self.step()
    }
}

/// Shared handle to a scheduled task.
pub type TaskRef = Rc<RefCell<dyn Pollable>>;

/// Wrap a routine in a fresh coroutine behind a shared handle.
pub fn task_ref<R: Routine + 'static>(routine: R) -> TaskRef {
    Rc::new(RefCell::new(Coroutine::new(routine)))
}

/// Cloneable handle for adding tasks from inside a running task.
#[derive(Clone, Default)]
pub struct Spawner {
    pending: Rc<RefCell<Vec<TaskRef>>>,
}

impl Spawner {
    pub fn spawn(&self, task: TaskRef) {
        self.pending.borrow_mut().push(task);
        debug!("sched: task spawned ({} pending)", self.pending());
    }

    /// Spawn a routine and hand back its handle.
    pub fn fire<R: Routine + 'static>(&self, routine: R) -> TaskRef {
        let task = task_ref(routine);
        self.spawn(task.clone());
        task
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    fn drain_into(&self, list: &mut Vec<TaskRef>) {
        list.append(&mut self.pending.borrow_mut());
    }
}

/// The two role-swapping lists. Runs as a routine that never finishes.
#[derive(Default)]
pub struct TaskList {
    lists: [Vec<TaskRef>; 2],
    half: usize,
    spawner: Spawner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMark {
    NextRound,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn active_idx(&self) -> usize {
        self.half & 1
    }

    pub fn add(&mut self, task: TaskRef) {
        let idx = self.active_idx();
        self.lists[idx].push(task);
    }

    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Tasks waiting for their next step, including pending spawns.
    ///
    /// Reflects the previous round's survivors until the current round
    /// finishes.
    pub fn active_count(&self) -> usize {
        self.lists[self.active_idx()].len() + self.spawner.pending()
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> usize {
        self.half
    }

    fn run_round(&mut self) {
        let [first, second] = &mut self.lists;
        let (active, passive) = if self.half & 1 == 0 {
            (first, second)
        } else {
            (second, first)
        };

        passive.clear();
        self.spawner.drain_into(active);

        let batch = mem::take(active);
        trace!("sched: round {} polling {} tasks", self.half, batch.len());

        for task in batch {
            let done = match task.try_borrow_mut() {
                Ok(mut t) => t.poll(),
                Err(_) => {
                    // The task is polling the scheduler that polls it.
                    warn!("sched: task busy, skipped this round");
                    false
                }
            };
            if done {
                debug!("sched: task retired");
            } else {
                passive.push(task);
            }
        }

        // swap list roles
        self.half = self.half.wrapping_add(1);
    }
}

impl Routine for TaskList {
    type Marker = RoundMark;

    fn resume(&mut self, _at: Option<RoundMark>) -> Flow<RoundMark> {
        self.run_round();
        yield_at!(RoundMark::NextRound)
    }
}

/// Dynamic task scheduler driven by an external loop.
pub struct Scheduler {
    task: Coroutine<TaskList>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            task: Coroutine::new(TaskList::new()),
        }
    }

    pub fn add(&mut self, task: TaskRef) {
        self.task.routine_mut().add(task);
    }

    /// Wrap a routine, schedule it, and return its handle.
    pub fn fire<R: Routine + 'static>(&mut self, routine: R) -> TaskRef {
        let task = task_ref(routine);
        self.add(task.clone());
        task
    }

    pub fn spawner(&self) -> Spawner {
        self.task.routine().spawner()
    }

    /// Run one round: every active task gets one step.
    pub fn heartbeat(&mut self) {
        self.task.step();
    }

    pub fn active_count(&self) -> usize {
        self.task.routine().active_count()
    }

    pub fn rounds(&self) -> usize {
        self.task.routine().rounds()
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }

    /// Heartbeat until no tasks remain, calling `between_rounds` after
    /// each round. Never returns if some task never finishes.
    pub fn run(&mut self, mut between_rounds: impl FnMut()) -> usize {
        let start = self.rounds();
        while !self.is_idle() {
            self.heartbeat();
            between_rounds();
        }
        self.rounds().wrapping_sub(start)
    }

    /// Like [`run`](Self::run) but gives up after `max_rounds`.
    /// Returns whether the scheduler went idle.
    pub fn run_for(&mut self, max_rounds: usize, mut between_rounds: impl FnMut()) -> bool {
        for _ in 0..max_rounds {
            if self.is_idle() {
                return true;
            }
            self.heartbeat();
            between_rounds();
        }
        self.is_idle()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Tick,
    }

    // Finishes on its `steps`-th step, appending its id to a shared log
    // every time it runs.
    struct Steps {
        id: u32,
        left: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Routine for Steps {
        type Marker = Mark;

        fn resume(&mut self, _at: Option<Mark>) -> Flow<Mark> {
            self.log.borrow_mut().push(self.id);
            self.left -= 1;
            if self.left == 0 {
                return Flow::Done;
            }
            yield_at!(Mark::Tick)
        }
    }

    fn steps(id: u32, n: u32, log: &Rc<RefCell<Vec<u32>>>) -> Steps {
        Steps {
            id,
            left: n,
            log: log.clone(),
        }
    }

    #[test]
    fn finite_tasks_drain_to_zero() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.fire(steps(1, 3, &log));
        sched.fire(steps(2, 5, &log));
        assert_eq!(sched.active_count(), 2);

        for _ in 0..5 {
            sched.heartbeat();
        }
        assert_eq!(sched.active_count(), 0);
        for _ in 0..3 {
            sched.heartbeat();
            assert_eq!(sched.active_count(), 0);
        }
        assert_eq!(*log.borrow(), [1, 2, 1, 2, 1, 2, 2, 2]);
    }

    #[test]
    fn polls_in_insertion_order_once_per_round() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        for id in 0..4 {
            sched.fire(steps(id, 2, &log));
        }
        sched.heartbeat();
        assert_eq!(*log.borrow(), [0, 1, 2, 3]);
        assert_eq!(sched.active_count(), 4);
        sched.heartbeat();
        assert_eq!(*log.borrow(), [0, 1, 2, 3, 0, 1, 2, 3]);
        assert!(sched.is_idle());
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Spawn {
        Done,
    }

    // Spawns a child the first time it runs, then finishes next step.
    struct Parent {
        spawner: Spawner,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Routine for Parent {
        type Marker = Spawn;

        fn resume(&mut self, at: Option<Spawn>) -> Flow<Spawn> {
            match at {
                None => {
                    self.log.borrow_mut().push(100);
                    self.spawner.fire(steps(7, 1, &self.log));
                    yield_at!(Spawn::Done)
                }
                Some(Spawn::Done) => Flow::Done,
            }
        }
    }

    #[test]
    fn spawn_during_round_runs_next_round() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let spawner = sched.spawner();
        sched.fire(Parent {
            spawner,
            log: log.clone(),
        });

        sched.heartbeat();
        assert_eq!(*log.borrow(), [100]);
        assert_eq!(sched.active_count(), 2);

        sched.heartbeat();
        assert_eq!(*log.borrow(), [100, 7]);
        assert!(sched.is_idle());
    }

    struct Dropped(Rc<Cell<bool>>);

    impl Drop for Dropped {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    struct OneShot {
        _guard: Dropped,
    }

    impl Routine for OneShot {
        type Marker = Mark;

        fn resume(&mut self, _at: Option<Mark>) -> Flow<Mark> {
            Flow::Done
        }
    }

    #[test]
    fn finished_task_is_released_when_retired() {
        let dropped = Rc::new(Cell::new(false));
        let mut sched = Scheduler::new();
        sched.add(task_ref(OneShot {
            _guard: Dropped(dropped.clone()),
        }));
        assert!(!dropped.get());
        sched.heartbeat();
        assert!(dropped.get());
    }

    #[test]
    fn external_handle_keeps_task_alive() {
        let dropped = Rc::new(Cell::new(false));
        let mut sched = Scheduler::new();
        let handle = sched.fire(OneShot {
            _guard: Dropped(dropped.clone()),
        });
        sched.heartbeat();
        assert!(sched.is_idle());
        assert!(!dropped.get());
        drop(handle);
        assert!(dropped.get());
    }

    #[test]
    fn busy_task_is_kept_for_next_round() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let handle = sched.fire(steps(1, 1, &log));
        {
            let _busy = handle.borrow_mut();
            sched.heartbeat();
        }
        assert_eq!(sched.active_count(), 1);
        assert!(log.borrow().is_empty());
        sched.heartbeat();
        assert!(sched.is_idle());
    }

    #[test]
    fn run_drives_until_idle() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.fire(steps(1, 4, &log));
        sched.fire(steps(2, 2, &log));
        let mut between = 0;
        let rounds = sched.run(|| between += 1);
        assert_eq!(rounds, 4);
        assert_eq!(between, 4);
        assert_eq!(sched.rounds(), 4);
    }

    #[test]
    fn run_for_gives_up_on_endless_tasks() {
        struct Forever;
        impl Routine for Forever {
            type Marker = Mark;
            fn resume(&mut self, _at: Option<Mark>) -> Flow<Mark> {
                yield_at!(Mark::Tick)
            }
        }

        let mut sched = Scheduler::new();
        sched.fire(Forever);
        assert!(!sched.run_for(50, || {}));
        assert_eq!(sched.active_count(), 1);
        assert_eq!(sched.rounds(), 50);
    }
}
