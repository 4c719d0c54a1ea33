// Stackless coroutines
//
// A routine is an ordinary struct whose fields are its persistent
// locals, plus a body written as a `match` over the point it should
// re-enter at. Each suspension point is a variant of the routine's own
// `Marker` enum; `None` means "top of the body". Because markers are a
// separate type, the `Init` and `Done` states can never collide with a
// resume position.

use core::fmt;

use log::{debug, trace};

/// Control state of a coroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status<M> {
    Init,
    At(M),
    Done,
}

impl<M> Status<M> {
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

/// What one body segment asks for when it stops running.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<M> {
    /// Give control back; the next step re-enters at this marker.
    Suspend(M),
    /// Keep going at this marker within the same step.
    Jump(M),
    /// Explicit stop or end of body.
    Done,
}

/// A coroutine body. `None` is the top of the body, `Some(m)` the arm
/// for resume point `m`.
///
/// ```
/// use pulp_coro::kernel::{Coroutine, Flow, Routine};
/// use pulp_coro::{await_at, yield_at};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Mark {
///     Ready,
///     Again,
/// }
///
/// struct Blink {
///     ready: bool,
///     blinks: u32,
/// }
///
/// impl Routine for Blink {
///     type Marker = Mark;
///
///     fn resume(&mut self, at: Option<Mark>) -> Flow<Mark> {
///         match at {
///             None | Some(Mark::Ready) => {
///                 await_at!(Mark::Ready, self.ready);
///                 self.blinks += 1;
///                 yield_at!(Mark::Again)
///             }
///             Some(Mark::Again) => {
///                 self.blinks += 1;
///                 Flow::Done
///             }
///         }
///     }
/// }
///
/// let mut blink = Coroutine::new(Blink { ready: false, blinks: 0 });
/// assert!(!blink.step());
/// blink.routine_mut().ready = true;
/// assert!(!blink.step());
/// assert!(blink.step());
/// assert_eq!(blink.routine().blinks, 2);
/// ```
pub trait Routine {
    type Marker: Copy + Eq + fmt::Debug;

    /// Run from `at` (`None` = top of body) until the next suspension
    /// point. Not called again once the routine has returned `Done`.
    fn resume(&mut self, at: Option<Self::Marker>) -> Flow<Self::Marker>;
}

/// Anything that can gate an await point.
pub trait Awaitable {
    /// Checked every time the awaiting task runs; may have side effects
    /// (a semaphore takes its unit, a nested task advances one step).
    fn is_incomplete(&mut self) -> bool;
}

impl Awaitable for bool {
    #[inline]
    fn is_incomplete(&mut self) -> bool {
        !*self
    }
}

impl<A: Awaitable + ?Sized> Awaitable for &mut A {
    #[inline]
    fn is_incomplete(&mut self) -> bool {
        (**self).is_incomplete()
    }
}

/// A routine plus its resume position.
///
/// Not `Clone`: an in-flight resume position belongs to
/// exactly one instance.
pub struct Coroutine<R: Routine> {
    status: Status<R::Marker>,
    routine: R,
}

impl<R: Routine> Coroutine<R> {
    pub const fn new(routine: R) -> Self {
        Self {
            status: Status::Init,
            routine,
        }
    }

    /// Rewind to the top of the body. Persistent fields are untouched.
    pub fn restart(&mut self) {
        self.status = Status::Init;
    }

    /// Restart and run the routine's setup on its fields.
    pub fn launch(&mut self, setup: impl FnOnce(&mut R)) {
        self.restart();
        setup(&mut self.routine);
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    pub fn status(&self) -> Status<R::Marker> {
        self.status
    }

    pub fn routine(&self) -> &R {
        &self.routine
    }

    pub fn routine_mut(&mut self) -> &mut R {
        &mut self.routine
    }

    /// Advance by one step. Returns `true` once the coroutine is done;
    /// stepping a finished coroutine runs nothing and stays done.
    pub fn step(&mut self) -> bool {
        let mut at = match self.status {
            Status::Done => return true,
            Status::Init => None,
            Status::At(marker) => Some(marker),
        };

        loop {
            match self.routine.resume(at) {
                Flow::Suspend(marker) => {
                    trace!("task: suspended at {:?}", marker);
                    self.status = Status::At(marker);
                    return false;
                }
                Flow::Jump(marker) => at = Some(marker),
                Flow::Done => {
                    debug!("task: done");
                    self.status = Status::Done;
                    return true;
                }
            }
        }
    }
}

impl<R: Routine> Awaitable for Coroutine<R> {
    #[inline]
    fn is_incomplete(&mut self) -> bool {
        !self.step()
    }
}

impl<R: Routine + fmt::Debug> fmt::Debug for Coroutine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("status", &self.status)
            .field("routine", &self.routine)
            .finish()
    }
}

/// Suspend at `$marker` while `$awaitable` is incomplete, otherwise fall
/// through. The match arm for `$marker` must start with this same await
/// so a resumed task re-checks it.
#[macro_export]
macro_rules! await_at {
    ($marker:expr, $awaitable:expr) => {
        if $crate::kernel::task::Awaitable::is_incomplete(&mut $awaitable) {
            return $crate::kernel::task::Flow::Suspend($marker);
        }
    };
}

/// Unconditionally suspend; the next step resumes in the arm for `$marker`.
#[macro_export]
macro_rules! yield_at {
    ($marker:expr) => {
        return $crate::kernel::task::Flow::Suspend($marker)
    };
}

/// Arm `$timer` for `$ms` and continue into the arm for `$marker`, which
/// must begin with `await_at!($marker, $timer)`.
#[macro_export]
macro_rules! sleep_at {
    ($marker:expr, $timer:expr, $ms:expr) => {{
        $timer.start($ms);
        return $crate::kernel::task::Flow::Jump($marker);
    }};
}

/// Restart a nested coroutine with `$setup` and continue into the arm for
/// `$marker`, which must begin with `await_at!($marker, $task)`.
#[macro_export]
macro_rules! run_task {
    ($marker:expr, $task:expr, $setup:expr) => {{
        $task.launch($setup);
        return $crate::kernel::task::Flow::Jump($marker);
    }};
}

/// Stop the routine immediately.
#[macro_export]
macro_rules! task_stop {
    () => {
        return $crate::kernel::task::Flow::Done
    };
}
