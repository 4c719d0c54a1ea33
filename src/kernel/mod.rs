// Cooperative coroutine kernel
// Single thread, no preemption. A task gives up control only at an
// await, yield, sleep or nested-task point; the caller's loop decides
// when it runs again. Nothing here blocks the calling thread.

pub mod clock;
pub mod scheduler;
pub mod semaphore;
pub mod task;
pub mod timer;

#[cfg(feature = "embassy")]
pub use clock::EmbassyClock;
#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::{Clock, ManualClock, Ticks, UptimeClock};
pub use scheduler::{Pollable, Scheduler, Spawner, TaskList, TaskRef, task_ref};
pub use semaphore::Semaphore;
pub use task::{Awaitable, Coroutine, Flow, Routine, Status};
pub use timer::Timer;
