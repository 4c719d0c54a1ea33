// Counting gate for cooperative tasks
//
// Never blocks: an acquire either takes one unit or reports WouldBlock
// and leaves the count alone. reset() overwrites the count, it is not a
// delta, and is meant for re-arming a gate that allows n more passages.

use core::convert::Infallible;

use super::task::Awaitable;

#[derive(Debug, Default)]
pub struct Semaphore {
    count: u32,
}

impl Semaphore {
    pub const fn new(count: u32) -> Self {
        Self { count }
    }

    pub fn signal(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self, count: u32) {
        self.count = count;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Take one unit if any is available.
    pub fn try_acquire(&mut self) -> nb::Result<(), Infallible> {
        if self.count == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.count -= 1;
        Ok(())
    }
}

impl Awaitable for Semaphore {
    #[inline]
    fn is_incomplete(&mut self) -> bool {
        self.try_acquire().is_err()
    }
}
