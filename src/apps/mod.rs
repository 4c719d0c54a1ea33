// Demo routines built on the kernel.
//
// codelock:  timed key-sequence lock plus a scripted keypad user
// pingpong:  two tasks passing a turn back and forth through flags
// countdown: sleeping tasks fired into the dynamic scheduler

pub mod codelock;
pub mod countdown;
pub mod pingpong;
