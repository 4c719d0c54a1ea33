// Digit code lock
//
// Waits for the code on a keypad with at most KEY_WINDOW_MS between
// keys. After the last correct key the lock stays shut for a further
// UNLOCK_QUIET_MS; any key in that window means the code was a fluke and
// counting starts over. A wrong key or a slow key also starts over.
//
// KeyScript plays the part of a person at the keypad: a fixed table of
// (delay, key) pairs, each delay measured from the previous press.

use alloc::rc::Rc;

use log::info;

use crate::drivers::keypad::Keypad;
use crate::kernel::{Clock, Coroutine, Flow, Routine, Timer};
use crate::{await_at, sleep_at, task_stop};

pub const CODE: [char; 4] = ['1', '4', '2', '3'];

/// Longest allowed gap between two keys of the code.
pub const KEY_WINDOW_MS: u32 = 1000;

/// Quiet period after the last key before the lock opens.
pub const UNLOCK_QUIET_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    FirstKey,
    NextKey,
    Quiet,
}

pub struct CodeLock<C: Clock> {
    keypad: Rc<Keypad>,
    timer: Timer<C>,
    // correct keys so far
    keys: usize,
}

impl<C: Clock> CodeLock<C> {
    pub fn new(keypad: Rc<Keypad>, clock: C) -> Self {
        Self {
            keypad,
            timer: Timer::new(clock),
            keys: 0,
        }
    }

    pub fn keys_entered(&self) -> usize {
        self.keys
    }

    fn start_over(&mut self) -> Flow<Lock> {
        self.keys = 0;
        Flow::Jump(Lock::FirstKey)
    }

    fn check_key(&mut self) -> Flow<Lock> {
        let key = self.keypad.last_key().unwrap_or('\0');
        if key != CODE[self.keys] {
            info!("Incorrect key '{}' found", key);
            return self.start_over();
        }
        info!("Correct key '{}' found", key);
        self.keys += 1;

        if self.keys == CODE.len() {
            info!(
                "Correct code entered, waiting for {} ms before unlocking.",
                UNLOCK_QUIET_MS
            );
            self.timer.start(UNLOCK_QUIET_MS);
            return Flow::Jump(Lock::Quiet);
        }

        self.timer.start(KEY_WINDOW_MS);
        Flow::Jump(Lock::NextKey)
    }
}

impl<C: Clock> Routine for CodeLock<C> {
    type Marker = Lock;

    fn resume(&mut self, at: Option<Lock>) -> Flow<Lock> {
        match at {
            None => self.start_over(),
            Some(Lock::FirstKey) => {
                await_at!(Lock::FirstKey, self.keypad.take_press());
                self.check_key()
            }
            Some(Lock::NextKey) => {
                await_at!(
                    Lock::NextKey,
                    self.keypad.take_press() || self.timer.is_expired()
                );
                if self.timer.is_expired() {
                    info!("Code lock timer expired.");
                    return self.start_over();
                }
                self.check_key()
            }
            Some(Lock::Quiet) => {
                await_at!(
                    Lock::Quiet,
                    self.keypad.take_press() || self.timer.is_expired()
                );
                if !self.timer.is_expired() {
                    info!("Key pressed during final wait, code lock locked again.");
                    return self.start_over();
                }
                info!("Code lock unlocked.");
                task_stop!()
            }
        }
    }
}

/// The keypad session the demo plays: a few wrong and slow attempts,
/// a correct code spoiled by a key in the quiet window, then a clean
/// entry.
pub const DEFAULT_SCRIPT: &[(u32, char)] = &[
    (1000, '1'),
    (100, '2'),
    (100, '3'),
    (2000, '1'),
    (200, '4'),
    (200, '2'),
    (2000, '3'),
    (200, '1'),
    (200, '4'),
    (200, '2'),
    (100, '3'),
    (100, '4'),
    (1500, '1'),
    (300, '4'),
    (400, '2'),
    (500, '3'),
];

/// Idle time after the last scripted key before the script ends.
pub const SCRIPT_TAIL_MS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Waiting,
    Tail,
}

pub struct KeyScript<C: Clock> {
    keypad: Rc<Keypad>,
    timer: Timer<C>,
    script: &'static [(u32, char)],
    tail_ms: u32,
    next: usize,
}

impl<C: Clock> KeyScript<C> {
    pub fn new(
        keypad: Rc<Keypad>,
        clock: C,
        script: &'static [(u32, char)],
        tail_ms: u32,
    ) -> Self {
        Self {
            keypad,
            timer: Timer::new(clock),
            script,
            tail_ms,
            next: 0,
        }
    }

    /// Keys pressed so far.
    pub fn pressed(&self) -> usize {
        self.next
    }

    fn arm_next(&mut self) -> Flow<Script> {
        match self.script.get(self.next) {
            Some(&(delay_ms, _)) => sleep_at!(Script::Waiting, self.timer, delay_ms),
            None => sleep_at!(Script::Tail, self.timer, self.tail_ms),
        }
    }
}

impl<C: Clock> Routine for KeyScript<C> {
    type Marker = Script;

    fn resume(&mut self, at: Option<Script>) -> Flow<Script> {
        match at {
            None => {
                let first_ms = self.script.first().map_or(0, |&(ms, _)| ms);
                info!("Waiting {} ms before entering first key.", first_ms);
                self.next = 0;
                self.arm_next()
            }
            Some(Script::Waiting) => {
                await_at!(Script::Waiting, self.timer);
                if let Some(&(_, key)) = self.script.get(self.next) {
                    self.keypad.press(key);
                }
                self.next += 1;
                self.arm_next()
            }
            Some(Script::Tail) => {
                await_at!(Script::Tail, self.timer);
                Flow::Done
            }
        }
    }
}

/// Run the lock against the default script until it opens.
///
/// `between_steps` runs after every pass over both tasks; hosted builds
/// sleep there, simulations advance their clock.
pub fn run_codelock<C: Clock + Clone>(clock: C, mut between_steps: impl FnMut()) -> usize {
    let keypad = Rc::new(Keypad::new());
    let mut lock = Coroutine::new(CodeLock::new(keypad.clone(), clock.clone()));
    let mut input = Coroutine::new(KeyScript::new(
        keypad,
        clock,
        DEFAULT_SCRIPT,
        SCRIPT_TAIL_MS,
    ));

    let mut steps = 0;
    while !lock.step() {
        input.step();
        between_steps();
        steps += 1;
    }
    steps
}
