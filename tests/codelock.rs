use std::rc::Rc;

use pulp_coro::apps::codelock::{CODE, CodeLock, run_codelock};
use pulp_coro::drivers::keypad::Keypad;
use pulp_coro::kernel::{Coroutine, ManualClock};

struct Bench {
    clock: ManualClock,
    keypad: Rc<Keypad>,
    lock: Coroutine<CodeLock<ManualClock>>,
}

impl Bench {
    fn new() -> Self {
        let clock = ManualClock::new();
        let keypad = Rc::new(Keypad::new());
        let mut lock = Coroutine::new(CodeLock::new(keypad.clone(), clock.clone()));
        assert!(!lock.step());
        Self {
            clock,
            keypad,
            lock,
        }
    }

    /// Wait `gap_ms`, press `key`, let the lock look at it.
    fn press(&mut self, gap_ms: u64, key: char) -> bool {
        self.clock.advance(gap_ms);
        self.keypad.press(key);
        self.lock.step()
    }

    fn idle(&mut self, ms: u64) -> bool {
        self.clock.advance(ms);
        self.lock.step()
    }

    fn keys(&self) -> usize {
        self.lock.routine().keys_entered()
    }

    fn enter_code(&mut self, gap_ms: u64) {
        for key in CODE {
            assert!(!self.press(gap_ms, key));
        }
    }
}

#[test]
fn correct_code_then_quiet_period_unlocks() {
    let mut bench = Bench::new();
    bench.enter_code(999);
    assert_eq!(bench.keys(), 4);

    assert!(!bench.idle(499));
    assert!(bench.idle(1));
    assert!(bench.lock.is_done());
}

#[test]
fn wrong_key_at_any_position_starts_over() {
    for pos in 0..CODE.len() {
        let mut bench = Bench::new();
        for &key in &CODE[..pos] {
            assert!(!bench.press(100, key));
        }
        assert_eq!(bench.keys(), pos);

        assert!(!bench.press(100, '9'));
        assert_eq!(bench.keys(), 0, "wrong key at {pos} kept counting");

        // Counting really did restart: a full code from here works.
        bench.enter_code(100);
        assert!(bench.idle(500));
    }
}

#[test]
fn slow_key_starts_over() {
    let mut bench = Bench::new();
    assert!(!bench.press(0, '1'));
    assert!(!bench.press(400, '4'));
    assert_eq!(bench.keys(), 2);

    // Arrives exactly at the window edge: too late, and swallowed.
    assert!(!bench.press(1000, '2'));
    assert_eq!(bench.keys(), 0);

    assert!(!bench.press(50, '3'));
    assert_eq!(bench.keys(), 0);
}

#[test]
fn window_expiry_without_key_starts_over() {
    let mut bench = Bench::new();
    assert!(!bench.press(0, '1'));
    assert!(!bench.idle(1000));
    assert_eq!(bench.keys(), 0);

    bench.enter_code(10);
    assert!(bench.idle(500));
}

#[test]
fn key_during_quiet_period_locks_again() {
    let mut bench = Bench::new();
    bench.enter_code(200);
    assert!(!bench.press(300, '1'));
    assert_eq!(bench.keys(), 0);
    assert!(!bench.idle(1000));
    assert!(!bench.lock.is_done());

    bench.enter_code(200);
    assert!(bench.idle(500));
}

#[test]
fn default_script_opens_the_lock() {
    let clock = ManualClock::new();
    let sim = clock.clone();
    let steps = run_codelock(clock, || sim.advance(10));

    // The clean entry ends with '3' at 9100ms, seen one tick later.
    assert_eq!(sim.now(), 9_610);
    assert_eq!(steps, 961);
}
