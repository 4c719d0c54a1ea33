// Key-press latch
//
// Holds the most recent key and a "pressed" flag that is consumed by
// whoever checks it. One reader, any number of writers; a second press
// before the reader looks simply replaces the first.
//
// Shared between tasks behind an `Rc`: everything runs on one thread,
// so `Cell` is all the synchronisation needed.

use core::cell::Cell;

use log::info;

#[derive(Debug, Default)]
pub struct Keypad {
    key: Cell<Option<char>>,
    pressed: Cell<bool>,
}

impl Keypad {
    pub const fn new() -> Self {
        Self {
            key: Cell::new(None),
            pressed: Cell::new(false),
        }
    }

    pub fn press(&self, key: char) {
        info!("--- Key '{}' pressed", key);
        self.key.set(Some(key));
        self.pressed.set(true);
    }

    /// True once per press; clears the flag.
    pub fn take_press(&self) -> bool {
        self.pressed.replace(false)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    /// Latest key, still readable after the press has been taken.
    pub fn last_key(&self) -> Option<char> {
        self.key.get()
    }
}
