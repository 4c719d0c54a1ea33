// Input sources shared between tasks.

pub mod keypad;
