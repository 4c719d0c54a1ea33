// Two tasks taking turns through a pair of flags
//
// Ping waits for its turn, counts a run, and hands the turn to Pong;
// Pong does the same in the other direction. Pong holds the turn at
// start, so the very first pass only runs Pong.

use alloc::rc::Rc;
use core::cell::Cell;

use log::info;

use crate::await_at;
use crate::kernel::{Coroutine, Flow, Routine};

#[derive(Debug)]
pub struct Baton {
    ping_turn: Cell<bool>,
    pong_turn: Cell<bool>,
}

impl Baton {
    pub const fn new() -> Self {
        Self {
            ping_turn: Cell::new(false),
            pong_turn: Cell::new(true),
        }
    }

    pub fn is_ping_turn(&self) -> bool {
        self.ping_turn.get()
    }

    pub fn is_pong_turn(&self) -> bool {
        self.pong_turn.get()
    }

    fn hand_to_pong(&self) {
        self.ping_turn.set(false);
        self.pong_turn.set(true);
    }

    fn hand_to_ping(&self) {
        self.pong_turn.set(false);
        self.ping_turn.set(true);
    }
}

impl Default for Baton {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Waiting,
}

pub struct Ping {
    baton: Rc<Baton>,
    runs: u32,
}

impl Ping {
    pub fn new(baton: Rc<Baton>) -> Self {
        Self { baton, runs: 0 }
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }
}

impl Routine for Ping {
    type Marker = Turn;

    fn resume(&mut self, _at: Option<Turn>) -> Flow<Turn> {
        await_at!(Turn::Waiting, self.baton.is_ping_turn());
        self.runs += 1;
        info!("ping run # {}", self.runs);
        self.baton.hand_to_pong();
        Flow::Jump(Turn::Waiting)
    }
}

pub struct Pong {
    baton: Rc<Baton>,
    runs: u32,
}

impl Pong {
    pub fn new(baton: Rc<Baton>) -> Self {
        Self { baton, runs: 0 }
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }
}

impl Routine for Pong {
    type Marker = Turn;

    fn resume(&mut self, _at: Option<Turn>) -> Flow<Turn> {
        await_at!(Turn::Waiting, self.baton.is_pong_turn());
        self.runs += 1;
        info!("pong running");
        self.baton.hand_to_ping();
        Flow::Jump(Turn::Waiting)
    }
}

/// Step Ping then Pong `passes` times; returns (ping runs, pong runs).
pub fn run_pingpong(passes: u32) -> (u32, u32) {
    let baton = Rc::new(Baton::new());
    let mut ping = Coroutine::new(Ping::new(baton.clone()));
    let mut pong = Coroutine::new(Pong::new(baton));

    for _ in 0..passes {
        ping.step();
        pong.step();
    }
    (ping.routine().runs(), pong.routine().runs())
}
