//! A small, self-contained topology reused by this crate's own unit tests:
//!
//! ```text
//! top
//!  `- s
//!      |- s1
//!      |   `- s11
//!      `- s2
//!          `- s21
//!              `- s211
//! ```
//!
//! `s`'s default child is `s1`/`s11`; dispatching `ev_toggle()` moves the
//! active branch from `s1` to `s2` (and back); `ev_self()` is handled by
//! `s21` as a transition to itself, exercising the ancestor-of-the-leaf
//! transition case.
#![cfg(test)]

use crate::event::{Event, EVT_EMPTY, EVT_ENTRY, EVT_EXIT, EVT_INIT, EVT_USER_BASE};
use crate::hsm::{top, Hsm, HsmContext};
use crate::state::{StateHandle, StateResult};

pub struct Fixture {
    hsm: Hsm<Fixture>,
    trace: String,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            hsm: Hsm::new(StateHandle::new(root), Default::default()),
            trace: String::new(),
        }
    }

    pub fn take_trace(&mut self) -> String {
        std::mem::take(&mut self.trace)
    }
}

impl HsmContext for Fixture {
    fn hsm(&mut self) -> &mut Hsm<Self> {
        &mut self.hsm
    }
    fn hsm_ref(&self) -> &Hsm<Self> {
        &self.hsm
    }
}

pub fn ev_toggle() -> Event {
    Event::new(EVT_USER_BASE, 0)
}

pub fn ev_self() -> Event {
    Event::new(EVT_USER_BASE + 1, 0)
}

pub fn root(_ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_INIT => StateResult::Tran(StateHandle::new(s)),
        EVT_EMPTY => StateResult::Super(StateHandle::new(top::<Fixture>)),
        _ => StateResult::Super(StateHandle::new(top::<Fixture>)),
    }
}

pub fn s(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s-INIT;");
            StateResult::Tran(StateHandle::new(s1))
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(top::<Fixture>)),
        _ => StateResult::Super(StateHandle::new(top::<Fixture>)),
    }
}

pub fn s1(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s1-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s1-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s1-INIT;");
            StateResult::Tran(StateHandle::new(s11))
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(s)),
        id if id == EVT_USER_BASE => StateResult::Tran(StateHandle::new(s2)),
        _ => StateResult::Super(StateHandle::new(s)),
    }
}

pub fn s11(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s11-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s11-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s11-INIT;");
            StateResult::Handled
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(s1)),
        _ => StateResult::Super(StateHandle::new(s1)),
    }
}

pub fn s2(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s2-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s2-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s2-INIT;");
            StateResult::Tran(StateHandle::new(s21))
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(s)),
        id if id == EVT_USER_BASE => StateResult::Tran(StateHandle::new(s1)),
        _ => StateResult::Super(StateHandle::new(s)),
    }
}

pub fn s21(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s21-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s21-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s21-INIT;");
            StateResult::Tran(StateHandle::new(s211))
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(s2)),
        id if id == EVT_USER_BASE + 1 => StateResult::Tran(StateHandle::new(s21)),
        _ => StateResult::Super(StateHandle::new(s2)),
    }
}

pub fn s211(ctx: &mut Fixture, event: &Event) -> StateResult<Fixture> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s211-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s211-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => {
            ctx.trace.push_str("s211-INIT;");
            StateResult::Handled
        }
        EVT_EMPTY => StateResult::Super(StateHandle::new(s21)),
        _ => StateResult::Super(StateHandle::new(s21)),
    }
}
