//! The classic UML statechart example (Samek's `s`/`s1`/`s11`/`s2`/`s21`/
//! `s211` test harness): one dispatch sequence exercising every transition
//! shape the engine supports — self-transition, sibling transition via the
//! LCA, transition to a strict ancestor of the active leaf, transition to a
//! strict descendant of the handler that answered `TRAN`, and a bubble-up
//! walk that is intercepted at different depths depending on which branch
//! is currently active.
//!
//! ```text
//! top
//!  `- s
//!      |- s1
//!      |   `- s11
//!      `- s2
//!          |- s21
//!              `- s211
//! ```
use hsm_bt::event::{Event, EVT_ENTRY, EVT_EXIT, EVT_INIT, EVT_USER_BASE};
use hsm_bt::hsm::{top, Hsm, HsmContext};
use hsm_bt::state::{StateHandle, StateResult};

const G: u16 = EVT_USER_BASE;
const I: u16 = EVT_USER_BASE + 1;
const A: u16 = EVT_USER_BASE + 2;
const D: u16 = EVT_USER_BASE + 3;
const C: u16 = EVT_USER_BASE + 4;
const E: u16 = EVT_USER_BASE + 5;

fn ev(id: u16) -> Event {
    Event::new(id, 0)
}

struct Ctx {
    hsm: Hsm<Ctx>,
    trace: String,
    /// `s2`'s conditional handling of `I` only fires once before falling
    /// through to `s` — this is the "foo" flag in Samek's original example.
    foo: bool,
}

impl Ctx {
    fn new() -> Self {
        Self {
            hsm: Hsm::new(StateHandle::new(bootstrap), Default::default()),
            trace: String::new(),
            foo: true,
        }
    }

    fn take_trace(&mut self) -> String {
        std::mem::take(&mut self.trace)
    }
}

impl HsmContext for Ctx {
    fn hsm(&mut self) -> &mut Hsm<Self> {
        &mut self.hsm
    }
    fn hsm_ref(&self) -> &Hsm<Self> {
        &self.hsm
    }
}

/// Invoked exactly once by `Hsm::init` to pick the real initial state; never
/// entered itself and never a real ancestor of anything (`s`'s own `EMPTY`
/// answers straight to the engine's top pseudostate).
fn bootstrap(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
    match event.id() {
        EVT_INIT => {
            ctx.trace.push_str("top-INIT;");
            StateResult::Tran(StateHandle::new(s2))
        }
        _ => StateResult::Super(StateHandle::new(top::<Ctx>)),
    }
}

fn s(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
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
            StateResult::Tran(StateHandle::new(s11))
        }
        id if id == E => {
            ctx.trace.push_str("s-E;");
            StateResult::Tran(StateHandle::new(s11))
        }
        id if id == I => {
            ctx.trace.push_str("s-I;");
            StateResult::Handled
        }
        _ => StateResult::Super(StateHandle::new(top::<Ctx>)),
    }
}

fn s1(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
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
        id if id == I => {
            ctx.trace.push_str("s1-I;");
            StateResult::Handled
        }
        id if id == A => {
            ctx.trace.push_str("s1-A;");
            StateResult::Tran(StateHandle::new(s1))
        }
        id if id == D => {
            ctx.trace.push_str("s1->D;");
            StateResult::Tran(StateHandle::new(s))
        }
        id if id == C => {
            ctx.trace.push_str("s1-C;");
            StateResult::Tran(StateHandle::new(s2))
        }
        _ => StateResult::Super(StateHandle::new(s)),
    }
}

fn s11(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s11-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s11-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Handled,
        id if id == D => {
            ctx.trace.push_str("s11-D;");
            StateResult::Tran(StateHandle::new(s1))
        }
        id if id == G => {
            ctx.trace.push_str("s11-G;");
            StateResult::Tran(StateHandle::new(s211))
        }
        _ => StateResult::Super(StateHandle::new(s1)),
    }
}

fn s2(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
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
            StateResult::Tran(StateHandle::new(s211))
        }
        id if id == I => {
            if ctx.foo {
                ctx.foo = false;
                ctx.trace.push_str("s2-I;");
                StateResult::Handled
            } else {
                StateResult::Super(StateHandle::new(s))
            }
        }
        _ => StateResult::Super(StateHandle::new(s)),
    }
}

fn s21(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s21-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s21-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Handled,
        id if id == G => {
            ctx.trace.push_str("s21-G;");
            StateResult::Tran(StateHandle::new(s1))
        }
        _ => StateResult::Super(StateHandle::new(s2)),
    }
}

fn s211(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("s211-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("s211-EXIT;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Handled,
        _ => StateResult::Super(StateHandle::new(s21)),
    }
}

#[test]
fn full_dispatch_sequence_matches_the_reference_trace() {
    let mut ctx = Ctx::new();

    Hsm::init(&mut ctx, None);
    assert_eq!(ctx.take_trace(), "top-INIT;s-ENTRY;s2-ENTRY;s2-INIT;s21-ENTRY;s211-ENTRY;");

    Hsm::dispatch(&mut ctx, ev(G));
    assert_eq!(
        ctx.take_trace(),
        "s21-G;s211-EXIT;s21-EXIT;s2-EXIT;s1-ENTRY;s1-INIT;s11-ENTRY;"
    );

    Hsm::dispatch(&mut ctx, ev(I));
    assert_eq!(ctx.take_trace(), "s1-I;");

    Hsm::dispatch(&mut ctx, ev(A));
    assert_eq!(
        ctx.take_trace(),
        "s1-A;s11-EXIT;s1-EXIT;s1-ENTRY;s1-INIT;s11-ENTRY;"
    );

    Hsm::dispatch(&mut ctx, ev(D));
    assert_eq!(ctx.take_trace(), "s1->D;s11-EXIT;s1-EXIT;s-INIT;s1-ENTRY;s11-ENTRY;");

    Hsm::dispatch(&mut ctx, ev(D));
    assert_eq!(ctx.take_trace(), "s11-D;s11-EXIT;s1-INIT;s11-ENTRY;");

    Hsm::dispatch(&mut ctx, ev(C));
    assert_eq!(
        ctx.take_trace(),
        "s1-C;s11-EXIT;s1-EXIT;s2-ENTRY;s2-INIT;s21-ENTRY;s211-ENTRY;"
    );

    Hsm::dispatch(&mut ctx, ev(E));
    assert_eq!(
        ctx.take_trace(),
        "s-E;s211-EXIT;s21-EXIT;s2-EXIT;s1-ENTRY;s11-ENTRY;"
    );

    Hsm::dispatch(&mut ctx, ev(E));
    assert_eq!(ctx.take_trace(), "s-E;s11-EXIT;s1-EXIT;s1-ENTRY;s11-ENTRY;");

    Hsm::dispatch(&mut ctx, ev(G));
    assert_eq!(
        ctx.take_trace(),
        "s11-G;s11-EXIT;s1-EXIT;s2-ENTRY;s21-ENTRY;s211-ENTRY;"
    );

    Hsm::dispatch(&mut ctx, ev(I));
    assert_eq!(ctx.take_trace(), "s2-I;");

    Hsm::dispatch(&mut ctx, ev(I));
    assert_eq!(ctx.take_trace(), "s-I;");

    assert!(Hsm::is_in(&mut ctx, StateHandle::new(s211)));

    Hsm::dtor(&mut ctx);
    assert_eq!(ctx.take_trace(), "s211-EXIT;s21-EXIT;s2-EXIT;s-EXIT;");
}
