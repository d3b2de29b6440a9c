//! The three outcome-translating decorators. Each wraps a single leaf child
//! and posts its own (possibly translated) completion to its own superstate
//! through the registered `Post` sink, never synchronously — so even the
//! case where the forced outcome already matches the child's is posted, not
//! answered with a direct `Super`.
//!
//! ```text
//! top
//!  `- s1
//!      `- <decorator>(instance 0)
//!          `- s11
//! ```
//! One small topology per decorator, mirroring how this crate's ancestor
//! dedicates a whole test file's worth of static states to a single node
//! under test.

use std::rc::Rc;

use hsm_bt::bt::nodes::BtContext;
use hsm_bt::bt::registry::{BtNodeKind, BtRegistry};
use hsm_bt::event::{Event, EVT_BT_FAILURE, EVT_BT_SUCCESS, EVT_INIT};
use hsm_bt::hsm::{top, Hsm, HsmContext};
use hsm_bt::logger::HsmLogger;
use hsm_bt::post::QueuePost;
use hsm_bt::state::{StateHandle, StateResult};

macro_rules! decorator_fixture {
    ($module:ident, $kind:expr, $node_fn:path, $add_fn:ident) => {
        mod $module {
            use super::*;

            pub struct Ctx {
                hsm: Hsm<Ctx>,
                registry: BtRegistry<Ctx>,
                pub trace: String,
            }

            impl Ctx {
                pub fn new() -> Self {
                    let mut registry = BtRegistry::new();
                    registry.add_cfg(Rc::new(QueuePost));
                    registry.register_superstate($kind, 0, StateHandle::new(s1));
                    registry.$add_fn(0, StateHandle::new(s11));
                    let mut ctx = Self {
                        hsm: Hsm::new(StateHandle::new(sinit), HsmLogger::default()),
                        registry,
                        trace: String::new(),
                    };
                    Hsm::init(&mut ctx, None);
                    ctx.take_trace();
                    ctx
                }

                pub fn take_trace(&mut self) -> String {
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

            impl BtContext for Ctx {
                fn bt_registry(&self) -> &BtRegistry<Self> {
                    &self.registry
                }
                fn bt_registry_mut(&mut self) -> &mut BtRegistry<Self> {
                    &mut self.registry
                }
            }

            fn sinit(_ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
                match event.id() {
                    EVT_INIT => StateResult::Tran(StateHandle::new(s1)),
                    _ => StateResult::Super(StateHandle::new(top::<Ctx>)),
                }
            }

            fn s1(ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
                match event.id() {
                    EVT_INIT => StateResult::Tran(StateHandle::with_instance($node_fn, 0)),
                    EVT_BT_SUCCESS => {
                        ctx.trace.push_str("s1-BT_SUCCESS;");
                        StateResult::Handled
                    }
                    EVT_BT_FAILURE => {
                        ctx.trace.push_str("s1-BT_FAILURE;");
                        StateResult::Handled
                    }
                    _ => StateResult::Super(StateHandle::new(sinit)),
                }
            }

            fn s11(_ctx: &mut Ctx, event: &Event) -> StateResult<Ctx> {
                match event.id() {
                    EVT_INIT => StateResult::Handled,
                    _ => StateResult::Super(StateHandle::with_instance($node_fn, 0)),
                }
            }
        }
    };
}

decorator_fixture!(invert_fixture, BtNodeKind::Invert, hsm_bt::bt::nodes::invert, add_invert);
decorator_fixture!(
    force_success_fixture,
    BtNodeKind::ForceSuccess,
    hsm_bt::bt::nodes::force_success,
    add_force_success
);
decorator_fixture!(
    force_failure_fixture,
    BtNodeKind::ForceFailure,
    hsm_bt::bt::nodes::force_failure,
    add_force_failure
);

#[test]
fn invert_turns_success_into_failure() {
    let mut ctx = invert_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_SUCCESS));
    assert_eq!(ctx.take_trace(), "s1-BT_FAILURE;");
}

#[test]
fn invert_turns_failure_into_success() {
    let mut ctx = invert_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_FAILURE));
    assert_eq!(ctx.take_trace(), "s1-BT_SUCCESS;");
}

#[test]
fn force_success_turns_failure_into_success() {
    let mut ctx = force_success_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_FAILURE));
    assert_eq!(ctx.take_trace(), "s1-BT_SUCCESS;");
}

#[test]
fn force_success_leaves_success_unchanged() {
    let mut ctx = force_success_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_SUCCESS));
    assert_eq!(ctx.take_trace(), "s1-BT_SUCCESS;");
}

#[test]
fn force_failure_turns_success_into_failure() {
    let mut ctx = force_failure_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_SUCCESS));
    assert_eq!(ctx.take_trace(), "s1-BT_FAILURE;");
}

#[test]
fn force_failure_leaves_failure_unchanged() {
    let mut ctx = force_failure_fixture::Ctx::new();
    Hsm::dispatch(&mut ctx, Event::reserved(EVT_BT_FAILURE));
    assert_eq!(ctx.take_trace(), "s1-BT_FAILURE;");
}
