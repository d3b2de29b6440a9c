//! Oven controller: `{open, closed ⊃ {on, off}}`, plus a pre-heat behavior
//! tree nested inside `on`.
//!
//! `closed` has no fixed default child — its `INIT` handler transitions
//! back into whichever of `on`/`off` last recorded itself in
//! [`OvenCtx::history`] on `ENTRY`. Entering `closed` fresh re-enters
//! whatever was last active, not always `off`.
//!
//! ```text
//! top
//!  `- oven_root
//!      |- open
//!      `- closed
//!          |- on
//!          |   `- Sequence(instance 0)      (pre-heat)
//!          |       |- Delay(instance 0)
//!          |       |   `- preheat_wait
//!          |       `- preheat_ready
//!          `- off
//! ```
use std::rc::Rc;

use hsm_bt::bt::nodes::{delay, sequence, BtContext, BtTimerContext};
use hsm_bt::bt::registry::{BtNodeKind, BtRegistry};
use hsm_bt::event::{Event, EVT_ENTRY, EVT_EXIT, EVT_INIT};
use hsm_bt::hsm::{top, Hsm, HsmContext};
use hsm_bt::logger::HsmLogger;
use hsm_bt::post::QueuePost;
use hsm_bt::state::{StateHandle, StateResult};
use hsm_bt::timer::TimerService;

use crate::oven::oven_events::OvenEvent;
use crate::oven::oven_timer::ActorTimer;

/// How long the simulated heating element takes to report itself hot,
/// expressed in the actor's own tick unit (see `oven_controller.rs`).
pub const PREHEAT_DELAY_TICKS: u32 = 2;
const PREHEAT_DOMAIN: u8 = 0;

pub struct OvenCtx {
    hsm: Hsm<OvenCtx>,
    registry: BtRegistry<OvenCtx>,
    timer: ActorTimer,
    /// Last of `on`/`off` to record itself on `ENTRY`; `closed`'s `INIT`
    /// re-enters it.
    history: StateHandle<OvenCtx>,
    pub preheated: bool,
    pub trace: String,
}

impl OvenCtx {
    pub fn new(timer: ActorTimer) -> Self {
        let mut registry = BtRegistry::new();
        registry.add_cfg(Rc::new(QueuePost));
        registry.register_superstate(BtNodeKind::Sequence, 0, StateHandle::new(on));
        registry.add_sequence(
            0,
            vec![StateHandle::with_instance(delay, 0), StateHandle::new(preheat_ready)],
        );
        registry.register_superstate(BtNodeKind::Delay, 0, StateHandle::with_instance(sequence, 0));
        registry.add_delay(0, PREHEAT_DELAY_TICKS, PREHEAT_DOMAIN, StateHandle::new(preheat_wait));

        Self {
            hsm: Hsm::new(StateHandle::new(oven_root), HsmLogger::default()),
            registry,
            timer,
            history: StateHandle::new(off),
            preheated: false,
            trace: String::new(),
        }
    }

    pub fn dispatch_user(&mut self, event: OvenEvent) {
        Hsm::dispatch(self, event.into_event());
    }

    pub fn next_timer_deadline(&self) -> Option<tokio::time::Instant> {
        self.timer.next_deadline()
    }

    /// Dispatch every timer event whose deadline has passed as of `now`.
    pub fn fire_due_timers(&mut self, now: tokio::time::Instant) {
        let due = self.timer.take_due(now);
        for event in due {
            Hsm::dispatch(self, event);
        }
    }

    pub fn take_trace(&mut self) -> String {
        std::mem::take(&mut self.trace)
    }

    pub fn is_on(&mut self) -> bool {
        Hsm::is_in(self, StateHandle::new(on))
    }

    pub fn is_off(&mut self) -> bool {
        Hsm::is_in(self, StateHandle::new(off))
    }
}

impl HsmContext for OvenCtx {
    fn hsm(&mut self) -> &mut Hsm<Self> {
        &mut self.hsm
    }
    fn hsm_ref(&self) -> &Hsm<Self> {
        &self.hsm
    }
}

impl BtContext for OvenCtx {
    fn bt_registry(&self) -> &BtRegistry<Self> {
        &self.registry
    }
    fn bt_registry_mut(&mut self) -> &mut BtRegistry<Self> {
        &mut self.registry
    }
}

impl BtTimerContext for OvenCtx {
    fn timer(&mut self) -> &mut dyn TimerService {
        &mut self.timer
    }
}

fn user_event(base_offset: u16) -> u16 {
    hsm_bt::event::EVT_USER_BASE + base_offset
}

pub fn oven_root(_ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_INIT => StateResult::Tran(StateHandle::new(closed)),
        _ => StateResult::Super(StateHandle::new(top::<OvenCtx>)),
    }
}

pub fn open(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("open-ENTRY;");
            StateResult::Handled
        }
        EVT_EXIT => {
            ctx.trace.push_str("open-EXIT;");
            StateResult::Handled
        }
        id if id == user_event(OvenEvent::Close as u16) => StateResult::Tran(StateHandle::new(closed)),
        _ => StateResult::Super(StateHandle::new(oven_root)),
    }
}

pub fn closed(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.history),
        id if id == user_event(OvenEvent::Open as u16) => StateResult::Tran(StateHandle::new(open)),
        _ => StateResult::Super(StateHandle::new(oven_root)),
    }
}

pub fn on(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.history = StateHandle::new(on);
            ctx.trace.push_str("on-ENTRY;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Tran(StateHandle::with_instance(sequence, 0)),
        id if id == user_event(OvenEvent::TurnOff as u16) => StateResult::Tran(StateHandle::new(off)),
        _ => StateResult::Super(StateHandle::new(closed)),
    }
}

pub fn off(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.history = StateHandle::new(off);
            ctx.trace.push_str("off-ENTRY;");
            StateResult::Handled
        }
        id if id == user_event(OvenEvent::TurnOn as u16) => StateResult::Tran(StateHandle::new(on)),
        _ => StateResult::Super(StateHandle::new(closed)),
    }
}

fn preheat_wait(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.trace.push_str("preheat_wait-ENTRY;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Handled,
        _ => StateResult::Super(StateHandle::with_instance(delay, 0)),
    }
}

fn preheat_ready(ctx: &mut OvenCtx, event: &Event) -> StateResult<OvenCtx> {
    match event.id() {
        EVT_ENTRY => {
            ctx.preheated = true;
            ctx.trace.push_str("preheat_ready-ENTRY;");
            StateResult::Handled
        }
        EVT_INIT => StateResult::Handled,
        _ => StateResult::Super(StateHandle::with_instance(sequence, 0)),
    }
}
