//! The behavior-tree node library. Every function here has the ordinary
//! `StateFn<C>` shape, so a decorator or composite slots into any hsm's
//! hierarchy exactly like a hand-written state — the engine does not know
//! BT nodes exist.
//!
//! Per this crate's deferred-completion contract (spec.md §4.C4: a node
//! "never transition[s] synchronously on completion inside the handler;
//! [it] post[s] a transformed event to the inbox"), a node that has decided
//! its own `SUCCESS`/`FAILURE` never answers that decision with
//! `StateResult::Super` or calls `Hsm::deliver_from` itself. It instead
//! calls `complete`, which posts through the registry's registered
//! `Post` sink (see `crate::post`) and returns `Handled` immediately — the
//! superstate's reaction to that completion runs as its own bubble-up walk
//! once this dispatch's handler-call stack has fully unwound, not inside
//! the handler that decided the outcome.
use crate::bt::registry::{failure_event, success_event, BtNodeKind};
use crate::errors::HsmError;
use crate::event::{Event, EVT_BT_DELAY, EVT_BT_FAILURE, EVT_BT_SUCCESS, EVT_ENTRY, EVT_EXIT, EVT_INIT};
use crate::hsm::{Hsm, HsmContext};
use crate::state::{StateHandle, StateResult};
use crate::timer::TimerService;

/// Implemented by a context that hosts BT nodes: gives every node function
/// a place to keep its own bookkeeping (registered by instance id) and to
/// look up the state it should bubble unrecognized events to.
pub trait BtContext: HsmContext {
    fn bt_registry(&self) -> &crate::bt::registry::BtRegistry<Self>;
    fn bt_registry_mut(&mut self) -> &mut crate::bt::registry::BtRegistry<Self>;
}

/// Implemented in addition to [`BtContext`] by a context that hosts a
/// `Delay` node, giving it somewhere to arm/disarm its timer.
pub trait BtTimerContext: BtContext {
    fn timer(&mut self) -> &mut dyn TimerService;
}

fn superstate<C: BtContext>(ctx: &C, kind: BtNodeKind) -> StateHandle<C> {
    let instance = Hsm::current_instance(ctx);
    ctx.bt_registry()
        .superstate(kind, instance)
        .unwrap_or_else(|e| panic!("{e}"))
}

/// A node has decided its own completion (`event`, a `SUCCESS`/`FAILURE`):
/// post it through the registered `Post` sink, targeted at `kind`'s
/// recorded superstate, and return `Handled` — never a synchronous
/// `Super`/`deliver_from`. This is the one exit path every node uses to
/// report a terminal outcome to whatever hosts it.
fn complete<C: BtContext>(ctx: &mut C, kind: BtNodeKind, event: Event) -> StateResult<C> {
    let sup = superstate(ctx, kind);
    let post = ctx.bt_registry().get_cfg().unwrap_or_else(|e| panic!("{e}"));
    post.post(ctx, sup, event);
    StateResult::Handled
}

// ---------------------------------------------------------------- Invert --

pub fn invert<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry().invert(instance).child),
        EVT_BT_SUCCESS => complete(ctx, BtNodeKind::Invert, failure_event()),
        EVT_BT_FAILURE => complete(ctx, BtNodeKind::Invert, success_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Invert)),
    }
}

// ---------------------------------------------------------- ForceSuccess --

pub fn force_success<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry().force_success(instance).child),
        EVT_BT_SUCCESS | EVT_BT_FAILURE => complete(ctx, BtNodeKind::ForceSuccess, success_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::ForceSuccess)),
    }
}

// ---------------------------------------------------------- ForceFailure --

pub fn force_failure<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry().force_failure(instance).child),
        EVT_BT_SUCCESS | EVT_BT_FAILURE => complete(ctx, BtNodeKind::ForceFailure, failure_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::ForceFailure)),
    }
}

// --------------------------------------------------------------- Repeat --

/// Re-enters its child on `SUCCESS` until `total` repetitions have run,
/// then posts a final `SUCCESS`. `FAILURE` posts immediately. (The
/// documented semantics — this crate's C ancestor has a known bug here that
/// posts `FAILURE` on `SUCCESS` and looks up the wrong superstate kind;
/// neither is reproduced.)
pub fn repeat<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry_mut().repeat_mut(instance).child),
        EVT_ENTRY => {
            ctx.bt_registry_mut().repeat_mut(instance).done = 0;
            StateResult::Handled
        }
        EVT_BT_SUCCESS => {
            let (done, total, child) = {
                let st = ctx.bt_registry_mut().repeat_mut(instance);
                st.done += 1;
                (st.done, st.total, st.child)
            };
            if done < total {
                StateResult::Tran(child)
            } else {
                complete(ctx, BtNodeKind::Repeat, success_event())
            }
        }
        EVT_BT_FAILURE => complete(ctx, BtNodeKind::Repeat, failure_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Repeat)),
    }
}

// --------------------------------------------------------- RetryUntilSuccess --

/// On `FAILURE`, retries (re-enters its child) unless the configured
/// attempt budget is exhausted, in which case it posts `FAILURE`. A budget
/// of `None` retries forever — this is the node used in the scenario that
/// exercises an unbounded retry loop.
pub fn retry_until_success<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry_mut().retry_mut(instance).child),
        EVT_ENTRY => {
            ctx.bt_registry_mut().retry_mut(instance).attempts_done = 0;
            StateResult::Handled
        }
        EVT_BT_SUCCESS => complete(ctx, BtNodeKind::RetryUntilSuccess, success_event()),
        EVT_BT_FAILURE => {
            let (exhausted, child) = {
                let st = ctx.bt_registry_mut().retry_mut(instance);
                st.attempts_done += 1;
                let exhausted = st.attempts_total.is_some_and(|total| st.attempts_done >= total);
                (exhausted, st.child)
            };
            if exhausted {
                complete(ctx, BtNodeKind::RetryUntilSuccess, failure_event())
            } else {
                StateResult::Tran(child)
            }
        }
        _ => StateResult::Super(superstate(ctx, BtNodeKind::RetryUntilSuccess)),
    }
}

// ----------------------------------------------------------- RunUntilFailure --

pub fn run_until_failure<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry().run_until_failure(instance).child),
        EVT_BT_SUCCESS => {
            let child = ctx.bt_registry().run_until_failure(instance).child;
            StateResult::Tran(child)
        }
        EVT_BT_FAILURE => complete(ctx, BtNodeKind::RunUntilFailure, failure_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::RunUntilFailure)),
    }
}

// --------------------------------------------------------------- Delay --

pub fn delay<C: BtTimerContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Handled,
        EVT_ENTRY => {
            let (ticks, domain) = {
                let st = ctx.bt_registry_mut().delay_mut(instance);
                st.armed = true;
                (st.delay_ticks, st.domain)
            };
            ctx.timer().arm(Event::reserved(EVT_BT_DELAY), instance, ticks, domain);
            StateResult::Handled
        }
        EVT_EXIT => {
            let domain = {
                let st = ctx.bt_registry_mut().delay_mut(instance);
                let domain = st.domain;
                st.armed = false;
                domain
            };
            ctx.timer().disarm(instance, domain);
            StateResult::Handled
        }
        EVT_BT_DELAY => {
            let child = ctx.bt_registry().delay(instance).child;
            StateResult::Tran(child)
        }
        // The child's own SUCCESS/FAILURE is forwarded verbatim, not
        // reinterpreted — `Delay` only gates *when* the child runs.
        EVT_BT_SUCCESS => complete(ctx, BtNodeKind::Delay, success_event()),
        EVT_BT_FAILURE => complete(ctx, BtNodeKind::Delay, failure_event()),
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Delay)),
    }
}

// --------------------------------------------------------------- Count --

/// Aggregates a fixed number of attempts; once `success_cnt >= success_min`
/// the triggering `SUCCESS` is posted, and once success becomes
/// mathematically impossible (`failure_cnt > ntotal - success_min`) the
/// triggering `FAILURE` is posted. Otherwise still collecting.
pub fn count<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry().count(instance).child),
        EVT_ENTRY => {
            let st = ctx.bt_registry_mut().count_mut(instance);
            st.success_cnt = 0;
            st.failure_cnt = 0;
            StateResult::Handled
        }
        EVT_BT_SUCCESS => {
            let (success_cnt, success_min) = {
                let st = ctx.bt_registry_mut().count_mut(instance);
                st.success_cnt += 1;
                debug_assert!(
                    st.success_cnt + st.failure_cnt <= st.ntotal,
                    "{}",
                    HsmError::UnexpectedCompletion
                );
                (st.success_cnt, st.success_min)
            };
            if success_cnt >= success_min {
                complete(ctx, BtNodeKind::Count, success_event())
            } else {
                StateResult::Handled
            }
        }
        EVT_BT_FAILURE => {
            let (failure_cnt, success_min, ntotal) = {
                let st = ctx.bt_registry_mut().count_mut(instance);
                st.failure_cnt += 1;
                debug_assert!(
                    st.success_cnt + st.failure_cnt <= st.ntotal,
                    "{}",
                    HsmError::UnexpectedCompletion
                );
                (st.failure_cnt, st.success_min, st.ntotal)
            };
            if failure_cnt > ntotal.saturating_sub(success_min) {
                complete(ctx, BtNodeKind::Count, failure_event())
            } else {
                StateResult::Handled
            }
        }
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Count)),
    }
}

// ------------------------------------------------------------ Fallback --

/// Tries each child in order; the first to `SUCCESS` is posted unchanged.
/// `FAILURE` advances to the next child; running out of children posts the
/// last `FAILURE`.
pub fn fallback<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry_mut().fallback_mut(instance).substates[0]),
        EVT_ENTRY => {
            ctx.bt_registry_mut().fallback_mut(instance).current = 0;
            StateResult::Handled
        }
        EVT_BT_SUCCESS => complete(ctx, BtNodeKind::Fallback, success_event()),
        EVT_BT_FAILURE => {
            let next = {
                let st = ctx.bt_registry_mut().fallback_mut(instance);
                st.current += 1;
                if st.current >= st.substates.len() {
                    None
                } else {
                    Some(st.substates[st.current])
                }
            };
            match next {
                Some(next) => StateResult::Tran(next),
                None => complete(ctx, BtNodeKind::Fallback, failure_event()),
            }
        }
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Fallback)),
    }
}

// ------------------------------------------------------------ Sequence --

/// Mirror image of `Fallback`: `FAILURE` is posted immediately, `SUCCESS`
/// advances to the next child, and running out of children posts the last
/// `SUCCESS`.
pub fn sequence<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Tran(ctx.bt_registry_mut().sequence_mut(instance).substates[0]),
        EVT_ENTRY => {
            ctx.bt_registry_mut().sequence_mut(instance).current = 0;
            StateResult::Handled
        }
        EVT_BT_FAILURE => complete(ctx, BtNodeKind::Sequence, failure_event()),
        EVT_BT_SUCCESS => {
            let next = {
                let st = ctx.bt_registry_mut().sequence_mut(instance);
                st.current += 1;
                if st.current >= st.substates.len() {
                    None
                } else {
                    Some(st.substates[st.current])
                }
            };
            match next {
                Some(next) => StateResult::Tran(next),
                None => complete(ctx, BtNodeKind::Sequence, success_event()),
            }
        }
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Sequence)),
    }
}

// ------------------------------------------------------------ Parallel --

/// Runs every sub-state concurrently, in the simplified sense described in
/// this crate's design notes: each sub-state is a single flat handler
/// entered directly on `ENTRY`, not an independently-dispatched nested hsm.
/// Once `success_cnt >= success_min` a `SUCCESS` is posted; once enough
/// children have failed that `success_min` can no longer be reached, a
/// `FAILURE` is posted. A debug assertion guards the aggregate count never
/// exceeding the installed sub-handler count — more completions than
/// sub-handlers would mean one sub-handler posted more than once, which
/// this crate's contract (exactly one completion per activation) forbids.
pub fn parallel<C: BtContext>(ctx: &mut C, event: &Event) -> StateResult<C> {
    let instance = Hsm::current_instance(ctx);
    match event.id() {
        EVT_INIT => StateResult::Handled,
        EVT_ENTRY => {
            let subhandlers: Vec<StateHandle<C>> = ctx.bt_registry().parallel(instance).subhandlers.clone();
            let entry = Event::reserved(EVT_ENTRY);
            for h in &subhandlers {
                let _ = Hsm::invoke(ctx, *h, &entry);
            }
            let st = ctx.bt_registry_mut().parallel_mut(instance);
            st.success_cnt = 0;
            st.failure_cnt = 0;
            StateResult::Handled
        }
        EVT_BT_SUCCESS => {
            let (success_cnt, success_min) = {
                let st = ctx.bt_registry_mut().parallel_mut(instance);
                st.success_cnt += 1;
                debug_assert!(
                    (st.success_cnt + st.failure_cnt) as usize <= st.subhandlers.len(),
                    "{}",
                    HsmError::UnexpectedCompletion
                );
                (st.success_cnt, st.success_min)
            };
            if success_cnt >= success_min {
                complete(ctx, BtNodeKind::Parallel, success_event())
            } else {
                StateResult::Handled
            }
        }
        EVT_BT_FAILURE => {
            let (failure_cnt, success_min, total) = {
                let st = ctx.bt_registry_mut().parallel_mut(instance);
                st.failure_cnt += 1;
                debug_assert!(
                    (st.success_cnt + st.failure_cnt) as usize <= st.subhandlers.len(),
                    "{}",
                    HsmError::UnexpectedCompletion
                );
                (st.failure_cnt, st.success_min, st.subhandlers.len() as u32)
            };
            if failure_cnt > total.saturating_sub(success_min) {
                complete(ctx, BtNodeKind::Parallel, failure_event())
            } else {
                StateResult::Handled
            }
        }
        _ => StateResult::Super(superstate(ctx, BtNodeKind::Parallel)),
    }
}
