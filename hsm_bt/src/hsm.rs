//! The hierarchical state machine engine: dispatch, transitions, entry/exit,
//! and the lifecycle contract (ctor -> init -> dispatch* -> dtor).
use std::collections::VecDeque;

use crate::event::{Event, EVT_EMPTY, EVT_ENTRY, EVT_EXIT, EVT_INIT};
use crate::logger::HsmLogger;
use crate::state::{StateFn, StateHandle, StateResult};
use crate::utils::get_function_name;

/// Transitions nested more than this many levels deep abort the process —
/// this bounds the ancestor-chain walk the same way the amast C library
/// bounds `hierarchy_level` to a 5-bit field.
pub const HIERARCHY_DEPTH_MAX: u8 = 16;

pub type SpyFn<C> = fn(&mut C, &Event);

/// Implemented by whatever struct embeds an [`Hsm<C>`] as a field. `C` is
/// both the engine's context and the type every state handler for this
/// machine mutates.
pub trait HsmContext: Sized {
    fn hsm(&mut self) -> &mut Hsm<Self>;
    fn hsm_ref(&self) -> &Hsm<Self>;
}

/// The top pseudostate. Always handled; every ancestor chain terminates
/// here. Never a legal transition target.
pub fn top<C: HsmContext>(_ctx: &mut C, _event: &Event) -> StateResult<C> {
    StateResult::Handled
}

/// An event queued for delivery after the dispatch in progress returns.
enum Pending<C> {
    /// Redeliver starting from whatever the active leaf is once drained —
    /// the general "post to my own inbox" case ([`Hsm::post_self`]).
    FromLeaf(Event),
    /// Redeliver starting the bubble-up walk at a specific state rather
    /// than the active leaf — what a BT node uses to report its own
    /// completion to its superstate without looping back through itself
    /// ([`Hsm::post_from`]).
    FromState(StateHandle<C>, Event),
}

pub struct Hsm<C> {
    state: StateHandle<C>,
    /// Whichever state handle is executing right now, valid for the
    /// duration of a single handler invocation. This is how a BT node finds
    /// its own submachine instance id from inside its handler body — the
    /// handler itself is only ever passed `(ctx, &event)`, so the engine
    /// stashes "who is currently being asked" here before every call,
    /// mirroring `am_hsm_get_state_instance` reading `hsm->state.smi`.
    executing: StateHandle<C>,
    smi: u8,
    hierarchy_level: u8,
    ctor_called: bool,
    init_called: bool,
    dispatch_in_progress: bool,
    spy: Option<SpyFn<C>>,
    pending: VecDeque<Pending<C>>,
    logger: HsmLogger,
}

impl<C: HsmContext> Hsm<C> {
    /// Construct the engine itself. Mirrors `am_hsm_ctor`: `initial` is the
    /// placeholder state whose `INIT` handler performs the real initial
    /// transition when [`Hsm::init`] runs.
    pub fn new(initial: StateHandle<C>, logger: HsmLogger) -> Self {
        Self {
            state: initial,
            executing: initial,
            smi: initial.instance(),
            hierarchy_level: 0,
            ctor_called: true,
            init_called: false,
            dispatch_in_progress: false,
            spy: None,
            pending: VecDeque::new(),
            logger,
        }
    }

    /// Every call into a state handler goes through here so `executing`
    /// always reflects whoever is running.
    pub(crate) fn invoke(ctx: &mut C, s: StateHandle<C>, event: &Event) -> StateResult<C> {
        ctx.hsm().executing = s;
        (s.handler())(ctx, event)
    }

    /// The submachine instance of whichever state handler is currently
    /// executing. Only meaningful from inside a state handler.
    pub fn current_instance(ctx: &C) -> u8 {
        ctx.hsm_ref().executing.instance()
    }

    /// Re-constructs an hsm in place, exiting whatever it currently holds
    /// first. Mirrors `am_hsm_dtor` followed by `am_hsm_ctor`.
    pub fn dtor(ctx: &mut C) {
        let chain = Self::ancestor_chain(ctx, ctx.hsm().state);
        for s in chain {
            Self::exit_one(ctx, s);
        }
        let hsm = ctx.hsm();
        hsm.ctor_called = false;
        hsm.init_called = false;
    }

    /// Runs the initial transition. `event` defaults to the reserved `INIT`
    /// event if not given. The placeholder state set by [`Hsm::new`] must
    /// answer with `TRAN`.
    pub fn init(ctx: &mut C, event: Option<Event>) {
        assert!(ctx.hsm().ctor_called, "ctor must run before init");
        assert!(!ctx.hsm().init_called, "init must only run once");
        let ev = event.unwrap_or(Event::reserved(EVT_INIT));
        let placeholder = ctx.hsm().state;
        let rc = Self::invoke(ctx, placeholder, &ev);
        let dst = match rc {
            StateResult::Tran(dst) | StateResult::TranRedispatch(dst) => dst,
            _ => panic!("the initial transition handler must return TRAN"),
        };
        assert!(!Self::is_top(dst), "cannot transition to the top pseudostate");
        let mut path = Self::ancestor_chain(ctx, dst);
        path.reverse();
        Self::enter_and_init(ctx, path);
        ctx.hsm().init_called = true;
    }

    /// Dispatches `event`. If a dispatch into this same hsm is already in
    /// progress the event is queued and drained once the in-progress
    /// dispatch returns, instead of being dispatched re-entrantly.
    pub fn dispatch(ctx: &mut C, event: Event) {
        assert!(ctx.hsm().ctor_called, "ctor was never called");
        assert!(ctx.hsm().init_called, "init was never called");

        if ctx.hsm().dispatch_in_progress {
            ctx.hsm().pending.push_back(Pending::FromLeaf(event));
            return;
        }

        ctx.hsm().dispatch_in_progress = true;
        if let Some(spy) = ctx.hsm().spy {
            spy(ctx, &event);
        }

        let start = ctx.hsm().state;
        Self::deliver_from(ctx, start, event);
        ctx.hsm().dispatch_in_progress = false;

        while let Some(queued) = ctx.hsm().pending.pop_front() {
            match queued {
                Pending::FromLeaf(event) => Self::dispatch(ctx, event),
                Pending::FromState(start, event) => {
                    ctx.hsm().dispatch_in_progress = true;
                    Self::deliver_from(ctx, start, event);
                    ctx.hsm().dispatch_in_progress = false;
                }
            }
        }
    }

    /// Bubble `event` up from `start` until some ancestor handles it or
    /// transitions away. Returns the terminal outcome of that one
    /// bubble-up walk (the caller decides whether it warrants a redispatch).
    /// `start` need not be the active leaf — BT decorators that synthesize
    /// a new completion event for their own superstate hand this a cursor
    /// above themselves (see `deliver_from`), so the event they invent
    /// never bubbles back through the node that just resolved.
    fn bubble_from(ctx: &mut C, start: StateHandle<C>, event: &Event) -> StateResult<C> {
        let mut current = start;
        loop {
            let rc = Self::invoke(ctx, current, event);
            match rc {
                StateResult::Handled => return StateResult::Handled,
                StateResult::Super(parent) => {
                    if Self::is_top(parent) {
                        return StateResult::Handled;
                    }
                    current = parent;
                }
                StateResult::Tran(dst) => {
                    assert!(!Self::is_top(dst), "cannot transition to the top pseudostate");
                    Self::transition(ctx, current, dst);
                    return StateResult::Tran(dst);
                }
                StateResult::TranRedispatch(dst) => {
                    assert!(!Self::is_top(dst), "cannot transition to the top pseudostate");
                    Self::transition(ctx, current, dst);
                    return StateResult::TranRedispatch(dst);
                }
            }
        }
    }

    /// Delivers `event` starting the bubble-up walk at `start`, honoring
    /// the at-most-one-redispatch rule the same way a top-level `dispatch`
    /// does. Used by [`Hsm::dispatch`]'s own `FromState` drain arm — the
    /// mechanism [`Hsm::post_from`] and the BT node library's `Post` sink
    /// build on to deliver a node's completion to its superstate once the
    /// current dispatch has unwound, without it bubbling back through the
    /// node that just produced it.
    pub(crate) fn deliver_from(ctx: &mut C, start: StateHandle<C>, event: Event) {
        let rc = Self::bubble_from(ctx, start, &event);
        if let StateResult::TranRedispatch(_) = rc {
            let next_start = ctx.hsm().state;
            let rc2 = Self::bubble_from(ctx, next_start, &event);
            assert!(
                !matches!(rc2, StateResult::TranRedispatch(_)),
                "state handler answered TRAN_REDISPATCH twice for the same event"
            );
        }
    }

    /// `src` is the state whose handler actually answered `TRAN` — not
    /// necessarily the currently active leaf, since the event may have
    /// bubbled up several levels first. The leaf is exited down to `src`
    /// before the usual self-transition/LCA exit-then-enter logic runs.
    fn transition(ctx: &mut C, src: StateHandle<C>, dst: StateHandle<C>) {
        let leaf = ctx.hsm().state;
        if leaf != src {
            let leaf_chain = Self::ancestor_chain(ctx, leaf);
            for s in &leaf_chain {
                if *s == src {
                    break;
                }
                Self::exit_one(ctx, *s);
            }
        }
        ctx.hsm().state = src;

        if src == dst {
            Self::exit_one(ctx, src);
            Self::enter_and_init(ctx, vec![dst]);
            return;
        }

        let src_chain = Self::ancestor_chain(ctx, src);
        let dst_chain = Self::ancestor_chain(ctx, dst);
        let lca = src_chain
            .iter()
            .find(|s| dst_chain.contains(s))
            .copied()
            .expect("no common ancestor between src and dst; states must share a root");

        for s in &src_chain {
            if *s == lca {
                break;
            }
            Self::exit_one(ctx, *s);
        }

        if dst == lca {
            // dst is a proper ancestor of src and was never exited above, so
            // it is not re-entered — only its own INIT runs, to pick a
            // (possibly different) substate now that nothing below it is
            // active. Mirrors "transition where dst is an ancestor of src"
            // in this crate's testable properties.
            Self::init_and_recurse(ctx, dst);
            return;
        }

        let mut enter_path: Vec<StateHandle<C>> =
            dst_chain.into_iter().take_while(|s| *s != lca).collect();
        enter_path.reverse();
        Self::enter_and_init(ctx, enter_path);
    }

    /// Enters every state in `path` (already ordered outermost to
    /// innermost), then runs [`Hsm::init_and_recurse`] on the leaf.
    fn enter_and_init(ctx: &mut C, path: Vec<StateHandle<C>>) {
        for s in &path {
            Self::enter_one(ctx, *s);
        }
        if let Some(leaf) = path.last() {
            Self::init_and_recurse(ctx, *leaf);
        }
    }

    /// Dispatches `INIT` to `leaf` (already the active state, already
    /// entered or never exited), recursing for as long as `INIT` keeps
    /// answering `TRAN` into a substate.
    fn init_and_recurse(ctx: &mut C, mut leaf: StateHandle<C>) {
        loop {
            ctx.hsm().state = leaf;
            ctx.hsm().smi = leaf.instance();

            let init_event = Event::reserved(EVT_INIT);
            let rc = Self::invoke(ctx, leaf, &init_event);
            match rc {
                StateResult::Handled => return,
                StateResult::Tran(next) | StateResult::TranRedispatch(next) => {
                    assert!(!Self::is_top(next), "INIT must not transition to the top pseudostate");
                    let chain = Self::ancestor_chain(ctx, next);
                    let mut path: Vec<StateHandle<C>> = chain.into_iter().take_while(|s| *s != leaf).collect();
                    path.reverse();
                    assert!(
                        (ctx.hsm().hierarchy_level as usize + path.len()) <= HIERARCHY_DEPTH_MAX as usize,
                        "hierarchy depth exceeded {HIERARCHY_DEPTH_MAX}"
                    );
                    for s in &path {
                        Self::enter_one(ctx, *s);
                    }
                    leaf = *path.last().expect("INIT target must be a proper substate");
                }
                StateResult::Super(_) => panic!("INIT handler must not answer with SUPER"),
            }
        }
    }

    fn enter_one(ctx: &mut C, s: StateHandle<C>) {
        let ev = Event::reserved(EVT_ENTRY);
        let _ = Self::invoke(ctx, s, &ev);
        let hsm = ctx.hsm();
        hsm.hierarchy_level += 1;
        hsm.logger.log_trace(get_function_name!(), "state entered");
    }

    fn exit_one(ctx: &mut C, s: StateHandle<C>) {
        let ev = Event::reserved(EVT_EXIT);
        let _ = Self::invoke(ctx, s, &ev);
        let hsm = ctx.hsm();
        hsm.hierarchy_level = hsm.hierarchy_level.saturating_sub(1);
        hsm.logger.log_trace(get_function_name!(), "state exited");
    }

    /// `[from, parent(from), ..., last state before top]`, built by asking
    /// each state for its superstate via the reserved `EMPTY` event — the
    /// function-encoded topology walk this crate's ancestor used directly
    /// on C function pointers.
    fn ancestor_chain(ctx: &mut C, from: StateHandle<C>) -> Vec<StateHandle<C>> {
        let mut chain = vec![from];
        let mut current = from;
        loop {
            let empty = Event::reserved(EVT_EMPTY);
            match Self::invoke(ctx, current, &empty) {
                StateResult::Super(parent) => {
                    if Self::is_top(parent) {
                        break;
                    }
                    chain.push(parent);
                    current = parent;
                }
                _ => panic!("state handler must answer SUPER to the EMPTY event"),
            }
        }
        chain
    }

    fn is_top(s: StateHandle<C>) -> bool {
        (s.handler() as usize) == (top::<C> as usize)
    }

    pub fn is_in(ctx: &mut C, query: StateHandle<C>) -> bool {
        let current = ctx.hsm().state;
        if current == query {
            return true;
        }
        Self::ancestor_chain(ctx, current).into_iter().any(|s| s == query)
    }

    pub fn state_is_eq(a: StateHandle<C>, b: StateHandle<C>) -> bool {
        a == b
    }

    pub fn get_instance(ctx: &C) -> u8 {
        ctx.hsm_ref().smi
    }

    pub fn get_state(ctx: &C) -> StateHandle<C> {
        ctx.hsm_ref().state
    }

    pub fn set_spy(ctx: &mut C, spy: Option<SpyFn<C>>) {
        ctx.hsm().spy = spy;
    }

    /// Queue `event` for dispatch into this same hsm once the current
    /// dispatch (if any) returns, starting the bubble-up walk at the active
    /// leaf as usual.
    pub fn post_self(ctx: &mut C, event: Event) {
        ctx.hsm().pending.push_back(Pending::FromLeaf(event));
    }

    /// Queue `event` for delivery once the current dispatch returns,
    /// starting the bubble-up walk at `start` rather than the active leaf.
    /// This is how a BT node's [`crate::post::Post`] sink reports a
    /// completion to the node's recorded superstate: the node's own handler
    /// returns immediately (no synchronous transition on completion, per
    /// this crate's deferred-completion contract), and the superstate's
    /// reaction runs as its own bubble-up walk once this dispatch's
    /// handler-call stack has fully unwound.
    pub fn post_from(ctx: &mut C, start: StateHandle<C>, event: Event) {
        ctx.hsm().pending.push_back(Pending::FromState(start, event));
    }
}
