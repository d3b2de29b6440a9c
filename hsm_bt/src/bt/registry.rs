//! Per-context collection of BT node bookkeeping plus the `post` sink each
//! node uses to report completion to whatever is hosting it. Represented
//! as a context object rather than a process-wide singleton — the
//! preferred shape for exactly the reasons recorded in this crate's design
//! notes (no global mutable state, sound without a `Mutex` an inherently
//! single-threaded-per-hsm engine never needed).
use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::{HsmError, HsmResult};
use crate::event::{Event, EVT_BT_FAILURE, EVT_BT_SUCCESS};
use crate::post::Post;
use crate::state::StateHandle;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, strum::Display)]
pub enum BtNodeKind {
    Invert,
    ForceSuccess,
    ForceFailure,
    Repeat,
    RetryUntilSuccess,
    RunUntilFailure,
    Delay,
    Count,
    Fallback,
    Sequence,
    Parallel,
}

pub(crate) fn success_event() -> Event {
    Event::reserved(EVT_BT_SUCCESS)
}

pub(crate) fn failure_event() -> Event {
    Event::reserved(EVT_BT_FAILURE)
}

/// Shared shape for the pure one-child decorators (`Invert`, `ForceSuccess`,
/// `ForceFailure`, `RunUntilFailure`) — each only needs to know which state
/// to enter as its own `INIT` target.
#[derive(Clone, Copy, Debug)]
pub struct DecoratorState<C> {
    pub child: StateHandle<C>,
}

#[derive(Clone, Copy, Debug)]
pub struct RepeatState<C> {
    pub total: u32,
    pub done: u32,
    pub child: StateHandle<C>,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryState<C> {
    /// `None` means retry forever, mirroring `attempts_total == -1`.
    pub attempts_total: Option<u32>,
    pub attempts_done: u32,
    pub child: StateHandle<C>,
}

#[derive(Clone, Copy, Debug)]
pub struct CountState<C> {
    pub ntotal: u32,
    pub success_min: u32,
    pub success_cnt: u32,
    pub failure_cnt: u32,
    pub child: StateHandle<C>,
}

#[derive(Clone, Copy, Debug)]
pub struct DelayState<C> {
    pub delay_ticks: u32,
    pub domain: u8,
    pub armed: bool,
    pub child: StateHandle<C>,
}

/// Shared shape for `Fallback` and `Sequence` — both walk the same child
/// list in order, they differ only in which completion continues the walk
/// versus which short-circuits it (see `bt::nodes`).
pub struct CompositeState<C> {
    pub substates: Vec<StateHandle<C>>,
    pub current: usize,
}

pub struct ParallelState<C> {
    pub subhandlers: Vec<StateHandle<C>>,
    pub success_min: u32,
    pub success_cnt: u32,
    pub failure_cnt: u32,
}

/// The `{hsm, post}` sink record spec.md's BT registry records per hosted
/// hsm. Since `BtRegistry<C>` is itself a field of one hsm's own context
/// `C` (see the module doc), there is exactly one hsm in play here and the
/// "per hsm" list collapses to a single optional slot. Holds the sink
/// behind an `Rc` rather than a bare `Box` so a lookup can clone the handle
/// out and drop the borrow on the registry before calling `Post::post`,
/// which needs `&mut C` (and the registry lives inside `C`).
pub struct BtCfg<C> {
    post: Rc<dyn Post<C>>,
}

pub struct BtRegistry<C> {
    cfg: Option<BtCfg<C>>,
    superstates: HashMap<(BtNodeKind, u8), StateHandle<C>>,
    invert: HashMap<u8, DecoratorState<C>>,
    force_success: HashMap<u8, DecoratorState<C>>,
    force_failure: HashMap<u8, DecoratorState<C>>,
    repeat: HashMap<u8, RepeatState<C>>,
    retry: HashMap<u8, RetryState<C>>,
    run_until_failure: HashMap<u8, DecoratorState<C>>,
    count: HashMap<u8, CountState<C>>,
    delay: HashMap<u8, DelayState<C>>,
    fallback: HashMap<u8, CompositeState<C>>,
    sequence: HashMap<u8, CompositeState<C>>,
    parallel: HashMap<u8, ParallelState<C>>,
}

impl<C> BtRegistry<C> {
    pub fn new() -> Self {
        Self {
            cfg: None,
            superstates: HashMap::new(),
            invert: HashMap::new(),
            force_success: HashMap::new(),
            force_failure: HashMap::new(),
            repeat: HashMap::new(),
            retry: HashMap::new(),
            run_until_failure: HashMap::new(),
            count: HashMap::new(),
            delay: HashMap::new(),
            fallback: HashMap::new(),
            sequence: HashMap::new(),
            parallel: HashMap::new(),
        }
    }

    /// Register the sink every BT node's completion is posted through.
    /// Must be called once, before `Hsm::init`, per spec.md §5 ("the BT
    /// registry is mutated only during setup").
    pub fn add_cfg(&mut self, post: Rc<dyn Post<C>>) {
        self.cfg = Some(BtCfg { post });
    }

    /// The registered sink, cloned out of the `Rc` so the caller can drop
    /// the borrow on `self` (and thus on whatever owns this registry)
    /// before invoking it with `&mut C`.
    pub fn get_cfg(&self) -> HsmResult<Rc<dyn Post<C>>> {
        self.cfg.as_ref().map(|c| c.post.clone()).ok_or(HsmError::NoRegisteredCfg)
    }

    pub fn register_superstate(&mut self, kind: BtNodeKind, instance: u8, superstate: StateHandle<C>) {
        self.superstates.insert((kind, instance), superstate);
    }

    pub fn superstate(&self, kind: BtNodeKind, instance: u8) -> Result<StateHandle<C>, HsmError> {
        self.superstates
            .get(&(kind, instance))
            .copied()
            .ok_or_else(|| HsmError::NoSuperstate {
                kind: kind_name(kind),
                instance,
            })
    }

    pub fn add_invert(&mut self, instance: u8, child: StateHandle<C>) {
        self.invert.insert(instance, DecoratorState { child });
    }
    pub fn invert(&self, instance: u8) -> &DecoratorState<C> {
        self.invert.get(&instance).expect("invert node not registered")
    }

    pub fn add_force_success(&mut self, instance: u8, child: StateHandle<C>) {
        self.force_success.insert(instance, DecoratorState { child });
    }
    pub fn force_success(&self, instance: u8) -> &DecoratorState<C> {
        self.force_success.get(&instance).expect("force-success node not registered")
    }

    pub fn add_force_failure(&mut self, instance: u8, child: StateHandle<C>) {
        self.force_failure.insert(instance, DecoratorState { child });
    }
    pub fn force_failure(&self, instance: u8) -> &DecoratorState<C> {
        self.force_failure.get(&instance).expect("force-failure node not registered")
    }

    pub fn add_repeat(&mut self, instance: u8, total: u32, child: StateHandle<C>) {
        self.repeat.insert(instance, RepeatState { total, done: 0, child });
    }
    pub fn repeat_mut(&mut self, instance: u8) -> &mut RepeatState<C> {
        self.repeat.get_mut(&instance).expect("repeat node not registered")
    }

    pub fn add_retry_until_success(&mut self, instance: u8, attempts_total: Option<u32>, child: StateHandle<C>) {
        self.retry.insert(
            instance,
            RetryState {
                attempts_total,
                attempts_done: 0,
                child,
            },
        );
    }
    pub fn retry_mut(&mut self, instance: u8) -> &mut RetryState<C> {
        self.retry.get_mut(&instance).expect("retry node not registered")
    }

    pub fn add_run_until_failure(&mut self, instance: u8, child: StateHandle<C>) {
        self.run_until_failure.insert(instance, DecoratorState { child });
    }
    pub fn run_until_failure(&self, instance: u8) -> &DecoratorState<C> {
        self.run_until_failure
            .get(&instance)
            .expect("run-until-failure node not registered")
    }

    pub fn add_count(&mut self, instance: u8, ntotal: u32, success_min: u32, child: StateHandle<C>) {
        self.count.insert(
            instance,
            CountState {
                ntotal,
                success_min,
                success_cnt: 0,
                failure_cnt: 0,
                child,
            },
        );
    }
    pub fn count_mut(&mut self, instance: u8) -> &mut CountState<C> {
        self.count.get_mut(&instance).expect("count node not registered")
    }
    pub fn count(&self, instance: u8) -> &CountState<C> {
        self.count.get(&instance).expect("count node not registered")
    }

    pub fn add_delay(&mut self, instance: u8, delay_ticks: u32, domain: u8, child: StateHandle<C>) {
        self.delay.insert(
            instance,
            DelayState {
                delay_ticks,
                domain,
                armed: false,
                child,
            },
        );
    }
    pub fn delay_mut(&mut self, instance: u8) -> &mut DelayState<C> {
        self.delay.get_mut(&instance).expect("delay node not registered")
    }
    pub fn delay(&self, instance: u8) -> &DelayState<C> {
        self.delay.get(&instance).expect("delay node not registered")
    }

    pub fn add_fallback(&mut self, instance: u8, substates: Vec<StateHandle<C>>) {
        self.fallback.insert(instance, CompositeState { substates, current: 0 });
    }
    pub fn fallback_mut(&mut self, instance: u8) -> &mut CompositeState<C> {
        self.fallback.get_mut(&instance).expect("fallback node not registered")
    }

    pub fn add_sequence(&mut self, instance: u8, substates: Vec<StateHandle<C>>) {
        self.sequence.insert(instance, CompositeState { substates, current: 0 });
    }
    pub fn sequence_mut(&mut self, instance: u8) -> &mut CompositeState<C> {
        self.sequence.get_mut(&instance).expect("sequence node not registered")
    }

    pub fn add_parallel(&mut self, instance: u8, subhandlers: Vec<StateHandle<C>>, success_min: u32) {
        self.parallel.insert(
            instance,
            ParallelState {
                subhandlers,
                success_min,
                success_cnt: 0,
                failure_cnt: 0,
            },
        );
    }
    pub fn parallel_mut(&mut self, instance: u8) -> &mut ParallelState<C> {
        self.parallel.get_mut(&instance).expect("parallel node not registered")
    }
    pub fn parallel(&self, instance: u8) -> &ParallelState<C> {
        self.parallel.get(&instance).expect("parallel node not registered")
    }
}

fn kind_name(kind: BtNodeKind) -> &'static str {
    match kind {
        BtNodeKind::Invert => "Invert",
        BtNodeKind::ForceSuccess => "ForceSuccess",
        BtNodeKind::ForceFailure => "ForceFailure",
        BtNodeKind::Repeat => "Repeat",
        BtNodeKind::RetryUntilSuccess => "RetryUntilSuccess",
        BtNodeKind::RunUntilFailure => "RunUntilFailure",
        BtNodeKind::Delay => "Delay",
        BtNodeKind::Count => "Count",
        BtNodeKind::Fallback => "Fallback",
        BtNodeKind::Sequence => "Sequence",
        BtNodeKind::Parallel => "Parallel",
    }
}
