//! A state is identified by a function pointer plus a submachine instance id,
//! exactly the `(fn, smi)` pair used throughout this crate's C ancestor.
use crate::event::Event;

/// What a state handler returns after looking at an event.
pub enum StateResult<C> {
    /// Event consumed here; stop bubbling.
    Handled,
    /// Transition to `target`. Not legal in response to `ENTRY`/`EXIT`.
    Tran(StateHandle<C>),
    /// Like `Tran`, but the engine will redispatch the same event into the
    /// new state once the transition settles. At most one redispatch per
    /// dispatch call is tolerated.
    TranRedispatch(StateHandle<C>),
    /// Not handled here; ask `parent` instead. The only legal answer to the
    /// `EMPTY` topology-walk event.
    Super(StateHandle<C>),
}

/// A state handler. `C` is the context type the handler is allowed to
/// mutate — typically a struct that embeds an [`crate::hsm::Hsm<C>`] among
/// its own fields.
pub type StateFn<C> = fn(&mut C, &Event) -> StateResult<C>;

/// An inexpensive, `Copy` token identifying a state. Two handles compare
/// equal iff they point at the same handler function and carry the same
/// submachine instance id, which is exactly the field-wise comparison this
/// crate's state-handle equality rule requires.
pub struct StateHandle<C> {
    handler: StateFn<C>,
    smi: u8,
}

impl<C> StateHandle<C> {
    /// Build a handle for a state with no submachine instance (`smi == 0`).
    pub fn new(handler: StateFn<C>) -> Self {
        Self::with_instance(handler, 0)
    }

    /// Build a handle for one instance (`smi` in `[0, 127]`) of a reusable,
    /// reentrant state — the mechanism the BT node library depends on to let
    /// the same decorator/composite handler back several unrelated nodes in
    /// one context.
    pub fn with_instance(handler: StateFn<C>, smi: u8) -> Self {
        debug_assert!(smi <= 127, "submachine instance {smi} is out of range [0,127]");
        Self { handler, smi }
    }

    pub fn handler(&self) -> StateFn<C> {
        self.handler
    }

    pub fn instance(&self) -> u8 {
        self.smi
    }
}

impl<C> Clone for StateHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<C> Copy for StateHandle<C> {}

impl<C> PartialEq for StateHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        (self.handler as usize) == (other.handler as usize) && self.smi == other.smi
    }
}
impl<C> Eq for StateHandle<C> {}

impl<C> std::fmt::Debug for StateHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateHandle {{ fn: {:#x}, smi: {} }}", self.handler as usize, self.smi)
    }
}

impl<C> std::hash::Hash for StateHandle<C> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.handler as usize).hash(state);
        self.smi.hash(state);
    }
}
