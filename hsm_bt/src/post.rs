//! Embedder-supplied event sink. An hsm never reaches into another hsm's
//! dispatch directly — cross-machine signaling (a `Parallel` sub-state
//! reporting to its aggregator, a user HSM poking a sibling) goes through
//! whatever `Post<C>` the embedder wires up, mirroring the decoupling
//! `HSMEngine::pending_events`/`dispatch_event` gives the teacher's own
//! channel-based dispatch loop.
use crate::event::Event;
use crate::hsm::{Hsm, HsmContext};
use crate::state::StateHandle;

pub trait Post<C> {
    /// Deliver `event` so that it is, eventually, dispatched into `target`'s
    /// hosting hsm starting at `target` itself rather than at whatever leaf
    /// is currently active. `ctx` is the hosting hsm's own context — what
    /// "deliver" means is up to the implementation: queue onto `ctx`'s own
    /// hsm (the in-process default, [`QueuePost`]), forward across a
    /// cross-thread channel that something else drains later, a test double
    /// that just records what it was given.
    fn post(&self, ctx: &mut C, target: StateHandle<C>, event: Event);
}

/// The in-process default sink: queues `event` on `ctx`'s own hsm, to be
/// delivered (bubbling up from `target`, not from the current leaf) once the
/// dispatch in progress right now returns control to [`Hsm::dispatch`]'s
/// drain loop. This is how a BT node reports its own completion without
/// reentering `dispatch` from inside a state handler — see
/// [`Hsm::post_from`].
#[derive(Clone, Copy, Debug, Default)]
pub struct QueuePost;

impl<C: HsmContext> Post<C> for QueuePost {
    fn post(&self, ctx: &mut C, target: StateHandle<C>, event: Event) {
        Hsm::post_from(ctx, target, event);
    }
}
