//! [`TimerService`] backed by `tokio::time`. A BT node only ever arms or
//! disarms this synchronously from inside `dispatch`; the actor loop in
//! `oven_controller.rs` owns the same [`OvenCtx`](super::oven_states::OvenCtx)
//! the timer is a field of, so it can poll `next_deadline`/`take_due`
//! directly with no cross-task sharing at all.
use std::time::Duration;

use hsm_bt::event::Event;
use hsm_bt::timer::TimerService;
use tokio::time::Instant;

/// One tick is this long; `Delay::delay_ticks` from `oven_states.rs` is
/// expressed in ticks, not wall time, same as the node library's contract.
pub const TICK: Duration = Duration::from_millis(50);

struct PendingFire {
    event: Event,
    owner: u8,
    domain: u8,
    fire_at: Instant,
}

pub struct ActorTimer {
    pending: Vec<PendingFire>,
}

impl ActorTimer {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Earliest pending deadline, if any armed timer remains.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.fire_at).min()
    }

    /// Drain and return every timer whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<Event> {
        let (due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.fire_at <= now);
        self.pending = rest;
        due.into_iter().map(|p| p.event).collect()
    }
}

impl TimerService for ActorTimer {
    fn arm(&mut self, event: Event, owner: u8, ticks: u32, domain: u8) {
        let fire_at = Instant::now() + TICK * ticks;
        self.pending.push(PendingFire {
            event,
            owner,
            domain,
            fire_at,
        });
    }

    fn disarm(&mut self, owner: u8, domain: u8) {
        self.pending.retain(|p| !(p.owner == owner && p.domain == domain));
    }
}
