//! External timer service required by the `Delay` behavior-tree node.
//!
//! Grounded in the tick-domain timer wheel this crate's C ancestor exposes
//! (`struct event_timer { event, item, owner, shot_in_ticks, interval_ticks }`
//! armed per tick domain); this crate only needs the arm/disarm edge of that
//! API, so it is expressed as a trait an embedder implements against
//! whatever scheduler it already has rather than a wheel this crate owns.
use crate::event::Event;

pub trait TimerService {
    /// Arm a one-shot timer that delivers `event` after `ticks` ticks of
    /// `domain`. `owner` identifies the submachine instance that armed it,
    /// so `disarm` can cancel the right one.
    fn arm(&mut self, event: Event, owner: u8, ticks: u32, domain: u8);

    /// Cancel whatever timer `owner` armed on `domain`, if any. Exiting a
    /// `Delay` node before its timer fires must call this — an armed timer
    /// outliving the node that armed it is a leak and a correctness bug
    /// (it would deliver `DELAY` into a node that is no longer there).
    fn disarm(&mut self, owner: u8, domain: u8);
}
