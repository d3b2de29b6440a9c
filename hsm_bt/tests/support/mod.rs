//! Shared test-only timer double, used by the `Delay` node integration test.
//! Mirrors the tick-domain timer the `Delay` node's C ancestor tests stub out
//! with `am_timer_ctor`/`am_timer_tick` — here a single armed slot per
//! `(owner, domain)` is enough since none of the tests arm more than one.
use hsm_bt::event::Event;
use hsm_bt::timer::TimerService;

pub struct FakeTimer {
    armed: Option<(Event, u8, u32, u8)>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Decrement the armed timer's remaining ticks; returns the event to
    /// deliver once it reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        {
            let (_, _, ticks, _) = self.armed.as_mut()?;
            *ticks -= 1;
        }
        let remaining = self.armed.as_ref().unwrap().2;
        if remaining == 0 {
            Some(self.armed.take().unwrap().0)
        } else {
            None
        }
    }

    pub fn any_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl TimerService for FakeTimer {
    fn arm(&mut self, event: Event, owner: u8, ticks: u32, domain: u8) {
        self.armed = Some((event, owner, ticks, domain));
    }

    fn disarm(&mut self, owner: u8, domain: u8) {
        if matches!(self.armed, Some((_, o, _, d)) if o == owner && d == domain) {
            self.armed = None;
        }
    }
}
