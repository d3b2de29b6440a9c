//! User events the oven controller understands, translated to [`Event`]
//! at the edge the same way the teacher's `LightEvents` wraps its own
//! discriminants — everything past `dispatch` only ever sees reserved or
//! user ids, never this enum.
use hsm_bt::event::{Event, EVT_USER_BASE};

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum OvenEvent {
    Open,
    Close,
    TurnOn,
    TurnOff,
}

impl OvenEvent {
    pub fn into_event(self) -> Event {
        Event::new(EVT_USER_BASE + self as u16, 0)
    }
}
