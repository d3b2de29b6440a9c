pub mod oven_controller;
pub mod oven_events;
pub mod oven_states;
pub mod oven_timer;
