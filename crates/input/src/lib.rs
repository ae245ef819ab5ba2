//! Pointer input mapped to camera actions, and the orbit control that consumes them.
//!
//! # Invariants
//! - Window backends produce `Action`s; the orbit control never sees raw events.
//! - `OrbitControl::update` is called once per frame, before render.

pub mod action;
pub mod orbit;

pub use action::Action;
pub use orbit::OrbitControl;
