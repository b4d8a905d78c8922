//! State module for tracking scrape progress
//!
//! `WalkState` is the state machine the page walker steps through for every
//! listing page it processes.

mod walk_state;

pub use walk_state::WalkState;
