//! Browser lifetimes
//!
//! Event listeners and the animation-frame loop as owned values: dropping
//! them deregisters the callback, so tearing down the game is just dropping
//! its handles.

pub mod frame_loop;
pub mod listener;

pub use frame_loop::FrameLoop;
pub use listener::EventListener;
