//! Embassy async tasks

pub mod frame;

pub use frame::{frame_task, Panel, Strip};
