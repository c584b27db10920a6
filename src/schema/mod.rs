//! gaze.fixation.v1 input schema
//!
//! This module defines the raw rows supplied by the data-loading collaborator
//! (fixations and task events) along with the adapters that parse them.

mod adapter;
mod fixation_record;
mod task_event;

pub use adapter::*;
pub use fixation_record::*;
pub use task_event::*;
