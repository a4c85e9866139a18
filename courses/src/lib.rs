#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug, clippy::todo)]

//! Access control and progress tracking for a Course → Section → Room tree.

pub use crate::{
    error::{Error, Result},
    progress::Progress,
    service::{Courses, Overview, TaskProgress},
    store::{DatabaseStore, MemoryStore, Store, StoreError, StoreResult, TaskCounts},
};

pub mod access;
pub mod model;
pub mod progress;
pub mod store;
pub mod visibility;

mod error;
mod service;
