// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Deciding which directories are watched in monitor mode (`roots`).
//! - Wiring up one non-recursive `notify` watcher per root and turning every
//!   change notification into a `CoordinatorEvent::Triggered` (`watcher`).
//!
//! It does **not** know about runs; coalescing happens in the coordinator.

pub mod roots;
pub mod watcher;

pub use roots::resolve_watch_roots;
pub use watcher::{spawn_watchers, WatcherHandle};
