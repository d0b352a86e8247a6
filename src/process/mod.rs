//! # Process model and the spawner seam.
//!
//! This module provides the process-related types:
//! - [`ProcessConfig`], [`ProcessMap`], [`Stdio`] - how a child is launched
//! - [`ProcessState`], [`ProcessInfo`], [`ExitInfo`] - lifecycle state and the read-only view
//! - [`Spawner`], [`ChildHandle`], [`ChildControl`], [`StopSignal`] - the external collaborator
//!   that actually creates OS processes
//! - [`TokioSpawner`] - the default spawner built on `tokio::process`

mod config;
mod spawner;
mod state;
mod tokio_spawner;

pub use config::{ProcessConfig, ProcessMap, Stdio};
pub use spawner::{ByteStream, ChildControl, ChildHandle, Spawner, StopSignal};
pub use state::{ExitInfo, ProcessInfo, ProcessState};
pub use tokio_spawner::TokioSpawner;
