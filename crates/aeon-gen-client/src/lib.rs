//! Client for the scene generation backend.
//!
//! This crate drives one batch of scenes through the remote backend:
//! - `launcher`: submits all planned scenes in a single request and
//!   normalizes the per-scene acknowledgements
//! - `poller`: polls outstanding jobs until every scene is terminal, the
//!   backend stalls, the attempt budget runs out or the caller cancels
//! - `catalog`: refreshes the model registry from the backend, falling back
//!   to the compiled-in catalog

pub mod backend;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod poller;
pub mod progress;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::GenerationBackend;
pub use catalog::load_registry;
pub use client::GenerationClient;
pub use config::{GenClientConfig, PollConfig};
pub use error::{GenError, GenResult, PollError, PollResult};
pub use launcher::{launch_scenes, normalize_launch_response};
pub use poller::{PollOutcome, PollState, SceneOutcome, StatusPoller};
pub use progress::{PollProgress, ProgressObserver, ProgressReceiver, ProgressSender};
