//! # Doorcam Core Library
//!
//! This crate is the controller core for a face-recognizing doorbell camera.
//! It combines two independently scheduled control loops that must never block
//! one another:
//!
//! - the **capture/match task** drives the face pipeline (capture → detect →
//!   align → embed → match) against a bounded, persisted gallery of enrolled
//!   embeddings, and promotes repeatedly observed unknown faces into new
//!   gallery entries;
//! - the **services task** owns the connectivity lifecycle (link layer,
//!   publish/subscribe session, remote restart commands) plus the watchdog
//!   that hard-restarts the device if the link stays down too long.
//!
//! The tasks share no mutable state; the only cross-task coupling is the
//! process-wide restart action, which is idempotent and terminal.
//!
//! ## Crate Structure
//!
//! - **`config`**: `Settings` loaded from TOML over serde defaults.
//! - **`error`**: the crate error enum and `AppResult` alias.
//! - **`hardware`**: collaborator capability traits (camera, detector,
//!   aligner, embedder, durable storage, link, session, device control) and
//!   their mock implementations for tests and simulated runs.
//! - **`gallery`**: the bounded, persisted face gallery (FIFO eviction).
//! - **`enrollment`**: the single-candidate enrollment state machine.
//! - **`pipeline`**: the per-frame matching pipeline.
//! - **`network`**: connection state machine, reconnect policy, and watchdog.
//! - **`storage`**: file-backed slot store for gallery persistence.
//! - **`tasks`**: the two long-running task loops.

pub mod config;
pub mod enrollment;
pub mod error;
pub mod gallery;
pub mod hardware;
pub mod logging;
pub mod network;
pub mod pipeline;
pub mod storage;
pub mod tasks;

pub use error::{AppResult, DoorcamError};
