//! Atomic Hardware Capabilities
//!
//! Fine-grained capability traits for every external collaborator the
//! controller consumes. Implementations wrap real drivers (camera sensor,
//! recognition engine, flash, WiFi, broker client); the mocks in
//! [`super::mock`] implement the same contracts in memory.
//!
//! Each capability trait:
//! - Is async (uses `#[async_trait]`)
//! - Is thread-safe (requires `Send + Sync`)
//! - Uses `anyhow::Result` for errors
//! - Focuses on ONE thing
//!
//! Errors returned here are always treated as transient by the callers:
//! a failed capture or a refused session aborts one iteration, never the
//! process.

use anyhow::Result;
use async_trait::async_trait;

use super::{AlignedFace, FaceEmbedding, FaceRegion, Frame};

/// Capability: frame acquisition.
///
/// # Contract
/// - Ownership of the returned [`Frame`] transfers to the caller, who
///   releases it by dropping it.
/// - `capture` may block up to the driver's own bounded hardware timeout.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Frame>;
}

/// Capability: face detection.
///
/// Returns zero or more candidate face regions; an empty result is the
/// normal "nobody in frame" case, not an error.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<FaceRegion>>;
}

/// Capability: face alignment.
///
/// `Ok(None)` means the region could not be normalized (pose too extreme,
/// landmarks missing), a recoverable per-frame outcome. `Err` is reserved
/// for engine faults.
#[async_trait]
pub trait FaceAligner: Send + Sync {
    async fn align(&self, frame: &Frame, region: &FaceRegion) -> Result<Option<AlignedFace>>;
}

/// Capability: embedding extraction from an aligned face crop.
#[async_trait]
pub trait FaceEmbedder: Send + Sync {
    async fn embed(&self, face: &AlignedFace) -> Result<FaceEmbedding>;
}

/// Capability: durable byte-level slot storage.
///
/// # Contract
/// - `read` of a never-written slot yields `Ok(None)`.
/// - An empty record marks the slot unused; callers encode "erase" as a
///   zero-length write.
/// - No retry policy here; callers decide how to degrade.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn read(&self, slot: usize) -> Result<Option<Vec<u8>>>;
    async fn write(&self, slot: usize, bytes: &[u8]) -> Result<()>;
}

/// Reported state of the physical network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    Down,
}

/// Capability: physical link lifecycle.
///
/// The driver owns reconnection of the link itself (the controller only
/// calls `connect` once at startup and then observes `status`).
#[async_trait]
pub trait LinkLayer: Send + Sync {
    async fn status(&self) -> LinkStatus;
    async fn connect(&self) -> Result<()>;
}

/// Parameters for one session establishment attempt.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the broker publishes on the device's behalf if it disappears
    /// without a clean disconnect.
    pub last_will_topic: String,
    pub last_will_payload: Vec<u8>,
    pub last_will_retained: bool,
}

/// Capability: publish/subscribe session over the link.
///
/// Inbound traffic is not a callback on this trait: subscribed messages and
/// update lifecycle notifications arrive as [`ServiceEvent`]s on the services
/// task's single inbound queue, keeping that task single-threaded.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Attempt the handshake. `Ok(false)` means the broker refused the
    /// session, a rate-limited retry case rather than a fault.
    async fn connect(&self, options: &SessionOptions) -> Result<bool>;
    async fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<()>;
    async fn subscribe(&self, topic: &str) -> Result<()>;
    fn is_connected(&self) -> bool;
}

/// One inbound notification consumed synchronously by the services loop.
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// A message delivered on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// The update collaborator began a firmware transfer.
    UpdateStarted,
    /// The transfer completed; the device must restart into the new image.
    UpdateEnded,
    /// The transfer failed with a collaborator-defined code.
    UpdateFailed(u32),
}

/// Capability: whole-device restart.
///
/// The universal fatal-recovery mechanism. Must be idempotent and safe to
/// call from either task; there is no graceful cancellation beyond what is
/// synchronous before the call.
pub trait DeviceControl: Send + Sync {
    fn restart(&self);
}
