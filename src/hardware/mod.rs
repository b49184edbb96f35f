//! Hardware collaborator boundary.
//!
//! The controller never talks to a sensor, a recognition engine, or a broker
//! directly: every external dependency sits behind a capability trait defined
//! in [`capabilities`], and [`mock`] provides simulated implementations for
//! tests and hardware-free runs.

pub mod capabilities;
pub mod mock;

pub use capabilities::{
    DeviceControl, FaceAligner, FaceDetector, FaceEmbedder, FrameSource, LinkLayer, LinkStatus,
    ServiceEvent, SessionClient, SessionOptions, SlotStore,
};

use std::any::Any;
use std::fmt;

/// Fixed-size numeric vector representing a face's identity signature.
pub type FaceEmbedding = Vec<f32>;

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb888,
    Grayscale8,
    Jpeg,
}

/// One captured image, owned exclusively by the capture/match task for the
/// duration of a single pipeline pass.
///
/// Release is by ownership: dropping the frame releases the buffer exactly
/// once, on every exit path. A driver may attach a reclaim token whose `Drop`
/// returns the underlying buffer to the hardware (the mock camera uses this
/// to count in-flight frames).
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    reclaim: Option<Box<dyn Any + Send + Sync>>,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
            reclaim: None,
        }
    }

    /// Attach a driver-owned token dropped together with the frame.
    pub fn with_reclaim(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
        token: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            data,
            reclaim: Some(token),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .field("reclaim", &self.reclaim.is_some())
            .finish()
    }
}

/// One candidate face location reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A face crop normalized by the aligner, ready for embedding.
#[derive(Debug, Clone)]
pub struct AlignedFace {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}
