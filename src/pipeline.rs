//! Face matching pipeline.
//!
//! One pass per invocation: capture → detect → align → embed → match. Every
//! failure along the way is transient: the pass reports a non-fatal outcome
//! and the next iteration proceeds unaffected. The captured frame is owned by
//! the pass and dropped on every exit path; a leaked frame buffer exhausts
//! device memory within seconds, so release is enforced by ownership.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::enrollment::{Enroller, EnrollmentProgress};
use crate::gallery::{EntryId, FaceGallery};
use crate::hardware::{FaceAligner, FaceDetector, FaceEmbedder, FrameSource};

/// Outcome of one pipeline pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Capture failed or no face was in frame.
    NoDetection,
    /// A face was detected but could not be normalized; gallery and
    /// enrollment state are untouched.
    NotAligned,
    /// An unknown face; enrollment observation count so far.
    Unrecognized { observed: u32 },
    /// The face matched an enrolled entry.
    Recognized(EntryId),
    /// An unknown face completed enrollment this pass.
    Enrolled(EntryId),
}

impl PipelineOutcome {
    /// The externally observable "open the door" signal.
    pub fn recognized(&self) -> bool {
        matches!(self, Self::Recognized(_))
    }
}

pub struct RecognitionPipeline {
    camera: Arc<dyn FrameSource>,
    detector: Arc<dyn FaceDetector>,
    aligner: Arc<dyn FaceAligner>,
    embedder: Arc<dyn FaceEmbedder>,
    gallery: FaceGallery,
    enroller: Enroller,
}

impl RecognitionPipeline {
    pub fn new(
        camera: Arc<dyn FrameSource>,
        detector: Arc<dyn FaceDetector>,
        aligner: Arc<dyn FaceAligner>,
        embedder: Arc<dyn FaceEmbedder>,
        gallery: FaceGallery,
        enroller: Enroller,
    ) -> Self {
        Self {
            camera,
            detector,
            aligner,
            embedder,
            gallery,
            enroller,
        }
    }

    pub fn gallery(&self) -> &FaceGallery {
        &self.gallery
    }

    /// Run one full pass. Never fails; every error degrades to an outcome.
    pub async fn process_next(&mut self) -> PipelineOutcome {
        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "camera capture failed");
                self.enroller.interrupt();
                return PipelineOutcome::NoDetection;
            }
        };

        let regions = match self.detector.detect(&frame).await {
            Ok(regions) => regions,
            Err(e) => {
                warn!(error = %e, "face detection failed");
                self.enroller.interrupt();
                return PipelineOutcome::NoDetection;
            }
        };

        // The first detected region is authoritative; multiple faces in
        // frame are not ranked.
        let Some(region) = regions.first().copied() else {
            self.enroller.interrupt();
            return PipelineOutcome::NoDetection;
        };

        let aligned = match self.aligner.align(&frame, &region).await {
            Ok(Some(aligned)) => aligned,
            Ok(None) => {
                debug!("face not aligned");
                return PipelineOutcome::NotAligned;
            }
            Err(e) => {
                warn!(error = %e, "face alignment failed");
                return PipelineOutcome::NotAligned;
            }
        };

        // The raw frame is no longer needed once the crop exists.
        drop(frame);

        let embedding = match self.embedder.embed(&aligned).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "embedding extraction failed");
                return PipelineOutcome::NotAligned;
            }
        };

        if let Some(id) = self.gallery.best_match(&embedding) {
            self.enroller.interrupt();
            info!(entry = id, "face recognized");
            return PipelineOutcome::Recognized(id);
        }

        match self.enroller.observe_unmatched(&embedding) {
            EnrollmentProgress::Confirmed(candidate) => {
                let id = self.gallery.enroll(candidate).await;
                info!(entry = id, "new face enrolled");
                PipelineOutcome::Enrolled(id)
            }
            EnrollmentProgress::Observing { seen } => {
                debug!(seen, "unrecognized face observed");
                PipelineOutcome::Unrecognized { observed: seen }
            }
            EnrollmentProgress::Idle => PipelineOutcome::Unrecognized { observed: 0 },
        }
    }
}
