//! End-to-end pipeline scenarios against scripted mock collaborators:
//! enrollment confirmation, interruption resets, and frame release on every
//! exit path.

use std::sync::Arc;

use doorcam::enrollment::Enroller;
use doorcam::gallery::FaceGallery;
use doorcam::hardware::mock::{MemoryStore, MockAligner, MockCamera, MockDetector, MockEmbedder};
use doorcam::pipeline::{PipelineOutcome, RecognitionPipeline};

const CONFIRM_TIMES: u32 = 5;

struct Rig {
    camera: Arc<MockCamera>,
    detector: Arc<MockDetector>,
    aligner: Arc<MockAligner>,
    embedder: Arc<MockEmbedder>,
    pipeline: RecognitionPipeline,
}

async fn rig() -> Rig {
    rig_with_gallery(FaceGallery::load(Arc::new(MemoryStore::new()), 7, 0.9).await)
}

fn rig_with_gallery(gallery: FaceGallery) -> Rig {
    let camera = Arc::new(MockCamera::new(64, 64));
    let detector = Arc::new(MockDetector::new());
    let aligner = Arc::new(MockAligner::new());
    let embedder = Arc::new(MockEmbedder::new());
    let pipeline = RecognitionPipeline::new(
        camera.clone(),
        detector.clone(),
        aligner.clone(),
        embedder.clone(),
        gallery,
        Enroller::new(CONFIRM_TIMES, 0.9),
    );
    Rig {
        camera,
        detector,
        aligner,
        embedder,
        pipeline,
    }
}

fn axis(index: usize) -> Vec<f32> {
    let mut v = vec![0.0; 4];
    v[index] = 1.0;
    v
}

/// Queue one frame that carries a face embedding to the given vector.
async fn queue_face(rig: &Rig, embedding: Vec<f32>) {
    rig.detector.push_one_face(32, 32).await;
    rig.embedder.push_embedding(embedding).await;
}

#[tokio::test]
async fn five_consistent_sightings_enroll_then_recognize() {
    let mut r = rig().await;

    for seen in 1..=4 {
        queue_face(&r, axis(0)).await;
        assert_eq!(
            r.pipeline.process_next().await,
            PipelineOutcome::Unrecognized { observed: seen }
        );
    }

    queue_face(&r, axis(0)).await;
    assert_eq!(r.pipeline.process_next().await, PipelineOutcome::Enrolled(1));
    assert_eq!(r.pipeline.gallery().ids(), vec![1]);

    // the freshly enrolled face now matches
    queue_face(&r, axis(0)).await;
    assert_eq!(
        r.pipeline.process_next().await,
        PipelineOutcome::Recognized(1)
    );
}

#[tokio::test]
async fn recognized_face_interrupts_enrollment_in_progress() {
    let store = Arc::new(MemoryStore::new());
    let mut known_gallery = FaceGallery::load(store, 7, 0.9).await;
    let known = known_gallery.enroll(axis(0)).await;
    let mut r = rig_with_gallery(known_gallery);

    // counts 1, 2, 3 for the stranger
    for seen in 1..=3 {
        queue_face(&r, axis(1)).await;
        assert_eq!(
            r.pipeline.process_next().await,
            PipelineOutcome::Unrecognized { observed: seen }
        );
    }

    // a recognized face discards the candidate
    queue_face(&r, axis(0)).await;
    assert_eq!(
        r.pipeline.process_next().await,
        PipelineOutcome::Recognized(known)
    );

    // the stranger restarts at one; four more sightings are not enough
    for seen in 1..=4 {
        queue_face(&r, axis(1)).await;
        assert_eq!(
            r.pipeline.process_next().await,
            PipelineOutcome::Unrecognized { observed: seen }
        );
    }
    assert_eq!(r.pipeline.gallery().ids(), vec![known]);

    // the fifth consecutive sighting finally enrolls
    queue_face(&r, axis(1)).await;
    assert!(matches!(
        r.pipeline.process_next().await,
        PipelineOutcome::Enrolled(_)
    ));
}

#[tokio::test]
async fn empty_frame_resets_enrollment_progress() {
    let mut r = rig().await;

    for _ in 0..3 {
        queue_face(&r, axis(1)).await;
        r.pipeline.process_next().await;
    }

    // nobody in frame: detector reports no regions
    r.detector.push_faces(vec![]).await;
    assert_eq!(r.pipeline.process_next().await, PipelineOutcome::NoDetection);

    for seen in 1..=4 {
        queue_face(&r, axis(1)).await;
        assert_eq!(
            r.pipeline.process_next().await,
            PipelineOutcome::Unrecognized { observed: seen }
        );
    }
    assert!(r.pipeline.gallery().is_empty());
}

#[tokio::test]
async fn alignment_failure_preserves_enrollment_progress() {
    let mut r = rig().await;

    for _ in 0..3 {
        queue_face(&r, axis(1)).await;
        r.pipeline.process_next().await;
    }

    // a detected but unalignable face touches neither gallery nor candidate
    r.detector.push_one_face(32, 32).await;
    r.aligner.fail_next().await;
    assert_eq!(r.pipeline.process_next().await, PipelineOutcome::NotAligned);

    queue_face(&r, axis(1)).await;
    assert_eq!(
        r.pipeline.process_next().await,
        PipelineOutcome::Unrecognized { observed: 4 }
    );
}

#[tokio::test]
async fn capture_failure_resets_enrollment_progress() {
    let mut r = rig().await;

    for _ in 0..4 {
        queue_face(&r, axis(1)).await;
        r.pipeline.process_next().await;
    }

    r.camera.fail_next().await;
    assert_eq!(r.pipeline.process_next().await, PipelineOutcome::NoDetection);

    queue_face(&r, axis(1)).await;
    assert_eq!(
        r.pipeline.process_next().await,
        PipelineOutcome::Unrecognized { observed: 1 }
    );
}

#[tokio::test]
async fn frame_is_released_on_every_outcome() {
    let mut r = rig().await;

    // success path
    queue_face(&r, axis(0)).await;
    r.pipeline.process_next().await;
    assert_eq!(r.camera.in_flight(), 0);

    // detection-empty path
    r.detector.push_faces(vec![]).await;
    r.pipeline.process_next().await;
    assert_eq!(r.camera.in_flight(), 0);

    // alignment-failure path
    r.detector.push_one_face(32, 32).await;
    r.aligner.fail_next().await;
    r.pipeline.process_next().await;
    assert_eq!(r.camera.in_flight(), 0);

    // capture-failure path never leases a frame
    r.camera.fail_next().await;
    r.pipeline.process_next().await;
    assert_eq!(r.camera.in_flight(), 0);
}

#[tokio::test]
async fn only_the_first_detected_face_is_considered() {
    let store = Arc::new(MemoryStore::new());
    let mut gallery = FaceGallery::load(store, 7, 0.9).await;
    let known = gallery.enroll(axis(0)).await;
    let mut r = rig_with_gallery(gallery);

    // two faces in frame; the embedding queue holds only the first region's
    // embedding, which matches the enrolled identity
    r.detector
        .push_faces(vec![
            doorcam::hardware::FaceRegion {
                x: 0,
                y: 0,
                width: 32,
                height: 32,
            },
            doorcam::hardware::FaceRegion {
                x: 100,
                y: 0,
                width: 32,
                height: 32,
            },
        ])
        .await;
    r.embedder.push_embedding(axis(0)).await;
    assert_eq!(
        r.pipeline.process_next().await,
        PipelineOutcome::Recognized(known)
    );
}
