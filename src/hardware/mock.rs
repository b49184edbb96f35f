//! Mock Hardware Implementations
//!
//! Simulated collaborators for testing without physical hardware. Every
//! capability trait has a scriptable mock: tests queue the exact responses a
//! scenario needs and inspect what the controller did afterwards.
//!
//! # Available Mocks
//!
//! - `MockCamera` - scripted captures with in-flight frame lease counting
//! - `MockDetector` / `MockAligner` / `MockEmbedder` - scripted pipeline stages
//! - `MemoryStore` - in-memory slot store with write-failure injection
//! - `MockLink` - switchable link status
//! - `MockSession` - recording pub/sub client with inbound delivery
//! - `RestartRecorder` - counts restart requests instead of exiting

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::capabilities::{
    DeviceControl, FaceAligner, FaceDetector, FaceEmbedder, FrameSource, LinkLayer, LinkStatus,
    ServiceEvent, SessionClient, SessionOptions, SlotStore,
};
use super::{AlignedFace, FaceEmbedding, FaceRegion, Frame, PixelFormat};

// =============================================================================
// MockCamera - Scripted Frame Source
// =============================================================================

enum CaptureStep {
    Produce(Vec<u8>),
    Fail,
}

/// Mock camera with scripted captures and frame lease tracking.
///
/// Every produced frame carries a reclaim token; `in_flight()` reports how
/// many frames have been captured but not yet dropped, which is how the tests
/// prove the pipeline releases every buffer on every exit path.
pub struct MockCamera {
    width: u32,
    height: u32,
    script: Mutex<VecDeque<CaptureStep>>,
    leases: Arc<AtomicUsize>,
}

struct FrameLease(Arc<AtomicUsize>);

impl Drop for FrameLease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            script: Mutex::new(VecDeque::new()),
            leases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a frame with the given pixel content.
    pub async fn push_frame(&self, data: Vec<u8>) {
        self.script.lock().await.push_back(CaptureStep::Produce(data));
    }

    /// Queue a capture failure.
    pub async fn fail_next(&self) {
        self.script.lock().await.push_back(CaptureStep::Fail);
    }

    /// Frames captured and not yet released.
    pub fn in_flight(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    fn lease_frame(&self, data: Vec<u8>) -> Frame {
        self.leases.fetch_add(1, Ordering::SeqCst);
        Frame::with_reclaim(
            self.width,
            self.height,
            PixelFormat::Rgb888,
            data,
            Box::new(FrameLease(Arc::clone(&self.leases))),
        )
    }

    fn noise_frame(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let len = (self.width * self.height * 3) as usize;
        (0..len).map(|_| rng.gen()).collect()
    }
}

#[async_trait]
impl FrameSource for MockCamera {
    async fn capture(&self) -> Result<Frame> {
        let step = self.script.lock().await.pop_front();
        match step {
            Some(CaptureStep::Fail) => Err(anyhow!("simulated capture failure")),
            Some(CaptureStep::Produce(data)) => Ok(self.lease_frame(data)),
            // Unscripted captures synthesize sensor noise.
            None => {
                let data = self.noise_frame();
                Ok(self.lease_frame(data))
            }
        }
    }
}

// =============================================================================
// MockDetector / MockAligner / MockEmbedder - Scripted Pipeline Stages
// =============================================================================

/// Scripted detector; an exhausted script reports an empty frame.
pub struct MockDetector {
    script: Mutex<VecDeque<Vec<FaceRegion>>>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push_faces(&self, regions: Vec<FaceRegion>) {
        self.script.lock().await.push_back(regions);
    }

    /// Queue a single centered face of the given size.
    pub async fn push_one_face(&self, width: u32, height: u32) {
        self.push_faces(vec![FaceRegion {
            x: 0,
            y: 0,
            width,
            height,
        }])
        .await;
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceDetector for MockDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<FaceRegion>> {
        Ok(self.script.lock().await.pop_front().unwrap_or_default())
    }
}

/// Scripted aligner; an exhausted script aligns every region.
pub struct MockAligner {
    fail_script: Mutex<VecDeque<bool>>,
}

impl MockAligner {
    pub fn new() -> Self {
        Self {
            fail_script: Mutex::new(VecDeque::new()),
        }
    }

    /// The next alignment reports "face not aligned".
    pub async fn fail_next(&self) {
        self.fail_script.lock().await.push_back(true);
    }
}

impl Default for MockAligner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceAligner for MockAligner {
    async fn align(&self, frame: &Frame, region: &FaceRegion) -> Result<Option<AlignedFace>> {
        if self.fail_script.lock().await.pop_front().unwrap_or(false) {
            return Ok(None);
        }
        let len = (region.width * region.height * 3) as usize;
        let data = frame.data.iter().copied().take(len).collect();
        Ok(Some(AlignedFace {
            width: region.width,
            height: region.height,
            data,
        }))
    }
}

/// Scripted embedder; an exhausted script derives a deterministic embedding
/// from the crop content so unscripted runs still behave consistently.
pub struct MockEmbedder {
    script: Mutex<VecDeque<FaceEmbedding>>,
}

impl MockEmbedder {
    pub const DERIVED_DIM: usize = 8;

    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push_embedding(&self, embedding: FaceEmbedding) {
        self.script.lock().await.push_back(embedding);
    }

    fn derive(face: &AlignedFace) -> FaceEmbedding {
        let mut embedding = vec![0.0f32; Self::DERIVED_DIM];
        for (i, byte) in face.data.iter().enumerate() {
            embedding[i % Self::DERIVED_DIM] += f32::from(*byte);
        }
        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceEmbedder for MockEmbedder {
    async fn embed(&self, face: &AlignedFace) -> Result<FaceEmbedding> {
        match self.script.lock().await.pop_front() {
            Some(embedding) => Ok(embedding),
            None => Ok(Self::derive(face)),
        }
    }
}

// =============================================================================
// MemoryStore - In-Memory Slot Store
// =============================================================================

/// In-memory slot store with injectable write failure.
pub struct MemoryStore {
    slots: RwLock<HashMap<usize, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// All subsequent writes fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Directly seed a slot, bypassing the failure switch (for corruption
    /// scenarios).
    pub async fn seed(&self, slot: usize, bytes: Vec<u8>) {
        self.slots.write().await.insert(slot, bytes);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn read(&self, slot: usize) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.read().await.get(&slot).cloned())
    }

    async fn write(&self, slot: usize, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated storage write failure"));
        }
        self.slots.write().await.insert(slot, bytes.to_vec());
        Ok(())
    }
}

// =============================================================================
// MockLink - Switchable Link Layer
// =============================================================================

/// Link layer whose status tests flip at will.
pub struct MockLink {
    up: AtomicBool,
    connect_calls: AtomicUsize,
}

impl MockLink {
    pub fn new(up: bool) -> Self {
        Self {
            up: AtomicBool::new(up),
            connect_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkLayer for MockLink {
    async fn status(&self) -> LinkStatus {
        if self.up.load(Ordering::SeqCst) {
            LinkStatus::Up
        } else {
            LinkStatus::Down
        }
    }

    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// MockSession - Recording Pub/Sub Client
// =============================================================================

/// One recorded publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retained: bool,
}

/// Pub/sub client that records connects, publishes, and subscriptions, and
/// can deliver inbound messages into the services task's event queue.
pub struct MockSession {
    accept: AtomicBool,
    connected: AtomicBool,
    connects: Mutex<Vec<SessionOptions>>,
    publishes: Mutex<Vec<PublishRecord>>,
    subscriptions: Mutex<Vec<String>>,
    events: Option<mpsc::Sender<ServiceEvent>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            accept: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            connects: Mutex::new(Vec::new()),
            publishes: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            events: None,
        }
    }

    /// A session that forwards delivered messages into an event queue.
    pub fn with_events(events: mpsc::Sender<ServiceEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    /// Refuse (or accept) subsequent handshakes.
    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Simulate a broker-side disconnect.
    pub fn drop_session(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub async fn connect_attempts(&self) -> usize {
        self.connects.lock().await.len()
    }

    pub async fn last_connect(&self) -> Option<SessionOptions> {
        self.connects.lock().await.last().cloned()
    }

    pub async fn publishes(&self) -> Vec<PublishRecord> {
        self.publishes.lock().await.clone()
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().await.clone()
    }

    /// Deliver an inbound message as the broker would: only if the device
    /// subscribed to the topic and an event queue is attached.
    pub async fn deliver(&self, topic: &str, payload: &[u8]) {
        let subscribed = self
            .subscriptions
            .lock()
            .await
            .iter()
            .any(|t| t == topic);
        if !subscribed {
            return;
        }
        if let Some(events) = &self.events {
            let _ = events
                .send(ServiceEvent::Message {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                })
                .await;
        }
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionClient for MockSession {
    async fn connect(&self, options: &SessionOptions) -> Result<bool> {
        self.connects.lock().await.push(options.clone());
        if self.accept.load(Ordering::SeqCst) {
            self.connected.store(true, Ordering::SeqCst);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<()> {
        if !self.is_connected() {
            return Err(anyhow!("publish while disconnected"));
        }
        self.publishes.lock().await.push(PublishRecord {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retained,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(anyhow!("subscribe while disconnected"));
        }
        self.subscriptions.lock().await.push(topic.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// =============================================================================
// RestartRecorder - Device Control Probe
// =============================================================================

/// Records restart requests instead of terminating anything.
pub struct RestartRecorder {
    restarts: AtomicUsize,
}

impl RestartRecorder {
    pub fn new() -> Self {
        Self {
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl Default for RestartRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceControl for RestartRecorder {
    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }
}
