//! Face gallery store.
//!
//! A bounded, persisted collection of enrolled face embeddings. The gallery
//! is a ring: entries are append-only until capacity, after which the oldest
//! entry is evicted to admit a new one (FIFO; re-matching does not refresh
//! recency). Every mutation persists the full slot table so gallery state
//! survives power loss; persistence failures degrade (the in-memory state
//! stays authoritative until the next successful write) and are never fatal.
//!
//! Persisted layout, one record per slot index `0..capacity`:
//! `[id: u32 LE][dim: u32 LE][dim × f32 LE]`; a zero-length record marks the
//! slot unused.

use bytes::{Buf, BufMut, BytesMut};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::DoorcamError;
use crate::hardware::{FaceEmbedding, SlotStore};

/// Opaque handle to one enrolled identity, stable for the entry's lifetime.
pub type EntryId = u32;

/// One enrolled identity.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub id: EntryId,
    pub embedding: FaceEmbedding,
}

pub struct FaceGallery {
    entries: VecDeque<GalleryEntry>,
    capacity: usize,
    match_threshold: f32,
    next_id: EntryId,
    store: Arc<dyn SlotStore>,
}

impl FaceGallery {
    /// Load the gallery from durable storage.
    ///
    /// Fail-open: an unreadable or corrupt slot degrades to "unused" (worst
    /// case an empty gallery and nobody is recognized), never a startup
    /// failure.
    pub async fn load(store: Arc<dyn SlotStore>, capacity: usize, match_threshold: f32) -> Self {
        let mut entries = VecDeque::with_capacity(capacity);
        for slot in 0..capacity {
            match store.read(slot).await {
                Ok(Some(raw)) => match decode_slot(slot, &raw) {
                    Ok(Some(entry)) => entries.push_back(entry),
                    Ok(None) => {}
                    Err(e) => warn!(slot, error = %e, "ignoring corrupt gallery slot"),
                },
                Ok(None) => {}
                Err(e) => warn!(slot, error = %e, "gallery slot unreadable, treating as unused"),
            }
        }
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        info!(enrolled = entries.len(), capacity, "face gallery loaded");
        Self {
            entries,
            capacity,
            match_threshold,
            next_id,
            store,
        }
    }

    /// Enroll a new embedding, evicting the oldest entry at capacity.
    ///
    /// Always succeeds; the new entry's identifier is returned.
    pub async fn enroll(&mut self, embedding: FaceEmbedding) -> EntryId {
        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(entry = evicted.id, "gallery full, evicting oldest entry");
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(GalleryEntry { id, embedding });
        self.persist().await;
        id
    }

    /// Best gallery match for an embedding, if it clears the threshold.
    ///
    /// Deterministic and side-effect free; entries with a different embedding
    /// dimension never match.
    pub fn best_match(&self, embedding: &[f32]) -> Option<EntryId> {
        let mut best: Option<(EntryId, f32)> = None;
        for entry in &self.entries {
            let Some(score) = cosine_similarity(&entry.embedding, embedding) else {
                continue;
            };
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((entry.id, score)),
            }
        }
        best.filter(|(_, score)| *score >= self.match_threshold)
            .map(|(id, _)| id)
    }

    /// Remove every entry and persist the empty state (factory reset).
    pub async fn clear_all(&mut self) {
        let cleared = self.entries.len();
        self.entries.clear();
        self.persist().await;
        info!(cleared, "face gallery cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enrolled identifiers, oldest first.
    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Write the full slot table. Failures are logged and the in-memory
    /// state stays authoritative; the next successful persist rewrites every
    /// slot, so one good write repairs earlier misses.
    async fn persist(&self) {
        for slot in 0..self.capacity {
            let record = match self.entries.get(slot) {
                Some(entry) => encode_entry(entry),
                None => Vec::new(),
            };
            if let Err(e) = self.store.write(slot, &record).await {
                warn!(slot, error = %e, "gallery persist failed, keeping in-memory state");
            }
        }
    }
}

fn encode_entry(entry: &GalleryEntry) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(8 + entry.embedding.len() * 4);
    buf.put_u32_le(entry.id);
    buf.put_u32_le(entry.embedding.len() as u32);
    for value in &entry.embedding {
        buf.put_f32_le(*value);
    }
    buf.to_vec()
}

fn decode_slot(slot: usize, raw: &[u8]) -> Result<Option<GalleryEntry>, DoorcamError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut buf = raw;
    if buf.remaining() < 8 {
        return Err(DoorcamError::CorruptSlot {
            slot,
            reason: "record header truncated".to_string(),
        });
    }
    let id = buf.get_u32_le();
    let dim = buf.get_u32_le() as usize;
    if buf.remaining() != dim * 4 {
        return Err(DoorcamError::CorruptSlot {
            slot,
            reason: format!(
                "embedding length mismatch: header says {dim}, record holds {} bytes",
                buf.remaining()
            ),
        });
    }
    let mut embedding = Vec::with_capacity(dim);
    for _ in 0..dim {
        embedding.push(buf.get_f32_le());
    }
    Ok(Some(GalleryEntry { id, embedding }))
}

/// Cosine similarity; `None` for dimension mismatch or a zero-norm vector.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
