//! Enrollment state machine.
//!
//! Accumulates repeated detections of an unseen face into a confirmed new
//! gallery entry: `Idle → Observing(candidate, count) → Confirmed`. Exactly
//! one candidate is tracked at a time and any interruption (a recognized
//! face, an empty frame) discards it; only consecutive consistent
//! observations count, so no partial credit survives a gap.
//! The most recent unmatched face always wins: a dissimilar observation
//! replaces the candidate rather than being queued.

use tracing::debug;

use crate::gallery::cosine_similarity;
use crate::hardware::FaceEmbedding;

/// Result of feeding one observation to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentProgress {
    /// No candidate is being observed.
    Idle,
    /// A candidate has been seen `seen` consecutive times.
    Observing { seen: u32 },
    /// The candidate reached the confirmation threshold; the carried
    /// embedding is ready to enroll. The machine has reset to idle.
    Confirmed(FaceEmbedding),
}

enum State {
    Idle,
    Observing { candidate: FaceEmbedding, seen: u32 },
}

pub struct Enroller {
    confirm_times: u32,
    tolerance: f32,
    state: State,
}

impl Enroller {
    pub fn new(confirm_times: u32, tolerance: f32) -> Self {
        Self {
            confirm_times,
            tolerance,
            state: State::Idle,
        }
    }

    /// Feed an embedding that did not match any gallery entry.
    pub fn observe_unmatched(&mut self, embedding: &[f32]) -> EnrollmentProgress {
        let seen = match &self.state {
            State::Idle => 1,
            State::Observing { candidate, seen } => {
                let continuous = cosine_similarity(candidate, embedding)
                    .is_some_and(|score| score >= self.tolerance);
                if continuous {
                    seen + 1
                } else {
                    // a different unknown face takes over as the candidate
                    debug!("candidate replaced by a dissimilar unmatched face");
                    1
                }
            }
        };

        if seen >= self.confirm_times {
            let candidate = match std::mem::replace(&mut self.state, State::Idle) {
                State::Observing { candidate, .. } if seen > 1 => candidate,
                // confirm_times <= 1 confirms on the first sighting
                _ => embedding.to_vec(),
            };
            return EnrollmentProgress::Confirmed(candidate);
        }

        let candidate = match std::mem::replace(&mut self.state, State::Idle) {
            State::Observing { candidate, .. } if seen > 1 => candidate,
            _ => embedding.to_vec(),
        };
        self.state = State::Observing { candidate, seen };
        EnrollmentProgress::Observing { seen }
    }

    /// A recognized face or an empty frame interrupts any observation.
    pub fn interrupt(&mut self) {
        if matches!(self.state, State::Observing { .. }) {
            debug!("enrollment candidate discarded");
        }
        self.state = State::Idle;
    }

    /// Consecutive observations of the current candidate.
    pub fn observed(&self) -> u32 {
        match &self.state {
            State::Idle => 0,
            State::Observing { seen, .. } => *seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f32; 4] = [1.0, 0.0, 0.0, 0.0];
    const B: [f32; 4] = [0.0, 1.0, 0.0, 0.0];

    fn enroller() -> Enroller {
        Enroller::new(5, 0.9)
    }

    #[test]
    fn five_consecutive_observations_confirm() {
        let mut e = enroller();
        for seen in 1..=4 {
            assert_eq!(
                e.observe_unmatched(&A),
                EnrollmentProgress::Observing { seen }
            );
        }
        assert_eq!(e.observe_unmatched(&A), EnrollmentProgress::Confirmed(A.to_vec()));
        assert_eq!(e.observed(), 0);
    }

    #[test]
    fn interruption_resets_the_counter() {
        let mut e = enroller();
        for _ in 0..3 {
            e.observe_unmatched(&A);
        }
        assert_eq!(e.observed(), 3);

        e.interrupt();
        assert_eq!(e.observed(), 0);

        // progress restarts from one; no enrollment before a fresh threshold
        assert_eq!(
            e.observe_unmatched(&A),
            EnrollmentProgress::Observing { seen: 1 }
        );
    }

    #[test]
    fn dissimilar_face_replaces_the_candidate() {
        let mut e = enroller();
        for _ in 0..4 {
            e.observe_unmatched(&A);
        }
        // one observation short of confirming, a different face shows up
        assert_eq!(
            e.observe_unmatched(&B),
            EnrollmentProgress::Observing { seen: 1 }
        );

        // and it is B, not A, that progresses to confirmation
        for seen in 2..=4 {
            assert_eq!(
                e.observe_unmatched(&B),
                EnrollmentProgress::Observing { seen }
            );
        }
        assert_eq!(e.observe_unmatched(&B), EnrollmentProgress::Confirmed(B.to_vec()));
    }

    #[test]
    fn confirmed_embedding_is_the_first_observation() {
        let mut e = Enroller::new(3, 0.5);
        let first = [1.0, 0.1, 0.0, 0.0];
        let drift = [1.0, 0.2, 0.0, 0.0];
        e.observe_unmatched(&first);
        e.observe_unmatched(&drift);
        assert_eq!(
            e.observe_unmatched(&drift),
            EnrollmentProgress::Confirmed(first.to_vec())
        );
    }

    #[test]
    fn threshold_of_one_confirms_immediately() {
        let mut e = Enroller::new(1, 0.9);
        assert_eq!(e.observe_unmatched(&A), EnrollmentProgress::Confirmed(A.to_vec()));
    }

    #[test]
    fn dimension_mismatch_counts_as_dissimilar() {
        let mut e = enroller();
        e.observe_unmatched(&A);
        assert_eq!(
            e.observe_unmatched(&[1.0, 0.0]),
            EnrollmentProgress::Observing { seen: 1 }
        );
    }
}
