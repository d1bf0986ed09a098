//! Winner selection among scored candidates
//!
//! The winner is the first candidate with the highest score. Every candidate
//! scoring within the near-tie ratio of the winner joins the contributing set,
//! whose genre tags are pooled so that near-identical records reinforce a
//! consensus genre.

use crate::types::ScoredCandidate;
use tracing::debug;

/// Winner plus the candidates whose genres are pooled
#[derive(Debug, Clone)]
pub struct Selection<R> {
    pub winner: ScoredCandidate<R>,
    /// Candidates with `score >= winner.score * near_tie_ratio`, in search
    /// order. Always contains the winner.
    pub contributing: Vec<ScoredCandidate<R>>,
}

/// Picks the winning candidate and its near ties
#[derive(Debug, Clone)]
pub struct MatchSelector {
    near_tie_ratio: f64,
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl MatchSelector {
    pub fn new(near_tie_ratio: f64) -> Self {
        Self { near_tie_ratio }
    }

    /// Select the best candidate
    ///
    /// Returns `None` when the list is empty or every score is zero. Equal
    /// scores are broken by search order: the first maximal element wins.
    pub fn select_best<R: Clone>(&self, scored: &[ScoredCandidate<R>]) -> Option<Selection<R>> {
        let mut winner: Option<&ScoredCandidate<R>> = None;
        for candidate in scored {
            if candidate.score > winner.map_or(0.0, |w| w.score) {
                winner = Some(candidate);
            }
        }

        let winner = winner?;
        let threshold = winner.score * self.near_tie_ratio;
        let contributing: Vec<ScoredCandidate<R>> = scored
            .iter()
            .filter(|c| c.score >= threshold)
            .cloned()
            .collect();

        debug!(
            winner = %winner.candidate.source_url,
            score = winner.score,
            threshold,
            contributing = contributing.len(),
            "Selected best candidate"
        );

        Some(Selection {
            winner: winner.clone(),
            contributing,
        })
    }
}
