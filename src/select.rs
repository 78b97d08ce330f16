//! Uniform random selection of one candidate.

use rand::Rng;

use crate::error::SelectionError;
use crate::models::CandidateItem;
use crate::traits::SourceAdapter;

/// A candidate paired with the adapter that can fetch it.
#[derive(Clone)]
pub struct Candidate<'a> {
    pub adapter: &'a dyn SourceAdapter,
    pub item: CandidateItem,
}

impl std::fmt::Debug for Candidate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("adapter", &self.adapter.name())
            .field("item", &self.item)
            .finish()
    }
}

/// Pick exactly one candidate, uniformly at random across all sources.
///
/// `sources` is only used to describe an empty pool in the error.
pub fn select<'a, R: Rng + ?Sized>(
    mut candidates: Vec<Candidate<'a>>,
    sources: usize,
    rng: &mut R,
) -> Result<Candidate<'a>, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError { sources });
    }
    let index = rng.gen_range(0..candidates.len());
    Ok(candidates.swap_remove(index))
}
