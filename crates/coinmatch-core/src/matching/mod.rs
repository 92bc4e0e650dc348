//! Dual-channel similarity matching.
//!
//! Every cataloged coin is scored on both sides independently: query obverse
//! against stored obverse, query reverse against stored reverse. Candidates
//! are ranked by the weaker side, and a positive identification additionally
//! requires both sides to clear the match threshold on their own.

mod types;

pub use types::{CoinEmbeddingRecord, CoinId, MatchCandidate};

use rayon::prelude::*;
use tracing::debug;

use crate::config::MATCH_THRESHOLD;
use crate::error::MatchError;

/// Cosine similarity between two embeddings.
///
/// Since stored and query embeddings are L2-normalized this is their dot
/// product divided by the actual norms, which tolerates small drift from
/// unit length. Zero-norm operands score 0.0 instead of NaN so one
/// degenerate stored vector cannot poison a ranking.
///
/// # Errors
///
/// Returns `MatchError::DimensionMismatch` when the vectors differ in
/// length.
pub fn cosine_similarity(query: &[f32], stored: &[f32]) -> Result<f32, MatchError> {
    if query.len() != stored.len() {
        return Err(MatchError::DimensionMismatch {
            expected: query.len(),
            actual: stored.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut query_norm_sq = 0.0f32;
    let mut stored_norm_sq = 0.0f32;
    for (q, s) in query.iter().zip(stored.iter()) {
        dot += q * s;
        query_norm_sq += q * q;
        stored_norm_sq += s * s;
    }

    if query_norm_sq == 0.0 || stored_norm_sq == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (query_norm_sq.sqrt() * stored_norm_sq.sqrt()))
}

/// Scores every record against the query pair and returns the top
/// `top_count` candidates.
///
/// Ordering is by [`MatchCandidate::ranking_score`] descending; ties break
/// by ascending coin id so rankings are stable across runs. The whole
/// catalog is scored in parallel before the single sort.
///
/// # Errors
///
/// Fails on the first record whose embedding dimensions disagree with the
/// query; a mixed-dimension catalog indicates an encoder version mismatch.
pub fn rank(
    query_obverse: &[f32],
    query_reverse: &[f32],
    records: &[CoinEmbeddingRecord],
    top_count: usize,
) -> Result<Vec<MatchCandidate>, MatchError> {
    let mut candidates = records
        .par_iter()
        .map(|record| {
            Ok(MatchCandidate {
                coin_id: record.coin_id,
                obverse_similarity: cosine_similarity(query_obverse, &record.obverse)?,
                reverse_similarity: cosine_similarity(query_reverse, &record.reverse)?,
            })
        })
        .collect::<Result<Vec<_>, MatchError>>()?;

    candidates.sort_by(|a, b| {
        b.ranking_score()
            .partial_cmp(&a.ranking_score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.coin_id.cmp(&b.coin_id))
    });
    candidates.truncate(top_count);

    debug!(
        scored = records.len(),
        returned = candidates.len(),
        "Ranked catalog against query pair"
    );

    Ok(candidates)
}

/// Ranks the catalog and keeps only candidates where both sides clear
/// [`MATCH_THRESHOLD`] independently.
pub fn find_matches(
    query_obverse: &[f32],
    query_reverse: &[f32],
    records: &[CoinEmbeddingRecord],
    top_count: usize,
) -> Result<Vec<MatchCandidate>, MatchError> {
    let ranked = rank(query_obverse, query_reverse, records, top_count)?;
    let matches: Vec<_> = ranked.into_iter().filter(|c| c.is_match()).collect();

    debug!(
        matches = matches.len(),
        threshold = MATCH_THRESHOLD,
        "Applied dual-side match threshold"
    );

    Ok(matches)
}
