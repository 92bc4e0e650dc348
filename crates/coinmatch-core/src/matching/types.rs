//! Types for the similarity matcher.

use serde::{Deserialize, Serialize};

use crate::config::MATCH_THRESHOLD;
use crate::error::MatchError;

/// Identifier of a cataloged coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinId(pub i64);

impl std::fmt::Display for CoinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cataloged coin's stored embeddings, one per side.
///
/// Both vectors come from the same encoder as query embeddings; the matcher
/// rejects records whose dimensions disagree with the query rather than
/// silently comparing truncated vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinEmbeddingRecord {
    pub coin_id: CoinId,
    /// Heads-side embedding
    pub obverse: Vec<f32>,
    /// Tails-side embedding
    pub reverse: Vec<f32>,
}

impl CoinEmbeddingRecord {
    pub fn new(coin_id: CoinId, obverse: Vec<f32>, reverse: Vec<f32>) -> Self {
        Self {
            coin_id,
            obverse,
            reverse,
        }
    }

    /// Serializes both sides as standalone JSON arrays, matching the
    /// per-column storage format of the catalog database.
    pub fn to_json_parts(&self) -> Result<(String, String), MatchError> {
        let encode = |side: &Vec<f32>| {
            serde_json::to_string(side).map_err(|e| MatchError::InvalidRecord {
                coin_id: self.coin_id.0,
                reason: e.to_string(),
            })
        };
        Ok((encode(&self.obverse)?, encode(&self.reverse)?))
    }

    /// Rebuilds a record from the two stored JSON array columns.
    pub fn from_json_parts(
        coin_id: CoinId,
        obverse_json: &str,
        reverse_json: &str,
    ) -> Result<Self, MatchError> {
        let decode = |json: &str| {
            serde_json::from_str::<Vec<f32>>(json).map_err(|e| MatchError::InvalidRecord {
                coin_id: coin_id.0,
                reason: e.to_string(),
            })
        };
        Ok(Self {
            coin_id,
            obverse: decode(obverse_json)?,
            reverse: decode(reverse_json)?,
        })
    }
}

/// One coin scored against a query image pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub coin_id: CoinId,
    pub obverse_similarity: f32,
    pub reverse_similarity: f32,
}

impl MatchCandidate {
    /// Ranking score: the weaker of the two sides.
    ///
    /// Using the minimum keeps a coin from ranking high on one
    /// photogenic side while the other side barely resembles the query.
    pub fn ranking_score(&self) -> f32 {
        self.obverse_similarity.min(self.reverse_similarity)
    }

    /// Whether both sides independently clear the match threshold.
    /// The comparison is strict; a similarity exactly at the threshold
    /// does not qualify.
    pub fn is_match(&self) -> bool {
        let threshold = MATCH_THRESHOLD as f32;
        self.obverse_similarity > threshold && self.reverse_similarity > threshold
    }
}
