//! Folder voting over nearest neighbors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::triage::SimilarEmail;

/// Weight multiplier for neighbors whose folder came from a user correction.
pub const CORRECTION_WEIGHT: f32 = 2.0;

/// Folder suggested by neighbor voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSuggestion {
    pub folder: String,
    /// Share of the total vote won by `folder`, in `[0, 1]` for non-negative
    /// similarities.
    pub confidence: f32,
}

/// Picks a folder by similarity-weighted vote among `neighbors`.
///
/// Each neighbor votes for its folder with its similarity, doubled when it was
/// a correction. The folder with the most weight wins; exact ties go to the
/// lexicographically smallest folder name. Returns `None` for no neighbors.
pub fn calculate_confidence(neighbors: &[SimilarEmail]) -> Option<FolderSuggestion> {
    if neighbors.is_empty() {
        return None;
    }

    let mut folder_weights: BTreeMap<&str, f32> = BTreeMap::new();
    let mut total_weight = 0.0f32;

    for neighbor in neighbors {
        let multiplier = if neighbor.was_correction {
            CORRECTION_WEIGHT
        } else {
            1.0
        };
        let weight = neighbor.similarity * multiplier;

        *folder_weights.entry(neighbor.folder.as_str()).or_insert(0.0) += weight;
        total_weight += weight;
    }

    // Strict comparison keeps the first (smallest) folder on ties.
    let (folder, winning_weight) = folder_weights.into_iter().fold(
        None::<(&str, f32)>,
        |best, (folder, weight)| match best {
            Some((_, best_weight)) if weight <= best_weight => best,
            _ => Some((folder, weight)),
        },
    )?;

    let confidence = if total_weight > 0.0 {
        (winning_weight / total_weight).min(1.0)
    } else {
        0.0
    };

    Some(FolderSuggestion {
        folder: folder.to_string(),
        confidence,
    })
}
