use crate::model::Liker;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use utoipa::ToSchema;

/// A liker annotated with how many of the scanned posts they liked.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedLiker {
    #[serde(flatten)]
    pub liker: Liker,
    pub like_count: u64,
}

/// Groups likers by username and orders them most-frequent first. Ties keep
/// the order usernames were first seen in, so the same input always produces
/// the same output. Entries without a username are skipped.
pub fn rank_top_likers(likers: &[Liker]) -> Vec<RankedLiker> {
    let mut counts: Vec<(Liker, u64)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for liker in likers.iter().filter(|liker| !liker.username.is_empty()) {
        match seen.entry(liker.username.clone()) {
            Entry::Occupied(slot) => counts[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(counts.len());
                counts.push((liker.clone(), 1));
            }
        }
    }

    // sort_by is stable, which is what keeps the first-seen tie-break
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .map(|(liker, like_count)| RankedLiker { liker, like_count })
        .collect()
}

/// First-seen-wins deduplication by username; original relative order of the
/// first occurrences is preserved. Entries without a username are skipped.
pub fn unique_audience(likers: &[Liker]) -> Vec<Liker> {
    likers
        .iter()
        .filter(|liker| !liker.username.is_empty())
        .unique_by(|liker| liker.username.as_str())
        .cloned()
        .collect()
}
