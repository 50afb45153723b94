use std::collections::BTreeSet;

use serde::Deserialize;

use super::model::PlantRecord;

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// Selected values per filter dimension.
/// An empty set means "no filter" for that dimension (show all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub cluster_ids: BTreeSet<usize>,
    pub treatment_types: BTreeSet<String>,
}

impl FilterSelection {
    /// A selection with no constraints.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_clusters(mut self, ids: impl IntoIterator<Item = usize>) -> Self {
        self.cluster_ids.extend(ids);
        self
    }

    pub fn with_treatments<S: Into<String>>(mut self, kinds: impl IntoIterator<Item = S>) -> Self {
        self.treatment_types.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Whether no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.cluster_ids.is_empty() && self.treatment_types.is_empty()
    }

    /// A record passes when every constrained dimension contains its value.
    pub fn matches(&self, record: &PlantRecord) -> bool {
        (self.cluster_ids.is_empty() || self.cluster_ids.contains(&record.cluster_id))
            && (self.treatment_types.is_empty()
                || self.treatment_types.contains(&record.treatment_type))
    }
}

/// Records passing `selection`, in source order.
///
/// Takes any iterator of record references so results can be filtered again.
pub fn filter<'a, I>(records: I, selection: &FilterSelection) -> Vec<&'a PlantRecord>
where
    I: IntoIterator<Item = &'a PlantRecord>,
{
    records
        .into_iter()
        .filter(|r| selection.matches(r))
        .collect()
}
