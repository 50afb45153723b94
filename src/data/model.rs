use std::collections::BTreeSet;

use serde::Serialize;

use super::cluster::KMeansFit;

// ---------------------------------------------------------------------------
// RawPlant – one complete row of the source table
// ---------------------------------------------------------------------------

/// A plant row as read from the source, restricted to the required columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlant {
    pub treatment_type: String,
    pub subregion: String,
    pub capacity: f64,
    pub lat: f64,
    pub lon: f64,
}

impl RawPlant {
    /// Coordinates in the order the clusterer uses them.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// A raw row with its derived features attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPlant {
    pub plant: RawPlant,
    /// `max(capacity, floor)`, computed once at preparation.
    pub adjusted_capacity: f64,
}

// ---------------------------------------------------------------------------
// PlantRecord – one row of the clustered table
// ---------------------------------------------------------------------------

/// A fully prepared and clustered plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantRecord {
    pub treatment_type: String,
    pub subregion: String,
    pub capacity: f64,
    pub adjusted_capacity: f64,
    pub lat: f64,
    pub lon: f64,
    pub cluster_id: usize,
}

// ---------------------------------------------------------------------------
// PlantTable – the immutable, process-wide table
// ---------------------------------------------------------------------------

/// The clustered table. Built once; only shared references leave it.
#[derive(Debug, Clone)]
pub struct PlantTable {
    records: Vec<PlantRecord>,
    centroids: Vec<[f64; 2]>,
}

/// Sorted distinct values a host can offer as filter choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub cluster_ids: Vec<usize>,
    pub treatment_types: Vec<String>,
}

impl PlantTable {
    /// Attach cluster assignments to prepared rows.
    ///
    /// `fit.assignments` must be index-aligned with `prepared`; only the
    /// clusterer's own output is passed in.
    pub(crate) fn from_clustered(prepared: Vec<PreparedPlant>, fit: KMeansFit) -> Self {
        debug_assert_eq!(prepared.len(), fit.assignments.len());
        let records = prepared
            .into_iter()
            .zip(fit.assignments)
            .map(|(p, cluster_id)| PlantRecord {
                treatment_type: p.plant.treatment_type,
                subregion: p.plant.subregion,
                capacity: p.plant.capacity,
                adjusted_capacity: p.adjusted_capacity,
                lat: p.plant.lat,
                lon: p.plant.lon,
                cluster_id,
            })
            .collect();
        PlantTable {
            records,
            centroids: fit.centroids,
        }
    }

    pub fn records(&self) -> &[PlantRecord] {
        &self.records
    }

    /// Number of clusters the table was partitioned into.
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Final `(lat, lon)` centroid per cluster id.
    pub fn centroids(&self) -> &[[f64; 2]] {
        &self.centroids
    }

    /// Number of records per cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for r in &self.records {
            sizes[r.cluster_id] += 1;
        }
        sizes
    }

    /// Distinct cluster ids and treatment types present, both sorted.
    pub fn filter_options(&self) -> FilterOptions {
        let cluster_ids: BTreeSet<usize> = self.records.iter().map(|r| r.cluster_id).collect();
        let treatment_types: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.treatment_type.as_str())
            .collect();
        FilterOptions {
            cluster_ids: cluster_ids.into_iter().collect(),
            treatment_types: treatment_types.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(kind: &str, lat: f64) -> PreparedPlant {
        PreparedPlant {
            plant: RawPlant {
                treatment_type: kind.to_string(),
                subregion: "Acholi".to_string(),
                capacity: 1.0,
                lat,
                lon: 32.0,
            },
            adjusted_capacity: 5.0,
        }
    }

    fn table() -> PlantTable {
        let fit = KMeansFit {
            assignments: vec![1, 0, 1],
            centroids: vec![[0.5, 32.0], [2.5, 32.0]],
            inertia: 0.0,
            iterations: 1,
        };
        PlantTable::from_clustered(
            vec![
                prepared("Lagoon", 2.0),
                prepared("Activated sludge", 0.5),
                prepared("Lagoon", 3.0),
            ],
            fit,
        )
    }

    #[test]
    fn assignments_follow_row_order() {
        let t = table();
        let ids: Vec<usize> = t.records().iter().map(|r| r.cluster_id).collect();
        assert_eq!(ids, vec![1, 0, 1]);
        assert_eq!(t.k(), 2);
        assert_eq!(t.cluster_sizes(), vec![1, 2]);
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let opts = table().filter_options();
        assert_eq!(opts.cluster_ids, vec![0, 1]);
        assert_eq!(
            opts.treatment_types,
            vec!["Activated sludge".to_string(), "Lagoon".to_string()]
        );
    }
}
