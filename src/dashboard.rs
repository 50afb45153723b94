use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;

use crate::color::ClusterPalette;
use crate::config::Config;
use crate::data::aggregate::{aggregate, CorrelationMatrix};
use crate::data::cluster::KMeans;
use crate::data::filter::{filter, FilterSelection};
use crate::data::loader::load_file;
use crate::data::model::{FilterOptions, PlantRecord, PlantTable, RawPlant};
use crate::data::prepare::prepare;
use crate::error::StartupError;

// ---------------------------------------------------------------------------
// Query response
// ---------------------------------------------------------------------------

/// One plotted plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub cluster_id: usize,
    pub adjusted_capacity: f64,
    pub subregion: String,
    pub capacity: f64,
    pub treatment_type: String,
    /// `#rrggbb` colour of the plant's cluster.
    pub color: String,
}

/// Correlation heatmap content, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationPanel {
    Matrix(CorrelationMatrix),
    Unavailable { reason: String },
}

impl CorrelationPanel {
    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            CorrelationPanel::Matrix(m) => Some(m),
            CorrelationPanel::Unavailable { .. } => None,
        }
    }
}

/// Everything a host needs to redraw after a filter change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub map_points: Vec<MapPoint>,
    pub capacity_by_type: BTreeMap<String, f64>,
    pub correlation: CorrelationPanel,
}

// ---------------------------------------------------------------------------
// Dashboard – initialised once, queried many times
// ---------------------------------------------------------------------------

/// The clustered plant table plus its display palette.
///
/// Built once by [`Dashboard::initialize`]; afterwards it is read-only, so a
/// host may share it across threads (e.g. behind an `Arc`) and serve
/// overlapping queries without locking.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: PlantTable,
    palette: ClusterPalette,
}

impl Dashboard {
    /// Load, prepare and cluster the file named in `config`.
    pub fn initialize(config: &Config) -> Result<Self, StartupError> {
        config.validate()?;
        let rows = load_file(&config.data.path)?;
        Self::from_rows(rows, config)
    }

    /// Prepare and cluster rows that are already in memory.
    pub fn from_rows(rows: Vec<RawPlant>, config: &Config) -> Result<Self, StartupError> {
        config.validate()?;
        let clustering = &config.clustering;

        let prepared = prepare(rows, config.features.capacity_floor);
        let points: Vec<[f64; 2]> = prepared.iter().map(|p| p.plant.coordinates()).collect();
        let fit = KMeans::new(clustering.k)
            .with_seed(clustering.seed)
            .with_max_iterations(clustering.max_iterations)
            .with_restarts(clustering.restarts)
            .fit(&points)?;

        let table = PlantTable::from_clustered(prepared, fit);
        info!(
            "dashboard ready: {} plants, cluster sizes {:?}",
            table.len(),
            table.cluster_sizes()
        );
        Ok(Dashboard {
            palette: ClusterPalette::new(table.k()),
            table,
        })
    }

    pub fn table(&self) -> &PlantTable {
        &self.table
    }

    pub fn palette(&self) -> &ClusterPalette {
        &self.palette
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.table.filter_options()
    }

    /// Filter the table and compute everything the charts show.
    ///
    /// Never fails: an undefined correlation becomes
    /// [`CorrelationPanel::Unavailable`].
    pub fn filter_and_aggregate(&self, selection: &FilterSelection) -> DashboardView {
        let subset = filter(self.table.records(), selection);
        debug!(
            "query {:?} matched {} of {} plants",
            selection,
            subset.len(),
            self.table.len()
        );

        let aggregates = aggregate(&subset);
        let correlation = match aggregates.correlation {
            Ok(matrix) => CorrelationPanel::Matrix(matrix),
            Err(e) => {
                debug!("correlation unavailable: {e}");
                CorrelationPanel::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        DashboardView {
            map_points: subset.iter().map(|r| self.map_point(r)).collect(),
            capacity_by_type: aggregates.capacity_by_type,
            correlation,
        }
    }

    fn map_point(&self, r: &PlantRecord) -> MapPoint {
        MapPoint {
            lat: r.lat,
            lon: r.lon,
            cluster_id: r.cluster_id,
            adjusted_capacity: r.adjusted_capacity,
            subregion: r.subregion.clone(),
            capacity: r.capacity,
            treatment_type: r.treatment_type.clone(),
            color: self.palette.color_for(r.cluster_id).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::error::ClusteringError;

    fn plant(kind: &str, capacity: f64, lat: f64, lon: f64) -> RawPlant {
        RawPlant {
            treatment_type: kind.to_string(),
            subregion: "Kigezi".to_string(),
            capacity,
            lat,
            lon,
        }
    }

    fn config(k: usize) -> Config {
        Config {
            clustering: ClusterConfig {
                k,
                seed: Some(5),
                ..ClusterConfig::default()
            },
            ..Config::default()
        }
    }

    fn dashboard() -> Dashboard {
        let rows = vec![
            plant("Lagoon", 2.0, 3.0, 32.0),
            plant("Activated sludge", 5.0, 3.1, 32.1),
            plant("Lagoon", 10.0, 0.3, 32.6),
            plant("Trickling filter", 3.0, 0.4, 32.5),
            plant("Activated sludge", 20.0, -1.0, 30.0),
        ];
        Dashboard::from_rows(rows, &config(3)).unwrap()
    }

    #[test]
    fn adjusted_capacities_are_floored() {
        let d = dashboard();
        let adjusted: Vec<f64> = d
            .table()
            .records()
            .iter()
            .map(|r| r.adjusted_capacity)
            .collect();
        assert_eq!(adjusted, vec![5.0, 5.0, 10.0, 5.0, 20.0]);
    }

    #[test]
    fn table_keeps_every_row_in_input_order() {
        let d = dashboard();
        assert_eq!(d.table().len(), 5);
        let kinds: Vec<&str> = d
            .table()
            .records()
            .iter()
            .map(|r| r.treatment_type.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["Lagoon", "Activated sludge", "Lagoon", "Trickling filter", "Activated sludge"]
        );
        assert!(d.table().records().iter().all(|r| r.cluster_id < 3));
    }

    #[test]
    fn unconstrained_query_returns_every_plant() {
        let d = dashboard();
        let view = d.filter_and_aggregate(&FilterSelection::all());
        assert_eq!(view.map_points.len(), 5);
        assert_eq!(view.capacity_by_type.values().sum::<f64>(), 40.0);
        assert!(view.correlation.matrix().is_some());
        for p in &view.map_points {
            assert_eq!(p.color, d.palette().color_for(p.cluster_id));
        }
    }

    #[test]
    fn unknown_cluster_degrades_gracefully() {
        let view = dashboard().filter_and_aggregate(&FilterSelection::all().with_clusters([42]));
        assert!(view.map_points.is_empty());
        assert!(view.capacity_by_type.is_empty());
        assert!(matches!(view.correlation, CorrelationPanel::Unavailable { .. }));
    }

    #[test]
    fn single_plant_has_totals_but_no_correlation() {
        let view = dashboard()
            .filter_and_aggregate(&FilterSelection::all().with_treatments(["Trickling filter"]));
        assert_eq!(view.map_points.len(), 1);
        assert_eq!(view.capacity_by_type["Trickling filter"], 3.0);
        assert_eq!(view.correlation.matrix(), None);
    }

    #[test]
    fn every_cluster_is_populated() {
        let d = dashboard();
        assert_eq!(d.table().cluster_sizes().len(), 3);
        assert!(d.table().cluster_sizes().iter().all(|&n| n > 0));
        assert_eq!(d.filter_options().cluster_ids, vec![0, 1, 2]);
    }

    #[test]
    fn too_few_rows_for_k() {
        let rows = vec![plant("Lagoon", 1.0, 0.0, 30.0)];
        let err = Dashboard::from_rows(rows, &config(3)).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Clustering(ClusteringError::TooFewPoints { k: 3, points: 1 })
        ));
    }

    #[test]
    fn view_serializes_for_the_host() {
        let view = dashboard().filter_and_aggregate(&FilterSelection::all().with_clusters([99]));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["correlation"]["status"], "unavailable");
        assert!(json["map_points"].as_array().unwrap().is_empty());
    }
}
