use std::collections::BTreeMap;

use serde::Serialize;

use super::model::PlantRecord;
use crate::error::InsufficientDataError;

const CAPACITY: &str = "capacity";
const ADJUSTED_CAPACITY: &str = "adjusted_capacity";

/// Pearson correlation between capacity and adjusted capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Row/column labels, in matrix order.
    pub labels: [&'static str; 2],
    pub values: [[f64; 2]; 2],
}

impl CorrelationMatrix {
    /// Off-diagonal coefficient.
    pub fn coefficient(&self) -> f64 {
        self.values[0][1]
    }
}

/// Summary statistics for one filtered subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub capacity_by_type: BTreeMap<String, f64>,
    pub correlation: Result<CorrelationMatrix, InsufficientDataError>,
}

pub fn aggregate(subset: &[&PlantRecord]) -> Aggregates {
    Aggregates {
        capacity_by_type: capacity_by_type(subset),
        correlation: correlation_matrix(subset),
    }
}

/// Sum of capacity per treatment type present in `subset`.
pub fn capacity_by_type(subset: &[&PlantRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for r in subset {
        *totals.entry(r.treatment_type.clone()).or_default() += r.capacity;
    }
    totals
}

pub fn correlation_matrix(
    subset: &[&PlantRecord],
) -> Result<CorrelationMatrix, InsufficientDataError> {
    if subset.len() < 2 {
        return Err(InsufficientDataError::TooFewRecords {
            count: subset.len(),
        });
    }

    let xs: Vec<f64> = subset.iter().map(|r| r.capacity).collect();
    let ys: Vec<f64> = subset.iter().map(|r| r.adjusted_capacity).collect();
    for (values, column) in [(&xs, CAPACITY), (&ys, ADJUSTED_CAPACITY)] {
        if values.iter().all(|v| *v == values[0]) {
            return Err(InsufficientDataError::ZeroVariance { column });
        }
    }

    // squared deviations of huge capacities overflow to inf, and inf / inf is NaN
    let r = pearson(&xs, &ys);
    if !r.is_finite() {
        return Err(InsufficientDataError::NonFiniteCoefficient);
    }
    let r = r.clamp(-1.0, 1.0);
    Ok(CorrelationMatrix {
        labels: [CAPACITY, ADJUSTED_CAPACITY],
        values: [[1.0, r], [r, 1.0]],
    })
}

/// Caller guarantees equal lengths, n >= 2 and non-constant inputs.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str, capacity: f64) -> PlantRecord {
        PlantRecord {
            treatment_type: kind.to_string(),
            subregion: "Ankole".to_string(),
            capacity,
            adjusted_capacity: capacity.max(5.0),
            lat: -0.6,
            lon: 30.6,
            cluster_id: 0,
        }
    }

    #[test]
    fn sums_capacity_per_type() {
        let rows = [
            record("Lagoon", 2.0),
            record("Activated sludge", 100.0),
            record("Lagoon", 8.5),
        ];
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        let totals = capacity_by_type(&subset);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Lagoon"], 10.5);
        assert_eq!(totals["Activated sludge"], 100.0);

        let all: f64 = rows.iter().map(|r| r.capacity).sum();
        assert_eq!(totals.values().sum::<f64>(), all);
    }

    #[test]
    fn empty_subset_has_no_totals() {
        let agg = aggregate(&[]);
        assert!(agg.capacity_by_type.is_empty());
        assert_eq!(
            agg.correlation,
            Err(InsufficientDataError::TooFewRecords { count: 0 })
        );
    }

    #[test]
    fn single_record_still_sums() {
        let rows = [record("Wetland", 3.0)];
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        let agg = aggregate(&subset);
        assert_eq!(agg.capacity_by_type["Wetland"], 3.0);
        assert_eq!(
            agg.correlation,
            Err(InsufficientDataError::TooFewRecords { count: 1 })
        );
    }

    #[test]
    fn constant_adjusted_capacity_has_no_correlation() {
        // all below the floor: adjusted capacity is 5 everywhere
        let rows = [record("Lagoon", 1.0), record("Lagoon", 2.0), record("Lagoon", 4.0)];
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        assert_eq!(
            correlation_matrix(&subset),
            Err(InsufficientDataError::ZeroVariance {
                column: ADJUSTED_CAPACITY
            })
        );
    }

    #[test]
    fn constant_capacity_has_no_correlation() {
        let rows = [record("Lagoon", 40.0), record("Wetland", 40.0)];
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        assert_eq!(
            correlation_matrix(&subset),
            Err(InsufficientDataError::ZeroVariance { column: CAPACITY })
        );
    }

    #[test]
    fn identical_columns_correlate_perfectly() {
        let rows = [record("Lagoon", 10.0), record("Lagoon", 20.0), record("Lagoon", 35.0)];
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        let m = correlation_matrix(&subset).unwrap();
        assert!((m.coefficient() - 1.0).abs() < 1e-12);
        assert_eq!(m.values[0][0], 1.0);
        assert_eq!(m.values[1][1], 1.0);
        assert_eq!(m.values[0][1], m.values[1][0]);
        assert_eq!(m.labels, ["capacity", "adjusted_capacity"]);
    }

    #[test]
    fn overflowing_capacities_have_no_correlation() {
        let rows = [1e200, 2e200, 3e200].map(|c| record("Lagoon", c));
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        assert_eq!(
            correlation_matrix(&subset),
            Err(InsufficientDataError::NonFiniteCoefficient)
        );
    }

    #[test]
    fn floored_values_weaken_correlation() {
        let rows = [2.0, 5.0, 10.0, 3.0, 20.0].map(|c| record("Lagoon", c));
        let subset: Vec<&PlantRecord> = rows.iter().collect();
        let r = correlation_matrix(&subset).unwrap().coefficient();
        assert!(r > 0.9 && r < 1.0, "r = {r}");
    }
}
