use super::model::{PreparedPlant, RawPlant};

/// Smallest adjusted capacity used when no configuration overrides it.
pub const DEFAULT_CAPACITY_FLOOR: f64 = 5.0;

/// Floor `capacity` at `floor`. There is no upper bound.
pub fn adjusted_capacity(capacity: f64, floor: f64) -> f64 {
    capacity.max(floor)
}

/// Attach derived features to every row, keeping order and count.
pub fn prepare(rows: Vec<RawPlant>, floor: f64) -> Vec<PreparedPlant> {
    rows.into_iter()
        .map(|plant| PreparedPlant {
            adjusted_capacity: adjusted_capacity(plant.capacity, floor),
            plant,
        })
        .collect()
}
