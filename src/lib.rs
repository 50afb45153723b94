//! Spatial clustering and filter/aggregation pipeline for wastewater treatment
//! plant (WWTP) records.
//!
//! A host calls [`Dashboard::initialize`] once at start-up, then
//! [`Dashboard::filter_and_aggregate`] whenever the user changes a filter.

pub mod color;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;

pub use config::Config;
pub use dashboard::{CorrelationPanel, Dashboard, DashboardView, MapPoint};
pub use data::filter::FilterSelection;
