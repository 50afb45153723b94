use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use wwtp_clusters::{Config, Dashboard, FilterSelection};

/// Cluster WWTP records and print one dashboard query as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Plant table (overrides `data.path`)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    data: Option<PathBuf>,

    /// Number of clusters (overrides `clustering.k`)
    #[arg(long)]
    k: Option<usize>,

    /// Seed for centroid initialisation (overrides `clustering.seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Keep only these cluster ids (repeatable)
    #[arg(long = "cluster")]
    clusters: Vec<usize>,

    /// Keep only these treatment types (repeatable)
    #[arg(long = "treatment")]
    treatments: Vec<String>,

    /// Print the available filter values instead of running a query
    #[arg(long)]
    options: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        if let Some(k) = self.k {
            config.clustering.k = k;
        }
        if self.seed.is_some() {
            config.clustering.seed = self.seed;
        }
        Ok(config)
    }

    fn selection(&self) -> FilterSelection {
        FilterSelection::all()
            .with_clusters(self.clusters.iter().copied())
            .with_treatments(self.treatments.iter().cloned())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config()?;
    let dashboard = Dashboard::initialize(&config)
        .with_context(|| format!("initialising from {}", config.data.path.display()))?;

    let output = if args.options {
        serde_json::json!({
            "filters": dashboard.filter_options(),
            "legend": dashboard.palette().legend(),
        })
    } else {
        serde_json::to_value(dashboard.filter_and_aggregate(&args.selection()))?
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}
