use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Write a synthetic WWTP table with three spatial groups.
#[derive(Parser, Debug)]
struct Args {
    /// Output file
    #[arg(default_value = "sample_wwtp.csv", value_hint = clap::ValueHint::FilePath)]
    output: PathBuf,

    /// Plants per group
    #[arg(long, default_value_t = 20)]
    per_group: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// (subregion, centre lat, centre lon)
const GROUPS: [(&str, f64, f64); 3] = [
    ("Acholi", 2.77, 32.30),
    ("Buganda", 0.32, 32.58),
    ("Ankole", -0.61, 30.65),
];

const TREATMENT_TYPES: [&str; 4] = [
    "Activated sludge",
    "Waste stabilization pond",
    "Trickling filter",
    "Constructed wetland",
];

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record(["Name", "treatment_type", "Subregion", "Capacity", "Lat", "Lon"])?;

    let mut rows = 0;
    for (subregion, lat, lon) in GROUPS {
        for i in 0..args.per_group {
            let kind = TREATMENT_TYPES.choose(&mut rng).copied().unwrap_or_default();
            // Skewed so some plants sit below the capacity floor.
            let capacity = rng.gen_range(0.0f64..3.0).exp2().powi(2).round();
            let plant_lat = lat + rng.gen_range(-0.35..0.35);
            let plant_lon = lon + rng.gen_range(-0.35..0.35);

            // Every tenth plant has no recorded capacity.
            let capacity_cell = if i % 10 == 9 {
                String::new()
            } else {
                capacity.to_string()
            };

            writer.write_record([
                format!("{subregion} WWTP {i}"),
                kind.to_string(),
                subregion.to_string(),
                capacity_cell,
                format!("{plant_lat:.5}"),
                format!("{plant_lon:.5}"),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {rows} plants to {}", args.output.display());
    Ok(())
}
