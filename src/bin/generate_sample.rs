//! Write a synthetic troponin dataset.
//!
//! ```text
//! generate_sample [OUTPUT] [ROWS] [SEED]
//! ```
//!
//! Defaults come from `TROPONIN_VIEWER_CONFIG` (or the built-in
//! configuration); the output format follows the file extension.

use std::path::PathBuf;

use anyhow::{Context, Result};

use troponin_viewer::config::ViewerConfig;
use troponin_viewer::data::export::{export, ExportOptions};
use troponin_viewer::data::generator::generate;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "troponin_sample.csv".to_string()));

    let mut config = ViewerConfig::from_env().context("loading configuration")?;
    if let Some(rows) = args.next() {
        config.generator.rows = rows
            .parse()
            .with_context(|| format!("ROWS must be a non-negative integer, got '{rows}'"))?;
    }
    if let Some(seed) = args.next() {
        config.generator.seed = seed
            .parse()
            .with_context(|| format!("SEED must be an unsigned integer, got '{seed}'"))?;
    }

    let thresholds = config.thresholds.table().context("building threshold table")?;
    let dataset = generate(&config.generator, &thresholds).context("generating dataset")?;

    let all: Vec<usize> = (0..dataset.len()).collect();
    let options = ExportOptions {
        columns: None,
        append_diagnosis: true,
    };
    let n = export(&output, &dataset, &all, &options)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {n} measurements (seed {}) to {}",
        config.generator.seed,
        output.display()
    );
    Ok(())
}
