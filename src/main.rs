mod etl;
mod data;
mod errors;
mod shape;

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use log::info;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::etl::osm_to_csv::OsmToCsvEtl;
use crate::etl::Etl;
use crate::errors::Result;
use crate::shape::normalizers::CleaningRules;

const DEFAULT_CONFIG_PATH: &str = "config/san_jose.json";

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UserConfig {
    pub data_path: String,
    pub output_dir: String,
    /// Re-run even if every output table already exists.
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_true")]
    pub halt_on_missing_attribute: bool,
    #[serde(default)]
    pub rules: CleaningRules,
}

fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!(config = config_path.as_str(); "Loading config");
    let user_config = load_user_config(Path::new(&config_path))?;

    let output_dir = Path::new(&user_config.output_dir);
    let mut etl = OsmToCsvEtl::new(&user_config);
    if user_config.overwrite {
        etl.clean(output_dir)?;
    }
    etl.process(output_dir)?;

    Ok(())
}
