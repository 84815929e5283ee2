pub mod osm_to_csv;
pub mod parse_osm;

use std::path::Path;
use std::time::Instant;
use log::{info, error};

use crate::errors::{Error, Result};


pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn log_failure(&self, phase: &str, err: Error) -> Error {
        let kind = format!("{:?}", err.kind);
        error!(
            etl_name = self.etl_name(),
            phase = phase,
            kind = kind.as_str(),
            err = err.message.as_str();
            "ETL phase failed"
        );
        err
    }

    /// Runs extract, transform and load unless every output in `dir` already exists.
    fn process(&mut self, dir: &Path) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached value");
            return Ok(());
        }
        let started = Instant::now();

        info!(etl_name = self.etl_name(); "Extracting");
        let input = self.extract().map_err(|err| self.log_failure("extract", err))?;

        info!(etl_name = self.etl_name(); "Transforming");
        let output = self.transform(input).map_err(|err| self.log_failure("transform", err))?;

        info!(etl_name = self.etl_name(); "Loading");
        self.load(dir, output).map_err(|err| self.log_failure("load", err))?;

        info!(
            etl_name = self.etl_name(),
            elapsed_ms = started.elapsed().as_millis() as u64;
            "Process finished"
        );
        Ok(())
    }
}
