use std::{fs, io::BufRead, path::{Path, PathBuf}};

use csv::WriterBuilder;
use log::{debug, error, info};
use serde::Serialize;

use crate::{
    data::{
        tabular::{RecordBundle, MEMBER_COLUMNS, POINT_COLUMNS, TAG_COLUMNS, WAY_COLUMNS},
        TabularMapData,
    },
    errors::{ErrorKind, Result},
    shape::{shape_element, Rejection, ShapeOutcome},
    UserConfig,
};

use super::{parse_osm::{self, OsmElementReader}, Etl};

pub const ETL_NAME: &str = "osm_to_csv";
pub const NODES_FILE_NAME: &str = "nodes.csv";
pub const NODE_TAGS_FILE_NAME: &str = "nodes_tags.csv";
pub const WAYS_FILE_NAME: &str = "ways.csv";
pub const WAY_NODES_FILE_NAME: &str = "ways_nodes.csv";
pub const WAY_TAGS_FILE_NAME: &str = "ways_tags.csv";

const OUTPUT_FILE_NAMES: [&str; 5] = [
    NODES_FILE_NAME,
    NODE_TAGS_FILE_NAME,
    WAYS_FILE_NAME,
    WAY_NODES_FILE_NAME,
    WAY_TAGS_FILE_NAME,
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShapeStats {
    pub points: u64,
    pub ways: u64,
    pub rejected_postcode: u64,
    pub rejected_city: u64,
    pub ignored: u64,
    pub missing_attribute: u64,
}

impl ShapeStats {
    fn count_shaped(&mut self, bundle: &RecordBundle) {
        match bundle {
            RecordBundle::Point { .. } => self.points += 1,
            RecordBundle::Way { .. } => self.ways += 1,
        }
    }

    fn count_rejected(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::Postcode(_) => self.rejected_postcode += 1,
            Rejection::City(_) => self.rejected_city += 1,
        }
    }

    fn log(&self) {
        info!(
            points = self.points,
            ways = self.ways,
            rejected_postcode = self.rejected_postcode,
            rejected_city = self.rejected_city,
            ignored = self.ignored,
            missing_attribute = self.missing_attribute;
            "Shaping finished"
        );
    }
}

/// Reads the .osm file, shapes and cleans every node and way, and writes one CSV
/// file per output table.
pub struct OsmToCsvEtl<'a> {
    config: &'a UserConfig,
    pub stats: ShapeStats,
}

impl OsmToCsvEtl<'_> {
    pub fn new(config: &UserConfig) -> OsmToCsvEtl<'_> {
        OsmToCsvEtl {
            config,
            stats: ShapeStats::default(),
        }
    }

    fn output_paths(dir: &Path) -> impl Iterator<Item = PathBuf> + '_ {
        OUTPUT_FILE_NAMES.iter().map(move |name| dir.join(name))
    }

    fn write_table<T: Serialize>(path: &Path, columns: &[&str], records: &[T]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        // Written by hand so that empty tables still get a header row.
        writer.write_record(columns)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        let file = path.to_string_lossy();
        info!(file = &*file, rows = records.len(); "Wrote table");
        Ok(())
    }

    fn on_rejected(&mut self, id: Option<&str>, rejection: Rejection) {
        match &rejection {
            Rejection::Postcode(value) => {
                debug!(id = id.unwrap_or_default(), postcode = value.as_str(); "Dropping element outside postcode area")
            },
            Rejection::City(value) => {
                debug!(id = id.unwrap_or_default(), city = value.as_str(); "Dropping element with unknown city")
            },
        }
        self.stats.count_rejected(&rejection);
    }
}

impl Etl for OsmToCsvEtl<'_> {
    type Input = OsmElementReader<Box<dyn BufRead>>;
    type Output = TabularMapData;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        for path in Self::output_paths(dir) {
            if !path.try_exists()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for path in Self::output_paths(dir) {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self) -> Result<Self::Input> {
        parse_osm::open_osm_file(Path::new(&self.config.data_path))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut output = TabularMapData::default();
        self.stats = ShapeStats::default();

        for element_res in tqdm::tqdm(input) {
            // Malformed children surface from the reader, missing top level attributes
            // from the shaper; both fall under the same policy.
            let outcome = element_res
                .and_then(|element| Ok((shape_element(&element, &self.config.rules)?, element)));
            match outcome {
                Ok((ShapeOutcome::Shaped(bundle), _)) => {
                    self.stats.count_shaped(&bundle);
                    output.push(bundle);
                },
                Ok((ShapeOutcome::Rejected(rejection), element)) => self.on_rejected(element.id(), rejection),
                Ok((ShapeOutcome::Ignored, _)) => self.stats.ignored += 1,
                Err(err) if err.kind == ErrorKind::MissingAttribute && !self.config.halt_on_missing_attribute => {
                    error!(err = err.message.as_str(); "Skipping malformed element");
                    self.stats.missing_attribute += 1;
                },
                Err(err) => return Err(err),
            }
        }

        self.stats.log();
        Ok(output)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        fs::create_dir_all(dir)?;
        Self::write_table(&dir.join(NODES_FILE_NAME), &POINT_COLUMNS, &output.points)?;
        Self::write_table(&dir.join(NODE_TAGS_FILE_NAME), &TAG_COLUMNS, &output.point_tags)?;
        Self::write_table(&dir.join(WAYS_FILE_NAME), &WAY_COLUMNS, &output.ways)?;
        Self::write_table(&dir.join(WAY_NODES_FILE_NAME), &MEMBER_COLUMNS, &output.way_members)?;
        Self::write_table(&dir.join(WAY_TAGS_FILE_NAME), &TAG_COLUMNS, &output.way_tags)?;
        Ok(())
    }
}
