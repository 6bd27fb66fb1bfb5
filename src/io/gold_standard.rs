// src/io/gold_standard.rs - Loading known matches from link files

use csv::ReaderBuilder;
use indicatif::ProgressBar;
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::clustering::{ClusterIndex, EntityId};
use crate::error::{ClusterError, ClusterResult};
use crate::utils::env::ClusterConfig;
use crate::utils::progress_config::ProgressConfig;

const PROGRESS_UPDATE_EVERY: u64 = 10_000;

/// Read `left<delimiter>right` rows. Extra columns are ignored, blank lines skipped.
pub fn read_links<R: Read>(
    reader: R,
    delimiter: u8,
    progress: Option<&ProgressBar>,
) -> ClusterResult<Vec<(EntityId, EntityId)>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut links = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row + 1);
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let (left, right) = match (record.get(0), record.get(1)) {
            (Some(left), Some(right)) if !left.trim().is_empty() && !right.trim().is_empty() => {
                (left.trim(), right.trim())
            }
            _ => {
                return Err(ClusterError::Parse {
                    line,
                    message: format!("expected two fields, got {:?}", record),
                })
            }
        };
        links.push((EntityId::from(left), EntityId::from(right)));

        if let Some(pb) = progress {
            if links.len() as u64 % PROGRESS_UPDATE_EVERY == 0 {
                pb.set_position(links.len() as u64);
            }
        }
    }
    debug!("Read {} links", links.len());
    Ok(links)
}

/// Build a cluster index from a gold standard link file.
///
/// Every row is one seed, so rows sharing an entity chain into one cluster.
pub fn load_gold_standard<P: AsRef<Path>>(
    path: P,
    config: &ClusterConfig,
    progress_config: &ProgressConfig,
) -> ClusterResult<ClusterIndex> {
    let path = path.as_ref();
    info!("Loading gold standard links from {}", path.display());
    let spinner = progress_config.create_spinner("Reading links...");

    let file = File::open(path)?;
    let links = read_links(file, config.links_delimiter, spinner.as_ref())?;

    if let Some(pb) = &spinner {
        pb.set_position(links.len() as u64);
        pb.finish_with_message("Links loaded");
    }

    let index = ClusterIndex::from_links(links)?;
    info!("Loaded {} from {}", index.info(), path.display());
    Ok(index)
}
