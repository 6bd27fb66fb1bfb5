// src/utils/env.rs

use log::{debug, info, warn};
use std::env;

/// Load variables from a `.env` file in the working directory, if present.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

const DEFAULT_LINKS_DELIMITER: u8 = b'\t';

/// Settings for loading and sampling cluster data.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Seed used by `sample` when the CLI gives none
    pub sample_seed: Option<u64>,
    /// Field separator of gold standard link files
    pub links_delimiter: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            sample_seed: None,
            links_delimiter: DEFAULT_LINKS_DELIMITER,
        }
    }
}

impl ClusterConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let sample_seed = match env::var("CLUSTER_SAMPLE_SEED") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring invalid CLUSTER_SAMPLE_SEED value: {:?}", raw);
                    None
                }
            },
            Err(_) => None,
        };

        let links_delimiter = env::var("CLUSTER_LINKS_DELIMITER")
            .ok()
            .and_then(|raw| parse_delimiter(&raw))
            .unwrap_or(DEFAULT_LINKS_DELIMITER);

        debug!(
            "Cluster config: sample_seed={:?}, links_delimiter={:?}",
            sample_seed, links_delimiter as char
        );

        Self {
            sample_seed,
            links_delimiter,
        }
    }
}

/// Accepts a single ASCII character or the escapes `\t` and `tab`.
fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "\\t" | "tab" | "\t" => Some(b'\t'),
        other if other.len() == 1 && other.is_ascii() => other.bytes().next(),
        _ => None,
    }
}
