pub mod gold_standard;
pub mod json;

pub use gold_standard::{load_gold_standard, read_links};
pub use json::{from_json, load_json, save_json, to_json};
