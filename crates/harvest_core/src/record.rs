use serde::{Deserialize, Serialize};

use crate::AppId;

/// One line of the output store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedRecord {
    pub appid: AppId,
    pub name: Option<String>,
    pub release_year: u16,
    pub release_date: String,
    pub genres: String,
    pub categories: String,
    pub price: f64,
    pub recommendations: u64,
    pub developer: String,
    pub publisher: String,
}

/// The only part of a stored line the checkpoint scan needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CheckpointEntry {
    pub appid: AppId,
}
