use std::collections::BTreeMap;

use hub_core::model::{BookmarkSet, ProgressRecord, RegionName, RegionProgress};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{ProgressRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Column values for the JSON-encoded parts of a progress document.
pub(crate) struct EncodedProgress {
    pub preferred_region: String,
    pub regions: String,
    pub bookmarks: String,
}

pub(crate) fn encode_progress(record: &ProgressRecord) -> Result<EncodedProgress, StorageError> {
    Ok(EncodedProgress {
        preferred_region: record.preferred_region.as_str().to_owned(),
        regions: serde_json::to_string(&record.regions).map_err(ser)?,
        bookmarks: serde_json::to_string(&record.bookmarks).map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRow, StorageError> {
    let preferred_region: String = row.try_get("preferred_region").map_err(ser)?;
    let regions_json: String = row.try_get("regions").map_err(ser)?;
    let bookmarks_json: String = row.try_get("bookmarks").map_err(ser)?;

    let regions: BTreeMap<RegionName, RegionProgress> =
        serde_json::from_str(&regions_json).map_err(ser)?;
    let bookmarks: BookmarkSet = serde_json::from_str(&bookmarks_json).map_err(ser)?;

    Ok(ProgressRow {
        record: ProgressRecord {
            preferred_region: RegionName::new(preferred_region),
            regions,
            bookmarks,
        },
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}
