//! Storage key layout for binlogs.
//!
//! Insert and stats logs live at
//! `{root}/{insert_log|stats_log}/{collection}/{partition}/{segment}/{field}/{log_id}`,
//! delta logs at `{root}/delta_log/{collection}/{partition}/{segment}/{log_id}`.
//! Log ids come from the id allocator, so two keys built for the same segment
//! and field never collide.

use crate::error::{BinlogIoError, BinlogIoResult};
use binlog_codec::{FieldId, UniqueId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of log a key points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    /// Per-field insert logs.
    Insert,
    /// Primary-key statistics logs.
    Stats,
    /// Delete logs.
    Delta,
}

impl LogType {
    /// Returns the path segment under the root for this log type.
    #[must_use]
    pub const fn subpath(self) -> &'static str {
        match self {
            LogType::Insert => "insert_log",
            LogType::Stats => "stats_log",
            LogType::Delta => "delta_log",
        }
    }

    fn from_subpath(s: &str) -> Option<Self> {
        match s {
            "insert_log" => Some(LogType::Insert),
            "stats_log" => Some(LogType::Stats),
            "delta_log" => Some(LogType::Delta),
            _ => None,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subpath())
    }
}

/// Joins ids with `/`.
#[must_use]
pub fn join_id_path(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds the storage key of a log.
///
/// `field_id` is part of insert and stats keys only; delta logs are not tied
/// to a field and their keys omit it.
#[must_use]
pub fn make_key(
    root: &str,
    log_type: LogType,
    collection_id: UniqueId,
    partition_id: UniqueId,
    segment_id: UniqueId,
    field_id: FieldId,
    log_id: UniqueId,
) -> String {
    let ids = match log_type {
        LogType::Insert | LogType::Stats => {
            join_id_path(&[collection_id, partition_id, segment_id, field_id, log_id])
        }
        LogType::Delta => join_id_path(&[collection_id, partition_id, segment_id, log_id]),
    };

    format!("{}{}/{ids}", root_prefix(root), log_type.subpath())
}

/// The parts of a log key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPath {
    /// Kind of log.
    pub log_type: LogType,
    /// Owning collection.
    pub collection_id: UniqueId,
    /// Owning partition.
    pub partition_id: UniqueId,
    /// Owning segment.
    pub segment_id: UniqueId,
    /// Field id; `None` for delta logs.
    pub field_id: Option<FieldId>,
    /// Allocated log id.
    pub log_id: UniqueId,
}

impl LogPath {
    /// Rebuilds the key under `root`.
    #[must_use]
    pub fn to_key(&self, root: &str) -> String {
        make_key(
            root,
            self.log_type,
            self.collection_id,
            self.partition_id,
            self.segment_id,
            self.field_id.unwrap_or(0),
            self.log_id,
        )
    }
}

/// Splits a log key back into its parts.
///
/// # Errors
///
/// Returns an error if `path` is not under `root` or does not follow the
/// layout for its log type.
pub fn parse_log_path(root: &str, path: &str) -> BinlogIoResult<LogPath> {
    let prefix = root_prefix(root);
    let rest = path.strip_prefix(prefix.as_str()).ok_or_else(|| {
        BinlogIoError::invalid_log_path(path, format!("not under root {root:?}"))
    })?;

    let mut parts = rest.split('/');
    let log_type = parts
        .next()
        .and_then(LogType::from_subpath)
        .ok_or_else(|| BinlogIoError::invalid_log_path(path, "unknown log type"))?;

    let ids = parts
        .map(|p| {
            p.parse::<i64>()
                .map_err(|_| BinlogIoError::invalid_log_path(path, format!("{p:?} is not an id")))
        })
        .collect::<BinlogIoResult<Vec<_>>>()?;

    match (log_type, ids.as_slice()) {
        (
            LogType::Insert | LogType::Stats,
            &[collection_id, partition_id, segment_id, field_id, log_id],
        ) => Ok(LogPath {
            log_type,
            collection_id,
            partition_id,
            segment_id,
            field_id: Some(field_id),
            log_id,
        }),
        (LogType::Delta, &[collection_id, partition_id, segment_id, log_id]) => Ok(LogPath {
            log_type,
            collection_id,
            partition_id,
            segment_id,
            field_id: None,
            log_id,
        }),
        _ => Err(BinlogIoError::invalid_log_path(
            path,
            format!("wrong number of ids for {log_type}"),
        )),
    }
}

/// Returns the root with exactly one trailing `/`, or nothing for an empty root.
fn root_prefix(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        if root.is_empty() {
            String::new()
        } else {
            "/".to_string()
        }
    } else {
        format!("{trimmed}/")
    }
}
