//! Records describing written logs.

use binlog_codec::FieldId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One written log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binlog {
    /// Storage key the payload was written to.
    pub log_path: String,
    /// Exact payload size in bytes.
    pub log_size: u64,
    /// Number of rows (entries) in the payload.
    pub entries_num: u64,
}

/// The logs written for one field of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinlog {
    /// Field id, or `0` for delta logs.
    pub field_id: FieldId,
    /// Written logs.
    pub binlogs: Vec<Binlog>,
}

impl FieldBinlog {
    /// Creates a record holding a single log.
    pub fn single(field_id: FieldId, log_path: String, log_size: u64, entries_num: u64) -> Self {
        Self {
            field_id,
            binlogs: vec![Binlog {
                log_path,
                log_size,
                entries_num,
            }],
        }
    }

    /// Returns every log path of this field.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.binlogs.iter().map(|b| b.log_path.as_str())
    }
}

/// Field id to written logs.
pub type FieldBinlogs = BTreeMap<FieldId, FieldBinlog>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_binlog_serializes_as_json() {
        let record = FieldBinlog::single(100, "files/insert_log/1/2/3/100/7".into(), 64, 4);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"log_path\":\"files/insert_log/1/2/3/100/7\""));

        let back: FieldBinlog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.paths().collect::<Vec<_>>(), vec!["files/insert_log/1/2/3/100/7"]);
    }
}
