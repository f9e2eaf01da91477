//! Inspect command implementation.

use binlog_codec::{
    BinlogDescriptor, BinlogFile, Blob, CodecError, CollectionMeta, CollectionSchema, DataType,
    DeleteCodec, InsertCodec, LogKind, PrimaryKey,
};
use binlog_storage::{LocalObjectStore, ObjectStore};
use bytes::Bytes;
use serde::Serialize;
use std::path::Path;

/// What a binlog body holds.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodySummary {
    /// One column of inserted rows.
    Insert {
        /// Column type.
        data_type: DataType,
        /// Rows in the column.
        rows: usize,
    },
    /// Deleted primary keys.
    Delete {
        /// Deletions in the log.
        rows: u64,
        /// Oldest delete timestamp.
        min_ts: Option<u64>,
        /// Newest delete timestamp.
        max_ts: Option<u64>,
    },
    /// Primary key statistics.
    Stats {
        /// Primary key field.
        field_id: i64,
        /// Smallest key.
        min: Option<PrimaryKey>,
        /// Largest key.
        max: Option<PrimaryKey>,
        /// Rows the stats cover.
        rows: u64,
    },
}

/// Summary of one decoded binlog.
#[derive(Debug, Serialize)]
pub struct BinlogSummary {
    /// Storage key.
    pub key: String,
    /// Payload size in bytes.
    pub size: usize,
    /// Descriptor stored in the header.
    pub descriptor: BinlogDescriptor,
    /// Decoded body.
    pub body: BodySummary,
}

/// Decodes `value` and summarizes it.
pub fn summarize(key: &str, value: Bytes) -> Result<BinlogSummary, CodecError> {
    let file = BinlogFile::decode(&value)?;
    let size = value.len();
    let blob = Blob::new(key, value, file.descriptor.row_count);

    let body = match file.kind {
        LogKind::Insert => {
            let meta =
                CollectionMeta::new(file.descriptor.collection_id, CollectionSchema::default());
            let (_, _, data) = InsertCodec::new(&meta).deserialize(std::slice::from_ref(&blob))?;
            let column = data
                .field(file.descriptor.field_id)
                .ok_or_else(|| CodecError::decoding_failed("insert log holds no column"))?;
            BodySummary::Insert {
                data_type: column.data_type(),
                rows: column.row_count(),
            }
        }
        LogKind::Delete => {
            let (_, _, data) = DeleteCodec::new().deserialize(&blob)?;
            BodySummary::Delete {
                rows: data.row_count,
                min_ts: data.tss.iter().min().copied(),
                max_ts: data.tss.iter().max().copied(),
            }
        }
        LogKind::Stats => {
            let meta =
                CollectionMeta::new(file.descriptor.collection_id, CollectionSchema::default());
            let (stats, rows) = InsertCodec::new(&meta).deserialize_pk_stats(&blob)?;
            BodySummary::Stats {
                field_id: stats.field_id,
                min: stats.min,
                max: stats.max,
                rows,
            }
        }
    };

    Ok(BinlogSummary {
        key: key.to_string(),
        size,
        descriptor: file.descriptor,
        body,
    })
}

/// Runs the inspect command.
pub async fn run(dir: &Path, key: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = LocalObjectStore::open(dir).await?;
    tracing::info!(path = %key, "inspecting binlog");

    let value = store.read(key).await?;
    let summary = summarize(key, value)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print_text(&summary),
    }
    Ok(())
}

fn print_text(summary: &BinlogSummary) {
    let d = &summary.descriptor;
    println!("Binlog {}", summary.key);
    println!("  Size:       {} bytes", summary.size);
    println!("  Collection: {}", d.collection_id);
    println!("  Partition:  {}", d.partition_id);
    println!("  Segment:    {}", d.segment_id);
    println!("  Field:      {}", d.field_id);
    println!("  Rows:       {}", d.row_count);

    match &summary.body {
        BodySummary::Insert { data_type, rows } => {
            println!("  Kind:       insert ({data_type}, {rows} rows)");
        }
        BodySummary::Delete {
            rows,
            min_ts,
            max_ts,
        } => {
            println!("  Kind:       delete ({rows} keys)");
            if let (Some(min), Some(max)) = (min_ts, max_ts) {
                println!("  Timestamps: {min}..={max}");
            }
        }
        BodySummary::Stats { min, max, .. } => {
            println!("  Kind:       stats");
            match (min, max) {
                (Some(min), Some(max)) => println!("  Keys:       {min}..={max}"),
                _ => println!("  Keys:       none"),
            }
        }
    }
}
