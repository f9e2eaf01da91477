//! Property-based test generators using proptest.
//!
//! Provides strategies for generating batches that fit the fixture schema,
//! delete batches, and storage key parts.

use crate::fixtures::{PK_FIELD_ID, VECTOR_DIM};
use binlog_codec::{
    DeleteData, FieldData, InsertData, PrimaryKey, ROW_ID_FIELD_ID, TIMESTAMP_FIELD_ID,
};
use binlog_io::LogType;
use proptest::prelude::*;

/// Strategy for generating primary keys of either type.
pub fn primary_key_strategy() -> impl Strategy<Value = PrimaryKey> {
    prop_oneof![
        any::<i64>().prop_map(PrimaryKey::Int64),
        "[a-zA-Z0-9_-]{1,24}".prop_map(PrimaryKey::VarChar),
    ]
}

/// Strategy for generating a log type.
pub fn log_type_strategy() -> impl Strategy<Value = LogType> {
    prop_oneof![
        Just(LogType::Insert),
        Just(LogType::Stats),
        Just(LogType::Delta),
    ]
}

/// Strategy for generating storage roots, including the empty root.
pub fn root_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("([a-z][a-z0-9_]{0,7}(/[a-z][a-z0-9_]{0,7}){0,2})?")
        .expect("Invalid regex")
}

/// Strategy for generating insert batches that fit the fixture schema.
pub fn insert_data_strategy(max_rows: usize) -> impl Strategy<Value = InsertData> {
    prop::collection::vec(
        (
            any::<i64>(),
            "[ -~]{0,32}",
            prop::array::uniform4(-1.0e3f32..1.0e3),
        ),
        0..=max_rows,
    )
    .prop_map(|rows| {
        let ids: Vec<i64> = (0..rows.len() as i64).collect();
        InsertData::new()
            .with_field(ROW_ID_FIELD_ID, FieldData::Int64(ids.clone()))
            .with_field(TIMESTAMP_FIELD_ID, FieldData::Int64(ids))
            .with_field(
                PK_FIELD_ID,
                FieldData::Int64(rows.iter().map(|r| r.0).collect()),
            )
            .with_field(
                101,
                FieldData::VarChar(rows.iter().map(|r| r.1.clone()).collect()),
            )
            .with_field(
                102,
                FieldData::FloatVector {
                    dim: VECTOR_DIM,
                    data: rows.iter().flat_map(|r| r.2).collect(),
                },
            )
    })
}

/// Strategy for generating delete batches of int64 keys.
pub fn delete_data_strategy(max_rows: usize) -> impl Strategy<Value = DeleteData> {
    prop::collection::vec((any::<i64>(), any::<u64>()), 0..=max_rows).prop_map(|rows| {
        let mut data = DeleteData::new();
        for (pk, ts) in rows {
            data.append(PrimaryKey::Int64(pk), ts);
        }
        data
    })
}
