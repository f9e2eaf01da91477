//! Benchmark utilities.

#![warn(missing_docs)]

use binlog_codec::{
    CollectionMeta, CollectionSchema, DataType, DeleteData, FieldData, FieldSchema, InsertData,
    PrimaryKey, ROW_ID_FIELD_ID, TIMESTAMP_FIELD_ID,
};
use rand::Rng;

/// Collection metadata with an int64 key, a varchar and a `dim` float vector.
pub fn bench_meta(dim: usize) -> CollectionMeta {
    CollectionMeta::new(
        1,
        CollectionSchema::new("bench")
            .with_field(FieldSchema::new(100, "pk", DataType::Int64).primary_key())
            .with_field(FieldSchema::new(101, "body", DataType::VarChar))
            .with_field(FieldSchema::float_vector(102, "embedding", dim)),
    )
}

/// Generate a random insert batch for [`bench_meta`].
pub fn random_insert_data(rows: usize, dim: usize) -> InsertData {
    let mut rng = rand::thread_rng();
    let ids: Vec<i64> = (0..rows as i64).collect();
    let body: Vec<String> = (0..rows)
        .map(|_| {
            let len = rng.gen_range(8..64);
            (0..len).map(|_| rng.gen_range('a'..='z')).collect()
        })
        .collect();
    let vectors: Vec<f32> = (0..rows * dim).map(|_| rng.gen()).collect();

    InsertData::new()
        .with_field(ROW_ID_FIELD_ID, FieldData::Int64(ids.clone()))
        .with_field(TIMESTAMP_FIELD_ID, FieldData::Int64(vec![0; rows]))
        .with_field(100, FieldData::Int64(ids))
        .with_field(101, FieldData::VarChar(body))
        .with_field(102, FieldData::FloatVector { dim, data: vectors })
}

/// Generate a random delete batch.
pub fn random_delete_data(rows: usize) -> DeleteData {
    let mut rng = rand::thread_rng();
    let mut data = DeleteData::new();
    for _ in 0..rows {
        data.append(PrimaryKey::Int64(rng.gen()), rng.gen());
    }
    data
}
