//! Path command implementation.

use binlog_io::parse_log_path;

/// Runs the path command.
pub fn run(root: &str, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = parse_log_path(root, key)?;

    println!("Log type:   {}", path.log_type);
    println!("Collection: {}", path.collection_id);
    println!("Partition:  {}", path.partition_id);
    println!("Segment:    {}", path.segment_id);
    match path.field_id {
        Some(field_id) => println!("Field:      {}", field_id),
        None => println!("Field:      -"),
    }
    println!("Log id:     {}", path.log_id);
    Ok(())
}
