pub mod json_store;

pub use json_store::{parse_records, JsonFileStore, RecordStore};
