//! Ledger records.
//!
//! This module contains everything related to records:
//! - The `Record` model and `NewRecord` builder for creating records
//! - Database functions for storing, updating and deleting records
//! - The filter shared by the record list and the CSV export
//! - The JSON endpoints and the streamed CSV download

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod export;
mod export_endpoint;
mod filter;
mod list_endpoint;
mod query;

pub use core::{
    CreateRecordRequest, NewRecord, Record, RecordChanges, UpdateRecordRequest, count_records,
    create_record, create_record_table, delete_record, update_record,
};
pub use create_endpoint::create_record_endpoint;
pub use delete_endpoint::delete_record_endpoint;
pub use edit_endpoint::edit_record_endpoint;
pub use export::{CSV_HEADER, escape_csv_field};
pub use export_endpoint::export_records_endpoint;
pub use filter::{RecordFilter, RecordQuery};
pub use list_endpoint::list_records_endpoint;
pub use query::{RecordRow, get_record_rows};

pub(crate) use core::insert_record;

#[cfg(test)]
pub use core::get_record;
