pub mod csv_writer;
pub mod flux_log;
pub mod summary;
