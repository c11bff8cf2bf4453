pub mod endpoints;
pub mod records;
pub mod request_logs;
pub mod tables;
