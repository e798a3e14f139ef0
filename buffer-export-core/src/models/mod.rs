pub mod error;
pub mod export_result;
pub mod format;
pub mod request;
pub mod state;
