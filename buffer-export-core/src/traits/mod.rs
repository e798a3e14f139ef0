pub mod container_backend;
pub mod export_delegate;
pub mod sample_source;
