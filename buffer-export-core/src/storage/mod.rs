pub mod checksum;
pub mod metadata;
pub mod output_container;
