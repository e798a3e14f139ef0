pub mod block_writer;
pub mod sample_buffer;
pub mod shared_buffer;
