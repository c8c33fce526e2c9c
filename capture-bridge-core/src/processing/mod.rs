pub mod capture_handler;
pub mod conversion;
pub mod frame_reader;
pub mod sample_pool;
