pub mod capture_source;
pub mod pcm_source;
