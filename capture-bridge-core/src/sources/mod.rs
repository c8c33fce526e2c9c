pub mod null;
pub mod synthetic;
