pub mod bridge;
pub mod device_session;
