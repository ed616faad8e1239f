pub mod error;
pub mod patch;
pub mod phone;
pub mod response;
pub mod service_time;
pub mod tokens;
