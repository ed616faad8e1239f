pub mod handler;
pub mod hub;

pub use hub::FichajeHub;
