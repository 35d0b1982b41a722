pub mod actions;
pub mod error;
pub mod gate;
pub mod health;
pub mod pages;

pub use error::AppError;
