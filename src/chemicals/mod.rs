pub mod models;
pub mod quantities;
pub mod services;
