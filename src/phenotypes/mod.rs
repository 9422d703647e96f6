pub mod designs;
pub mod models;
pub mod wells;
