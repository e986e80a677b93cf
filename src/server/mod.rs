pub mod accepting;
pub mod handling;
pub mod models;
