pub mod app;
pub mod catalog;
pub mod favorites;
pub mod models;
pub mod notify;
pub mod render;
