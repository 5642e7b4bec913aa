pub mod auth;
pub mod ui;
