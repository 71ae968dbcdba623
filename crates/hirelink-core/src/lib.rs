pub mod backend;
pub mod models;
pub mod search;
