mod database {
    pub mod actions;
    pub mod connection;
    pub mod error;
    pub mod filters;
    pub mod form;
    pub mod import;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod api;
pub mod config;
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
