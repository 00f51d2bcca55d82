//! Starts a server that will handle http graphql requests against a document store.

#![warn(unreachable_pub)]

mod authentication;
mod axum_factory;
pub mod configuration;
mod error;
mod executable;
pub mod graphql;
pub mod json_ext;
mod services;
mod spec;
pub mod storage;

pub use axum_factory::main_router;
pub use configuration::Configuration;
pub use executable::main;
pub use services::ExecutionService;
pub use spec::Projection;
