pub mod backend;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod ipc;
pub mod models;
pub mod monitors;
pub mod navigation;
pub mod paths;
pub mod request;
pub mod settings;
pub mod trial;

#[cfg(test)]
pub(crate) mod testing;
