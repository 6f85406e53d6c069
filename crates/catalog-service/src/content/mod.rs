//! Catalog content (services, channels, organizations, general
//! descriptions) driven through the lifecycle engine.

pub mod service;

pub use service::ContentService;
