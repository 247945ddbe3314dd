//! Core imgcluster library (intake policy, normalizer, previews, correlation,
//! clustering client, config).

pub mod config;
pub mod error;
pub mod images;
pub mod pipeline;
pub mod service;
pub mod session;
