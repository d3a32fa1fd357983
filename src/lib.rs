//! Bedboard - 病床看板
//!
//! 医院床位可用性实时目录

pub mod api;
pub mod auth;
pub mod beds;
pub mod config;
pub mod error;
pub mod storage;

pub use anyhow::Result;
