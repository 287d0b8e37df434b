// src/lib.rs

//! pagewatch: web page change detection with SMS alerts

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
