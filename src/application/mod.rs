//! Application services: ranking, link materialization, rendering and export.

pub mod error;
pub mod export;
pub mod index;
pub mod relate;
pub mod render;
