//! Cardiac troponin (cTnI) viewer.
//!
//! Loads or generates a table of troponin measurements, classifies every
//! row with a [`classify::ThresholdTable`], filters, summarises, plots and
//! exports the result.

pub mod app;
pub mod classify;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod stats;
pub mod ui;
