//! Data layer: core types, loading, generation, filtering and export.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet      GeneratorConfig (seed)
//!        │                                   │
//!        ▼                                   ▼
//!   ┌──────────┐                       ┌───────────┐
//!   │  loader   │  resolve columns      │ generator │  beta mixture
//!   └──────────┘                       └───────────┘
//!        │                                   │
//!        └──────────────┬────────────────────┘
//!                       ▼
//!                ┌──────────────┐
//!                │   Dataset     │  Vec<Record>, classified by ThresholdTable
//!                └──────────────┘
//!                       │
//!                       ▼
//!                ┌──────────┐
//!                │  filter   │  apply predicates → filtered indices
//!                └──────────┘
//!                       │
//!                       ▼
//!                ┌──────────┐
//!                │  export   │  filtered rows → csv / json / parquet
//!                └──────────┘
//! ```

pub mod export;
pub mod filter;
pub mod generator;
pub mod loader;
pub mod model;
