//! Logic Module - Ingestion & Modeling Engines
//!
//! Stages, in pipeline order:
//! - `schema/` - Schema Resolver (descriptor -> ordered column names)
//! - `linkage/` - Record Linkage Engine (composite-key inner join)
//! - `cleaning` - Deduplication + forward-fill imputation
//! - `features/` - Feature/Target Extractor and encoder
//! - `model/` - Random forest, metrics, cross-validation, artifact
//!
//! Around them: `table/` (tabular data + CSV loading), `explore` (EDA and
//! dashboard data), `guard` (artifact protection), `config`, `error`, and the
//! `pipeline` orchestrator.

// Data
pub mod error;
pub mod table;

// Stages
pub mod schema;
pub mod linkage;
pub mod cleaning;
pub mod features;
pub mod model;

// Around the stages
pub mod config;
pub mod explore;
pub mod guard;
pub mod pipeline;
