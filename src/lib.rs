//! # Quarry
//!
//! Infers a relational schema from an application's source tree and emits
//! Postgres DDL to create or evolve it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Project source tree                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [locator]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Source files (glob patterns, ignore list)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [extract] (parallel, per file)
//! ┌─────────────────────────────────────────────────────────┐
//! │   Schema facts: TableRef, ColumnRef, RelationshipHint    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema] (commutative merge)
//! ┌─────────────────────────────────────────────────────────┐
//! │   Canonical model: tables, columns, relationships        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!            ┌─────────────┼──────────────┐
//!            ▼ [synth]     ▼ [drift]      ▼ [report]
//!       full schema   incremental     analysis report
//!                      migration
//!                          │
//!                          ▼ [deploy]
//!           migration CLI, per-statement fallback
//! ```
//!
//! [`pipeline`] runs the whole flow once; [`watch`] reruns it on file
//! changes with debouncing and at most one run in flight.

pub mod config;
pub mod deploy;
pub mod drift;
pub mod extract;
pub mod facts;
pub mod locator;
pub mod migration;
pub mod naming;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod sql;
pub mod synth;
pub mod watch;

pub use config::Settings;
pub use facts::{SchemaFact, Warning};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
pub use schema::Model;
