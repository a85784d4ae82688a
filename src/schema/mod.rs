//! Canonical schema model and the builder that produces it from facts.

mod builder;
mod category;
mod model;

pub use builder::{build_model, ModelBuilder, NOW_DEFAULT, UUID_DEFAULT};
pub use category::Category;
pub use model::{
    Column, ColumnTarget, Index, Model, Relationship, RelationshipOrigin, Table,
    CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
};
