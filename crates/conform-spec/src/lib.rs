//! Connector specification model for the conform form engine.
//!
//! This crate turns a JSON-Schema-like connector specification into an
//! ordered list of [`FieldSpec`]s that a form renderer can walk. It holds no
//! UI or form-state logic; those live in the `conform` crate.

pub mod field;
pub mod normalize;
pub mod order;

pub use field::{FieldKind, FieldSpec};
pub use normalize::{connector_schema, normalize};
pub use order::{assign_orders, sort_specs};
