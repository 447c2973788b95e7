//! Access layer for record-oriented operations.
//!
//! This module provides the in-memory data model every operator works on:
//!
//! - **Value**: dynamically typed field values (scalars and lists)
//! - **Record**: an ordered field map, optionally carrying the two join sides
//!   it was built from
//! - **Relation**: an ordered sequence of records
//!
//! Records compare for set membership through their canonical key, which is
//! independent of field insertion order.

pub mod record;
pub mod value;

pub use record::{JoinSides, Record, Relation, LEFT_QUALIFIER, RIGHT_QUALIFIER};
pub use value::{DataType, Value};
