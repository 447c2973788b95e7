//! A small relational-algebra engine.
//!
//! Formulas such as `PROJECT(SELECT(Employees, "salary > 75"), [name])` are
//! evaluated against a [`Catalog`] of in-memory relations loaded from JSON.
//!
//! ```
//! use relalg::{Catalog, Engine};
//!
//! let catalog = Catalog::from_json_str(
//!     r#"{"Employees": [{"name": "Ann", "salary": 100}, {"name": "Bob", "salary": 50}]}"#,
//! )?;
//! let result = Engine::new(catalog).evaluate("SELECT(Employees, salary > 75)")?;
//! assert_eq!(result.len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod access;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod executor;
pub mod expression;
pub mod formula;
pub mod planner;
pub mod render;

pub use access::{Record, Relation, Value};
pub use catalog::Catalog;
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, EngineResult};
