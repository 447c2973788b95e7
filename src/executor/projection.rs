//! Projection executor implementation.
//!
//! Builds a new record per input record holding only the requested fields,
//! in the requested order. Field specifiers may rename the output field with
//! `field:alias` or `field AS alias`.

use crate::access::{Record, Value};
use crate::executor::Executor;
use anyhow::Result;

/// A single PROJECT field specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field reference resolved against the input record
    pub source: String,
    /// Output field name, if renamed
    pub alias: Option<String>,
}

impl FieldSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alias: None,
        }
    }

    pub fn with_alias(source: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alias: Some(alias.into()),
        }
    }

    /// Parse a specifier.
    ///
    /// `a:b` splits on the first colon. Otherwise, a whitespace separated
    /// specifier of at least three tokens whose second to last token is `AS`
    /// (any case) renames to the last token. Anything else is a plain field.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some((source, alias)) = spec.split_once(':') {
            return Self::with_alias(source.trim(), alias.trim());
        }

        let tokens: Vec<&str> = spec.split_whitespace().collect();
        if let [source @ .., keyword, alias] = tokens.as_slice() {
            if !source.is_empty() && keyword.eq_ignore_ascii_case("AS") {
                return Self::with_alias(source.join(" "), *alias);
            }
        }
        Self::new(spec)
    }

    /// Name of the field in the output record
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.source)
    }
}

/// Executor that projects records to a list of fields
pub struct ProjectionExecutor<'a> {
    /// Child executor that produces records
    child: Box<dyn Executor + 'a>,
    /// Fields to project, in output order
    fields: Vec<FieldSpec>,
}

impl<'a> ProjectionExecutor<'a> {
    /// Create a new projection executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces records
    /// * `fields` - Field specifiers in output order
    pub fn new(child: Box<dyn Executor + 'a>, fields: Vec<FieldSpec>) -> Self {
        Self { child, fields }
    }

    fn project(&self, record: &Record) -> Record {
        self.fields
            .iter()
            .map(|spec| {
                let value = record.resolve(&spec.source).cloned().unwrap_or(Value::Null);
                (spec.output_name().to_string(), value)
            })
            .collect()
    }
}

impl Executor for ProjectionExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.child.init()
    }

    fn next(&mut self) -> Result<Option<Record>> {
        match self.child.next()? {
            Some(record) => Ok(Some(self.project(&record))),
            None => Ok(None),
        }
    }
}
