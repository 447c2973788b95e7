//! Hash-based aggregation executor for AGGREGATE.
//!
//! This module implements a grouping executor that supports:
//! - Grouping by any number of fields (or none, giving a single group)
//! - One aggregate function per invocation: COUNT, SUM, AVG, MIN, MAX
//! - Lenient numeric coercion: values that cannot be read as numbers are
//!   skipped by SUM and AVG rather than failing the formula
//!
//! Groups are emitted in the order their key was first seen.

use crate::access::{Record, Value};
use crate::error::{EngineError, EngineResult};
use crate::executor::Executor;
use anyhow::{bail, Result};
use indexmap::IndexMap;
use log::{debug, trace};
use std::cmp::Ordering;

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// COUNT(x) - number of records in the group
    Count,
    /// SUM(x) - sum of the numeric readings of x, 0 for none
    Sum,
    /// AVG(x) - mean of the numeric readings of x, NULL for none
    Avg,
    /// MIN(x) - smallest non-NULL value of x
    Min,
    /// MAX(x) - largest non-NULL value of x
    Max,
}

impl AggregateFunction {
    /// Returns the name of the aggregate function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Look up a function by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }
}

/// Specification for an aggregate computation, e.g. `SUM(salary)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    /// The aggregate function to apply
    pub function: AggregateFunction,
    /// Field to aggregate; `None` for `*` or an empty argument
    pub field: Option<String>,
    /// Name of the result field, `FUNC(field)`
    pub output_name: String,
}

impl AggregateSpec {
    /// Create a new aggregate specification
    pub fn new(function: AggregateFunction, field: Option<String>) -> Self {
        let output_name = format!(
            "{}({})",
            function.name(),
            field.as_deref().unwrap_or("*")
        );
        Self {
            function,
            field,
            output_name,
        }
    }

    /// Parse `FUNC(field)`.
    ///
    /// Trailing `)` characters that have no matching `(` are dropped first,
    /// since a spec written as the last argument of AGGREGATE can pick them
    /// up. The function name is case-insensitive and reported in upper case.
    pub fn parse(text: &str) -> EngineResult<Self> {
        let mut spec = text.trim();
        while spec.ends_with(')') && spec.matches('(').count() < spec.matches(')').count() {
            spec = spec[..spec.len() - 1].trim_end();
        }

        let malformed = || {
            EngineError::MalformedFormula(format!("Invalid aggregate spec '{}'", text.trim()))
        };
        let open = spec.find('(').ok_or_else(malformed)?;
        let close = spec.rfind(')').ok_or_else(malformed)?;
        if close < open {
            return Err(malformed());
        }

        let name = spec[..open].trim();
        let function = AggregateFunction::from_name(name).ok_or_else(|| {
            EngineError::MalformedFormula(format!(
                "Unknown aggregate function: {}",
                name.to_uppercase()
            ))
        })?;

        let field = spec[open + 1..close].trim();
        let mut aggregate = Self::new(
            function,
            match field {
                "" | "*" => None,
                field => Some(field.to_string()),
            },
        );
        // Keep the written argument in the output name, including an empty one
        aggregate.output_name = format!("{}({})", function.name(), field);
        Ok(aggregate)
    }
}

/// Running numeric total that stays integral until a float shows up
#[derive(Debug, Clone, Copy, PartialEq)]
enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, n: &Value) -> Total {
        match (self, n) {
            (Total::Int(a), Value::Int(b)) => match a.checked_add(*b) {
                Some(sum) => Total::Int(sum),
                None => Total::Float(a as f64 + *b as f64),
            },
            (Total::Int(a), other) => Total::Float(a as f64 + other.as_f64().unwrap_or(0.0)),
            (Total::Float(a), other) => Total::Float(a + other.as_f64().unwrap_or(0.0)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Total::Int(n) => n as f64,
            Total::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Total::Int(n) => Value::Int(n),
            Total::Float(f) => Value::Float(f),
        }
    }
}

/// State for tracking aggregate values during computation
#[derive(Debug, Clone)]
struct AggregateState {
    /// Records seen, for COUNT
    count: i64,
    /// For SUM and AVG
    total: Total,
    /// For AVG - number of values that contributed to `total`
    numeric_count: i64,
    /// For MIN
    min: Option<Value>,
    /// For MAX
    max: Option<Value>,
}

impl AggregateState {
    fn new() -> Self {
        Self {
            count: 0,
            total: Total::Int(0),
            numeric_count: 0,
            min: None,
            max: None,
        }
    }

    /// Update the state with one record's value; `None` means the record
    /// as a whole (`*`), which only COUNT can use.
    fn update(&mut self, value: Option<&Value>, function: AggregateFunction) {
        match function {
            AggregateFunction::Count => self.count += 1,
            AggregateFunction::Sum | AggregateFunction::Avg => {
                let Some(value) = value.filter(|v| !v.is_null()) else {
                    return;
                };
                match value.to_number() {
                    Some(n) => {
                        self.total = self.total.add(&n);
                        self.numeric_count += 1;
                    }
                    None => debug!("{} skips non-numeric value {}", function.name(), value),
                }
            }
            AggregateFunction::Min => {
                if let Some(value) = value.filter(|v| !v.is_null()) {
                    if self
                        .min
                        .as_ref()
                        .map_or(true, |current| value.total_cmp(current) == Ordering::Less)
                    {
                        self.min = Some(value.clone());
                    }
                }
            }
            AggregateFunction::Max => {
                if let Some(value) = value.filter(|v| !v.is_null()) {
                    if self
                        .max
                        .as_ref()
                        .map_or(true, |current| value.total_cmp(current) == Ordering::Greater)
                    {
                        self.max = Some(value.clone());
                    }
                }
            }
        }
    }

    /// Get the final aggregate value
    fn finalize(&self, function: AggregateFunction) -> Value {
        match function {
            AggregateFunction::Count => Value::Int(self.count),
            AggregateFunction::Sum => self.total.into_value(),
            AggregateFunction::Avg => {
                if self.numeric_count > 0 {
                    Value::Float(self.total.as_f64() / self.numeric_count as f64)
                } else {
                    Value::Null
                }
            }
            AggregateFunction::Min => self.min.clone().unwrap_or(Value::Null),
            AggregateFunction::Max => self.max.clone().unwrap_or(Value::Null),
        }
    }
}

/// Canonical text of a group's key values. Whole floats key like the
/// equal integer, so `1` and `1.0` share a group.
fn group_key(values: &[Value]) -> String {
    serde_json::Value::Array(values.iter().map(key_json).collect()).to_string()
}

fn key_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            serde_json::Value::from(*f as i64)
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(key_json).collect()),
        other => other.to_json(),
    }
}

/// Hash-based aggregation executor
pub struct AggregateExecutor<'a> {
    /// Child executor providing input records
    child: Box<dyn Executor + 'a>,
    /// Fields to group by, as written
    group_by: Vec<String>,
    /// Aggregate to compute per group
    aggregate: AggregateSpec,
    /// Output records, built during `init()`
    results: std::vec::IntoIter<Record>,
    initialized: bool,
}

impl<'a> AggregateExecutor<'a> {
    /// Create a new aggregate executor
    pub fn new(
        child: Box<dyn Executor + 'a>,
        group_by: Vec<String>,
        aggregate: AggregateSpec,
    ) -> Self {
        Self {
            child,
            group_by,
            aggregate,
            results: Vec::new().into_iter(),
            initialized: false,
        }
    }

    /// Process all input records and build groups
    fn consume_input(&mut self) -> Result<IndexMap<String, (Vec<Value>, AggregateState)>> {
        let mut groups: IndexMap<String, (Vec<Value>, AggregateState)> = IndexMap::new();

        // Without grouping fields every record falls into one group, which
        // exists even when the input is empty
        if self.group_by.is_empty() {
            groups.insert(String::new(), (Vec::new(), AggregateState::new()));
        }

        while let Some(record) = self.child.next()? {
            let key_values: Vec<Value> = self
                .group_by
                .iter()
                .map(|field| record.resolve(field).cloned().unwrap_or(Value::Null))
                .collect();
            let key = if self.group_by.is_empty() {
                String::new()
            } else {
                group_key(&key_values)
            };

            let (_, state) = groups
                .entry(key)
                .or_insert_with(|| (key_values, AggregateState::new()));

            let value = self
                .aggregate
                .field
                .as_deref()
                .map(|field| record.resolve(field).unwrap_or(&Value::Null));
            state.update(value, self.aggregate.function);
        }

        Ok(groups)
    }
}

impl Executor for AggregateExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;

        let groups = self.consume_input()?;
        trace!(
            "{} over {} group(s)",
            self.aggregate.output_name,
            groups.len()
        );

        let results: Vec<Record> = groups
            .into_values()
            .map(|(key_values, state)| {
                let mut record: Record = self.group_by.iter().cloned().zip(key_values).collect();
                record.insert(
                    self.aggregate.output_name.clone(),
                    state.finalize(self.aggregate.function),
                );
                record
            })
            .collect();

        self.results = results.into_iter();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        Ok(self.results.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::collect;
    use crate::executor::tests::MockExecutor;

    fn employees() -> Vec<Record> {
        vec![
            Record::from_iter([
                ("id", Value::Int(1)),
                ("dept", Value::from("A")),
                ("salary", Value::Int(100)),
            ]),
            Record::from_iter([
                ("id", Value::Int(2)),
                ("dept", Value::from("A")),
                ("salary", Value::Int(200)),
            ]),
            Record::from_iter([
                ("id", Value::Int(3)),
                ("dept", Value::from("B")),
                ("salary", Value::Int(50)),
            ]),
        ]
    }

    fn aggregate(records: Vec<Record>, group_by: &[&str], spec: &str) -> Result<Vec<Record>> {
        let spec = AggregateSpec::parse(spec)?;
        let group_by = group_by.iter().map(|s| s.to_string()).collect();
        let mut executor = AggregateExecutor::new(MockExecutor::boxed(records), group_by, spec);
        collect(&mut executor)
    }

    fn single_value(result: &[Record], field: &str) -> Value {
        assert_eq!(result.len(), 1);
        result[0].get(field).cloned().unwrap_or(Value::Null)
    }

    #[test]
    fn test_spec_parse() -> EngineResult<()> {
        let spec = AggregateSpec::parse("sum(salary)")?;
        assert_eq!(spec.function, AggregateFunction::Sum);
        assert_eq!(spec.field.as_deref(), Some("salary"));
        assert_eq!(spec.output_name, "SUM(salary)");

        let spec = AggregateSpec::parse("COUNT(*)")?;
        assert_eq!(spec.field, None);
        assert_eq!(spec.output_name, "COUNT(*)");

        // Stray closing parentheses are dropped
        let spec = AggregateSpec::parse("AVG(salary)))")?;
        assert_eq!(spec.output_name, "AVG(salary)");
        Ok(())
    }

    #[test]
    fn test_spec_parse_errors() {
        assert!(matches!(
            AggregateSpec::parse("salary"),
            Err(EngineError::MalformedFormula(_))
        ));
        assert_eq!(
            AggregateSpec::parse("MEDIAN(salary)"),
            Err(EngineError::MalformedFormula(
                "Unknown aggregate function: MEDIAN".to_string()
            ))
        );
    }

    #[test]
    fn test_group_by_sum() -> Result<()> {
        let result = aggregate(employees(), &["dept"], "SUM(salary)")?;
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0].fields().collect::<Vec<_>>(),
            vec![("dept", &Value::from("A")), ("SUM(salary)", &Value::Int(300))]
        );
        assert_eq!(
            result[1].fields().collect::<Vec<_>>(),
            vec![("dept", &Value::from("B")), ("SUM(salary)", &Value::Int(50))]
        );
        Ok(())
    }

    #[test]
    fn test_count_without_grouping() -> Result<()> {
        let result = aggregate(employees(), &[], "COUNT(*)")?;
        assert_eq!(single_value(&result, "COUNT(*)"), Value::Int(3));

        let result = aggregate(vec![], &[], "COUNT(*)")?;
        assert_eq!(single_value(&result, "COUNT(*)"), Value::Int(0));
        Ok(())
    }

    #[test]
    fn test_empty_input_with_grouping() -> Result<()> {
        assert!(aggregate(vec![], &["dept"], "COUNT(*)")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_group_results() -> Result<()> {
        assert_eq!(
            single_value(&aggregate(vec![], &[], "SUM(salary)")?, "SUM(salary)"),
            Value::Int(0)
        );
        assert_eq!(
            single_value(&aggregate(vec![], &[], "AVG(salary)")?, "AVG(salary)"),
            Value::Null
        );
        assert_eq!(
            single_value(&aggregate(vec![], &[], "MIN(salary)")?, "MIN(salary)"),
            Value::Null
        );
        Ok(())
    }

    #[test]
    fn test_avg_min_max() -> Result<()> {
        let result = aggregate(employees(), &[], "AVG(salary)")?;
        assert_eq!(
            single_value(&result, "AVG(salary)"),
            Value::Float(350.0 / 3.0)
        );
        let result = aggregate(employees(), &[], "MIN(salary)")?;
        assert_eq!(single_value(&result, "MIN(salary)"), Value::Int(50));
        let result = aggregate(employees(), &[], "max(dept)")?;
        assert_eq!(single_value(&result, "MAX(dept)"), Value::from("B"));
        Ok(())
    }

    #[test]
    fn test_non_numeric_values_are_skipped() -> Result<()> {
        let records = vec![
            Record::from_iter([("v", Value::from("10"))]),
            Record::from_iter([("v", Value::from("abc"))]),
            Record::from_iter([("v", Value::Null)]),
            Record::from_iter([("v", Value::Float(2.5))]),
            Record::from_iter([("other", Value::Int(1))]),
        ];
        let result = aggregate(records.clone(), &[], "SUM(v)")?;
        assert_eq!(single_value(&result, "SUM(v)"), Value::Float(12.5));

        let result = aggregate(records.clone(), &[], "AVG(v)")?;
        assert_eq!(single_value(&result, "AVG(v)"), Value::Float(6.25));

        // COUNT counts records, not values
        let result = aggregate(records, &[], "COUNT(v)")?;
        assert_eq!(single_value(&result, "COUNT(v)"), Value::Int(5));
        Ok(())
    }

    #[test]
    fn test_missing_group_field_is_null_group() -> Result<()> {
        let records = vec![
            Record::from_iter([("dept", Value::from("A"))]),
            Record::from_iter([("name", Value::from("x"))]),
            Record::from_iter([("dept", Value::Null)]),
        ];
        let result = aggregate(records, &["dept"], "COUNT(*)")?;
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].get("dept"), Some(&Value::Null));
        assert_eq!(result[1].get("COUNT(*)"), Some(&Value::Int(2)));
        Ok(())
    }

    #[test]
    fn test_group_key_distinguishes_types() -> Result<()> {
        let records = vec![
            Record::from_iter([("k", Value::Int(1))]),
            Record::from_iter([("k", Value::from("1"))]),
        ];
        assert_eq!(aggregate(records, &["k"], "COUNT(*)")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_whole_float_shares_int_group() -> Result<()> {
        let records = vec![
            Record::from_iter([("k", Value::Int(1))]),
            Record::from_iter([("k", Value::Float(1.0))]),
            Record::from_iter([("k", Value::Float(1.5))]),
        ];
        let result = aggregate(records, &["k"], "COUNT(*)")?;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get("k"), Some(&Value::Int(1)));
        assert_eq!(result[0].get("COUNT(*)"), Some(&Value::Int(2)));
        assert_eq!(result[1].get("k"), Some(&Value::Float(1.5)));
        Ok(())
    }
}
