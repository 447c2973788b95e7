use crate::access::Value;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Qualifier naming the left side of a join
pub const LEFT_QUALIFIER: &str = "L";
/// Qualifier naming the right side of a join
pub const RIGHT_QUALIFIER: &str = "R";

/// A record: an ordered mapping from field name to value.
///
/// Records produced by JOIN additionally carry the two input records they
/// were merged from, so later operators can resolve `L.field` / `R.field`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
    sides: Option<Box<JoinSides>>,
}

/// The pair of source records behind a joined record
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSides {
    pub left: Record,
    pub right: Record,
}

/// An ordered sequence of records
pub type Relation = Vec<Record>;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach join sides to this record
    pub fn with_sides(mut self, left: Record, right: Record) -> Self {
        self.sides = Some(Box::new(JoinSides { left, right }));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Insert or replace a field, keeping its original position when replaced
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn sides(&self) -> Option<&JoinSides> {
        self.sides.as_deref()
    }

    /// Look up the join side named by a qualifier (`L` or `R`)
    pub fn side(&self, qualifier: &str) -> Option<&Record> {
        let sides = self.sides.as_deref()?;
        match qualifier {
            LEFT_QUALIFIER => Some(&sides.left),
            RIGHT_QUALIFIER => Some(&sides.right),
            _ => None,
        }
    }

    /// Resolve a possibly qualified field reference.
    ///
    /// Checks, in order: an exact field name match, the last dot-separated
    /// segment of the reference, and finally that segment inside the left and
    /// then right join side.
    pub fn resolve(&self, field: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(field) {
            return Some(value);
        }
        let last = field.rsplit('.').next().unwrap_or(field);
        if let Some(value) = self.fields.get(last) {
            return Some(value);
        }
        let sides = self.sides.as_deref()?;
        sides
            .left
            .fields
            .get(last)
            .or_else(|| sides.right.fields.get(last))
    }

    /// Deterministic, field-order independent representation of the record
    /// contents, used for set membership.
    pub fn canonical_key(&self) -> String {
        let mut entries: Vec<(&str, serde_json::Value)> = self
            .fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_json()))
            .collect();
        if let Some(sides) = &self.sides {
            entries.push((
                LEFT_QUALIFIER,
                serde_json::Value::String(sides.left.canonical_key()),
            ));
            entries.push((
                RIGHT_QUALIFIER,
                serde_json::Value::String(sides.right.canonical_key()),
            ));
        }
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let pairs = entries
            .into_iter()
            .map(|(name, value)| {
                serde_json::Value::Array(vec![serde_json::Value::String(name.to_string()), value])
            })
            .collect();
        serde_json::Value::Array(pairs).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            sides: None,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
