//! Relation catalog: the named base relations a formula is evaluated against.

use crate::access::{Record, Relation, Value};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

/// Mapping from relation name to relation.
///
/// The catalog is never mutated by evaluation; operators read base relations
/// and build new records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    relations: HashMap<String, Relation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation, replacing any relation with the same name
    pub fn insert(&mut self, name: impl Into<String>, relation: Relation) {
        self.relations.insert(name.into(), relation);
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        let catalog = Self::from_json_str(&text)
            .with_context(|| format!("Invalid data file {}", path.display()))?;
        info!(
            "Loaded {} relation(s) from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text).context("Invalid JSON format")?;
        Self::from_json(json)
    }

    /// Build a catalog from a JSON document of the form
    /// `{"Name": [{"field": value, ...}, ...], ...}`
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(document) = json else {
            bail!("Expected a JSON object mapping relation names to record arrays");
        };

        let mut catalog = Catalog::new();
        for (name, rows) in document {
            let serde_json::Value::Array(rows) = rows else {
                bail!("Relation '{}' is not an array of records", name);
            };

            let mut relation = Relation::with_capacity(rows.len());
            for (idx, row) in rows.into_iter().enumerate() {
                let serde_json::Value::Object(fields) = row else {
                    bail!("Record {} of relation '{}' is not an object", idx, name);
                };
                relation.push(
                    fields
                        .into_iter()
                        .map(|(field, value)| (field, Value::from(value)))
                        .collect::<Record>(),
                );
            }

            debug!("Relation '{}' has {} record(s)", name, relation.len());
            catalog.insert(name, relation);
        }
        Ok(catalog)
    }
}

impl FromIterator<(String, Relation)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Relation)>>(iter: I) -> Self {
        Self {
            relations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DATA: &str = r#"{
        "Employees": [
            {"id": 1, "dept": "A", "salary": 100},
            {"id": 2, "dept": "A", "salary": 200.5, "tags": ["x", "y"]},
            {"id": 3, "dept": null, "active": true, "meta": {"k": 1}}
        ],
        "Empty": []
    }"#;

    #[test]
    fn test_from_json_str() -> Result<()> {
        let catalog = Catalog::from_json_str(DATA)?;
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("Empty"));
        assert!(catalog.get("Empty").map(|r| r.is_empty()).unwrap_or(false));

        let employees = catalog.get("Employees").expect("Employees loaded");
        assert_eq!(employees.len(), 3);
        assert_eq!(employees[0].get("salary"), Some(&Value::Int(100)));
        assert_eq!(employees[1].get("salary"), Some(&Value::Float(200.5)));
        assert_eq!(
            employees[1].get("tags"),
            Some(&Value::List(vec![Value::from("x"), Value::from("y")]))
        );
        assert_eq!(employees[2].get("dept"), Some(&Value::Null));
        assert_eq!(employees[2].get("active"), Some(&Value::Boolean(true)));
        assert_eq!(employees[2].get("meta"), Some(&Value::from(r#"{"k":1}"#)));
        Ok(())
    }

    #[test]
    fn test_field_order_preserved() -> Result<()> {
        let catalog = Catalog::from_json_str(r#"{"T": [{"z": 1, "a": 2, "m": 3}]}"#)?;
        let record = &catalog.get("T").expect("T loaded")[0];
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        Ok(())
    }

    #[test]
    fn test_invalid_documents() {
        assert!(Catalog::from_json_str("not json").is_err());
        assert!(Catalog::from_json_str("[1, 2]").is_err());
        assert!(Catalog::from_json_str(r#"{"T": {"a": 1}}"#).is_err());
        assert!(Catalog::from_json_str(r#"{"T": [1]}"#).is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(DATA.as_bytes())?;

        let catalog = Catalog::load(file.path())?;
        assert_eq!(catalog.len(), 2);

        assert!(Catalog::load(Path::new("/definitely/not/here.json")).is_err());
        Ok(())
    }

    #[test]
    fn test_insert_and_collect() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());
        catalog.insert("A", vec![Record::from_iter([("x", Value::Int(1))])]);
        assert_eq!(catalog.len(), 1);

        let collected: Catalog = vec![("B".to_string(), Relation::new())].into_iter().collect();
        assert!(collected.contains("B"));
        assert!(!collected.contains("A"));
    }
}
