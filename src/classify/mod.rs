//! Ingredient taxonomy: rules that name an ingredient's class, and the table
//! that places every class under a type and a group.

use crate::error::LoadError;
use crate::model::IngredientType;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod rules;
mod types;

pub use rules::{ClassificationRule, RuleSet};
pub use types::TypeHierarchy;

/// Rule set and type hierarchy, checked against each other.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: RuleSet,
    types: TypeHierarchy,
}

impl Catalog {
    /// Load both tables and refuse to continue if a rule names a class the
    /// hierarchy does not know.
    pub fn load(rules_path: impl AsRef<Path>, types_path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let rules = RuleSet::load(rules_path)?;
        let types = TypeHierarchy::load(types_path)?;
        let catalog = Self::new(rules, types)?;
        info!(
            "Loaded {} classification rules and {} ingredient classes",
            catalog.rules.len(),
            catalog.types.len()
        );
        Ok(catalog)
    }

    pub fn new(rules: RuleSet, types: TypeHierarchy) -> Result<Self, LoadError> {
        let missing: Vec<String> = rules
            .class_names()
            .filter(|class| types.type_of(class).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingTypes { classes: missing });
        }
        Ok(Self { rules, types })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    pub fn type_of(&self, class: &str) -> Option<&IngredientType> {
        self.types.type_of(class)
    }
}

/// One data row of a tab-separated table.
struct Row {
    /// 1-based, counting the header
    line: usize,
    columns: Vec<String>,
}

/// Read a tab-separated table. The first line is a header and is skipped;
/// remaining lines are trimmed and blank ones dropped.
fn read_table(path: &Path) -> Result<(PathBuf, Vec<Row>), LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = text
        .lines()
        .enumerate()
        .skip(1)
        .filter_map(|(i, line)| {
            let line = line.trim();
            (!line.is_empty()).then(|| Row {
                line: i + 1,
                columns: line.split('\t').map(str::to_string).collect(),
            })
        })
        .collect();
    Ok((path.to_path_buf(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_table_skips_header_and_blank_lines() {
        let file = table("name\tpattern\n\nkale\t\t1\n   \n  beans  \n");
        let (_, rows) = read_table(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[0].columns, vec!["kale", "", "1"]);
        assert_eq!(rows[1].line, 5);
        assert_eq!(rows[1].columns, vec!["beans"]);
    }

    #[test]
    fn test_catalog_rejects_rules_without_types() {
        let rules = table("name\tpattern\tpriority\npoultry\tchicken\nkale\n");
        let types = table("class\ttype\tgroup\npoultry\tpoultry\tmeat\n");
        match Catalog::load(rules.path(), types.path()) {
            Err(LoadError::MissingTypes { classes }) => assert_eq!(classes, vec!["kale"]),
            other => panic!("expected MissingTypes, got {other:?}"),
        }
    }

    #[test]
    fn test_catalog_resolves_rule_to_type() {
        let rules = table("name\tpattern\tpriority\npoultry\tchicken\n");
        let types = table("class\ttype\tgroup\npoultry\tpoultry\tmeat\n");
        let catalog = Catalog::load(rules.path(), types.path()).unwrap();
        assert_eq!(catalog.type_of("poultry").map(|t| t.group.as_str()), Some("meat"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RuleSet::load("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
