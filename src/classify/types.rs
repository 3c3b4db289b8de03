use super::read_table;
use crate::error::LoadError;
use crate::model::IngredientType;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// class -> (type, group). A type always sits in the same group.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    by_class: HashMap<String, IngredientType>,
}

impl TypeHierarchy {
    /// Load a table with exactly three columns: class, type and group. Values
    /// may be wrapped in double quotes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let (path, rows) = read_table(path.as_ref())?;
        let mut by_class: HashMap<String, IngredientType> = HashMap::with_capacity(rows.len());
        let mut group_of_type: HashMap<String, String> = HashMap::new();

        for row in rows {
            if row.columns.len() != 3 {
                return Err(LoadError::ColumnCount {
                    path,
                    line: row.line,
                    expected: "3",
                    found: row.columns.len(),
                });
            }
            let class = unquote(&row.columns[0]).to_string();
            let type_name = unquote(&row.columns[1]).to_string();
            let group = unquote(&row.columns[2]).to_string();

            if by_class.contains_key(&class) {
                return Err(LoadError::DuplicateClass {
                    path,
                    line: row.line,
                    name: class,
                });
            }
            match group_of_type.get(&type_name) {
                Some(existing) if *existing != group => {
                    return Err(LoadError::TypeGroupConflict {
                        path,
                        line: row.line,
                        existing: existing.clone(),
                        type_name,
                        class,
                        group,
                    });
                }
                Some(_) => {}
                None => {
                    group_of_type.insert(type_name.clone(), group.clone());
                }
            }
            by_class.insert(class, IngredientType { type_name, group });
        }
        Ok(Self { by_class })
    }

    pub fn type_of(&self, class: &str) -> Option<&IngredientType> {
        self.by_class.get(class)
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }

    /// group -> types in that group, both sorted.
    pub fn types_by_group(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for t in self.by_class.values() {
            groups
                .entry(t.group.clone())
                .or_default()
                .insert(t.type_name.clone());
        }
        groups
    }
}

impl FromIterator<(String, IngredientType)> for TypeHierarchy {
    fn from_iter<I: IntoIterator<Item = (String, IngredientType)>>(iter: I) -> Self {
        Self {
            by_class: iter.into_iter().collect(),
        }
    }
}

fn unquote(s: &str) -> &str {
    if s.len() > 1 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
