use super::read_table;
use crate::error::LoadError;
use crate::model::{ClassifiedRecipe, IngredientClassification, IngredientName, Recipe};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::path::Path;

/// A named pattern. An ingredient name matching the pattern belongs to the
/// class called `name`.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub name: String,
    pub priority: i32,
    pattern: Regex,
}

impl ClassificationRule {
    /// Compile `pattern` (or the name itself, when `None`) for almost
    /// whole-word matching: "gin" must not match "aubergine", but "bean"
    /// still matches "beans".
    pub fn new(name: impl Into<String>, pattern: Option<&str>, priority: i32) -> Result<Self, regex::Error> {
        let name = name.into();
        let pattern = match pattern {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => default_pattern(&name),
        };
        let wrapped = format!("(^|[^A-Za-z])({pattern})([A-Za-z]{{0,2}})?($|[^A-Za-z])");
        let pattern = RegexBuilder::new(&wrapped).case_insensitive(true).build()?;
        Ok(Self {
            name,
            priority,
            pattern,
        })
    }

    /// Length of the text matched in `name`, if the rule applies at all.
    pub fn match_len(&self, name: &str) -> Option<usize> {
        self.pattern.find(name).map(|m| m.len())
    }
}

/// Lowercased name, each word escaped, words separated by any whitespace.
fn default_pattern(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// All classification rules, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Load a rule table with columns `name`, `pattern` (optional) and
    /// `priority` (optional, defaults to 0).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let (path, rows) = read_table(path.as_ref())?;
        let mut rules: Vec<ClassificationRule> = Vec::with_capacity(rows.len());
        for row in rows {
            let columns = &row.columns;
            if columns.len() > 3 {
                return Err(LoadError::ColumnCount {
                    path,
                    line: row.line,
                    expected: "at most 3",
                    found: columns.len(),
                });
            }
            let name = columns[0].as_str();
            let priority: i32 = match columns.get(2) {
                Some(value) => value.parse().map_err(|_| LoadError::InvalidPriority {
                    path: path.clone(),
                    line: row.line,
                    value: value.clone(),
                })?,
                None => 0,
            };
            let rule = ClassificationRule::new(name, columns.get(1).map(String::as_str), priority)
                .map_err(|source| LoadError::InvalidPattern {
                    path: path.clone(),
                    line: row.line,
                    name: name.to_string(),
                    source,
                })?;
            if rules.iter().any(|r| r.name == rule.name) {
                return Err(LoadError::DuplicateClass {
                    path,
                    line: row.line,
                    name: rule.name,
                });
            }
            rules.push(rule);
        }
        Ok(Self::from_rules(rules))
    }

    pub fn from_rules(mut rules: Vec<ClassificationRule>) -> Self {
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Name of the winning rule for `name`: highest priority first, then the
    /// longest match, then the alphabetically first rule name.
    pub fn classify_name(&self, name: &IngredientName) -> Option<&str> {
        self.rules
            .iter()
            .filter_map(|rule| rule.match_len(name.as_str()).map(|len| (rule, len)))
            .min_by(|(a, a_len), (b, b_len)| better_match(a, *a_len, b, *b_len))
            .map(|(rule, _)| rule.name.as_str())
    }

    pub fn classify(&self, recipe: Recipe) -> ClassifiedRecipe {
        let mut classification = IngredientClassification::default();
        for ingredient in &recipe.ingredients {
            match self.classify_name(&ingredient.name) {
                Some(class) => {
                    classification
                        .classified
                        .insert(ingredient.name.clone(), class.to_string());
                }
                None => {
                    classification.unclassified.insert(ingredient.name.clone());
                }
            }
        }
        ClassifiedRecipe {
            recipe,
            classification,
        }
    }
}

/// `Less` when `a` should win over `b`.
fn better_match(a: &ClassificationRule, a_len: usize, b: &ClassificationRule, b_len: usize) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(b_len.cmp(&a_len))
        .then_with(|| a.name.cmp(&b.name))
}
