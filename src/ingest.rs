//! Turn every stored page into a classified recipe and account for the ones
//! that could not be read.

use crate::classify::Catalog;
use crate::error::RankerError;
use crate::model::{ClassifiedRecipe, RawPage};
use crate::sources::RecipeSource;
use crate::store::PageStore;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};

const LOG_HEADER: &str = "url\tdeclaration\tdetail\tquantity\tname\tclass\ttype";
const UNKNOWN_CLASS: &str = "[unknown]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub total: usize,
    pub parsed: usize,
    /// failure reason -> number of pages
    pub failures: HashMap<String, usize>,
    pub types_used: BTreeSet<String>,
    pub groups_used: BTreeSet<String>,
}

impl IngestReport {
    /// Failure reasons, most frequent first.
    pub fn failure_summary(&self) -> Vec<(&str, usize)> {
        let mut summary: Vec<(&str, usize)> = self
            .failures
            .iter()
            .map(|(reason, count)| (reason.as_str(), *count))
            .collect();
        summary.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        summary
    }

    pub fn log_summary(&self) {
        info!(
            "Recipes: {} total, {} parsed, {} distinct ingredient types, {} distinct ingredient groups used",
            self.total,
            self.parsed,
            self.types_used.len(),
            self.groups_used.len()
        );
        for (reason, count) in self.failure_summary() {
            info!("Failed to parse {} recipe pages because {}.", count, reason);
        }
    }
}

/// One pass over stored pages. Optionally writes a tab-separated line per
/// interpreted ingredient, which is the quickest way to see what the
/// classifier made of a page.
pub struct Ingestion<'c> {
    catalog: &'c Catalog,
    recipes: Vec<ClassifiedRecipe>,
    report: IngestReport,
    ingredient_log: Option<Box<dyn Write + 'c>>,
}

impl<'c> Ingestion<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            recipes: Vec::new(),
            report: IngestReport::default(),
            ingredient_log: None,
        }
    }

    pub fn with_ingredient_log(mut self, writer: impl Write + 'c) -> io::Result<Self> {
        let mut writer: Box<dyn Write + 'c> = Box::new(writer);
        writeln!(writer, "{LOG_HEADER}")?;
        self.ingredient_log = Some(writer);
        Ok(self)
    }

    /// Ingest everything `store` holds for `source`.
    pub fn ingest_store<S>(&mut self, source: &dyn RecipeSource, store: &S) -> Result<(), RankerError>
    where
        S: PageStore + ?Sized,
    {
        for stored in store.load_all()? {
            self.ingest_page(source, &stored.page)?;
        }
        Ok(())
    }

    pub fn ingest_page(&mut self, source: &dyn RecipeSource, page: &RawPage) -> io::Result<()> {
        self.report.total += 1;
        let recipe = match source.extract(page) {
            Ok(recipe) => recipe,
            Err(failure) => {
                debug!("failed to parse {}:{} ({})", page.source, page.url, failure);
                *self.report.failures.entry(failure.to_string()).or_default() += 1;
                return Ok(());
            }
        };
        self.report.parsed += 1;

        let catalog = self.catalog;
        let classified = catalog.rules().classify(recipe);
        let url = classified.recipe.page.canonical_url();
        for ingredient in &classified.recipe.ingredients {
            let class = classified.classification.class_of(&ingredient.name);
            let ingredient_type = class.and_then(|c| catalog.type_of(c));
            if let Some(t) = ingredient_type {
                self.report.types_used.insert(t.type_name.clone());
                self.report.groups_used.insert(t.group.clone());
            }
            if let Some(log) = self.ingredient_log.as_mut() {
                writeln!(
                    log,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    url,
                    ingredient.declaration,
                    ingredient.detail,
                    ingredient.quantity,
                    ingredient.name,
                    class.unwrap_or(UNKNOWN_CLASS),
                    ingredient_type.map(|t| t.type_name.as_str()).unwrap_or_default(),
                )?;
            }
        }
        self.recipes.push(classified);
        Ok(())
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    pub fn finish(mut self) -> io::Result<(Vec<ClassifiedRecipe>, IngestReport)> {
        if let Some(log) = self.ingredient_log.as_mut() {
            log.flush()?;
        }
        Ok((self.recipes, self.report))
    }
}
