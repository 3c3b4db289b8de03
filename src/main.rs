use clap::{Parser, Subcommand};
use log::{info, warn};
use recipe_ranker::{
    crawl_all, ingest_all, load_config, parse_sources, rank, Catalog, PreferenceVector,
    RankingQuery, Settings,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recipe-ranker", about = "Crawl recipe sites and rank recipes by taste", version)]
struct Cli {
    /// Configuration file (defaults to recipe-ranker.toml if present)
    #[arg(long, short, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download recipe pages into the page store
    Crawl {
        /// Source to crawl; can be repeated (defaults to the configured sources)
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Stop each source after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Parse and classify every stored page, then report what failed and why
    Ingest {
        /// Write every interpreted ingredient to this tab-separated file
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Rank stored recipes against a preferences file
    Rank {
        /// JSON object mapping ingredient type to an integer score
        #[arg(long)]
        preferences: PathBuf,
        #[arg(long)]
        strictness: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List ingredient types by group
    Types,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings: Settings = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl { sources, max_pages } => {
            if !sources.is_empty() {
                settings.sources = sources;
            }
            if max_pages.is_some() {
                settings.crawl.max_pages = max_pages;
            }
            let kinds = parse_sources(&settings.sources)?;
            tokio::select! {
                result = crawl_all(&settings, &kinds) => {
                    for summary in result? {
                        println!(
                            "{}: {} downloaded, {} failed{}",
                            summary.source,
                            summary.downloaded,
                            summary.failed,
                            if summary.finished { ", nothing left to fetch" } else { "" }
                        );
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted, stopping the crawl");
                }
            }
        }
        Commands::Ingest { log } => {
            let catalog = Catalog::load(&settings.classification_file, &settings.types_file)?;
            let kinds = parse_sources(&settings.sources)?;
            let (_, report) = ingest_all(&settings, &catalog, &kinds, log.as_deref())?;
            println!(
                "Recipes: {} total, {} parsed, {} distinct ingredient types, {} distinct ingredient groups used",
                report.total,
                report.parsed,
                report.types_used.len(),
                report.groups_used.len()
            );
            for (reason, count) in report.failure_summary() {
                println!("Failed to parse {count} recipe pages because {reason}.");
            }
        }
        Commands::Rank {
            preferences,
            strictness,
            limit,
            json,
        } => {
            let catalog = Catalog::load(&settings.classification_file, &settings.types_file)?;
            let prefs = PreferenceVector::from_json(&fs::read_to_string(&preferences)?)?;
            let query = RankingQuery::new(
                prefs,
                strictness.unwrap_or(settings.ranking.strictness),
                limit.unwrap_or(settings.ranking.limit),
            )?;
            let kinds = parse_sources(&settings.sources)?;
            let (recipes, _) = ingest_all(&settings, &catalog, &kinds, None)?;
            info!("Ranking {} recipes", recipes.len());

            let ranked = rank(&recipes, catalog.types(), &query);
            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                for result in &ranked {
                    println!("{:>7.3}  {}  {}", result.score, result.title, result.url);
                    if !result.positives.is_empty() {
                        println!("         + {}", result.positives.join("; "));
                    }
                    if !result.negatives.is_empty() {
                        println!("         - {}", result.negatives.join("; "));
                    }
                }
            }
        }
        Commands::Types => {
            let catalog = Catalog::load(&settings.classification_file, &settings.types_file)?;
            for (group, types) in catalog.types().types_by_group() {
                let types: Vec<&str> = types.iter().map(String::as_str).collect();
                println!("{}: {}", group, types.join(", "));
            }
        }
    }

    Ok(())
}
