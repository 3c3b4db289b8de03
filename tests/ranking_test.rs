use chrono::Utc;
use recipe_ranker::model::RawPage;
use recipe_ranker::{
    ingest_all, load_config, rank, Catalog, FsPageStore, LoadError, PageStore, PreferenceVector,
    RankingQuery, SourceKind,
};
use std::fs;
use std::path::Path;

const RULES: &str = "name\tpattern\tpriority
kale\tkale
poultry\tchicken
white meat\tchicken breast
pork\tpork|bacon
rice
olive oil\t\t1
";

const TYPES: &str = "class\ttype\tgroup
kale\tgreens\tveggies
poultry\tpoultry\tmeat
white meat\tpoultry\tmeat
pork\tpork\tmeat
rice\tgrains\tstarches
\"olive oil\"\toils\tfats
";

fn page(url: &str, title: &str, items: &[&str]) -> RawPage {
    let list: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
    RawPage {
        url: url.to_string(),
        url_root: "http://skinnytaste.com".to_string(),
        source: "SkinnyTaste".to_string(),
        raw_text: format!(
            "<html><head><title>{title}</title></head><body><h3>Ingredients:</h3><ul>{list}</ul><p>Enjoy!</p></body></html>"
        ),
        fetched_at: Utc::now(),
        title: title.to_string(),
        referenced_urls: vec![],
    }
}

/// Lay out tables, a config file and a page store under `dir`.
fn workspace(dir: &Path) -> String {
    fs::write(dir.join("classification.tsv"), RULES).unwrap();
    fs::write(dir.join("types.tsv"), TYPES).unwrap();

    let mut store = FsPageStore::open(dir.join("pages"), "SkinnyTaste").unwrap();
    let pages = [
        page("/kale-salad/", "Kale Salad", &["4 cups kale, chopped", "1 tbsp olive oil", "salt"]),
        page("/chicken-rice/", "Chicken &amp; Rice", &["1 lb chicken breast", "1 cup rice"]),
        page("/bacon-kale/", "Bacon Kale", &["4 slices bacon", "2 cups kale"]),
        page("/10-dinners/", "10 Easy Dinners", &[]),
        page("/category/dinner/", "Dinner", &["2 eggs", "1 cup rice"]),
    ];
    for mut p in pages {
        if p.url == "/10-dinners/" {
            p.raw_text = "<html><body><p>Roundup</p></body></html>".to_string();
        }
        store.save(&p).unwrap();
    }

    let config = dir.join("recipe-ranker.toml");
    fs::write(
        &config,
        format!(
            "classification_file = {:?}\ntypes_file = {:?}\nspider_path = {:?}\nsources = [\"SkinnyTaste\"]\n",
            dir.join("classification.tsv"),
            dir.join("types.tsv"),
            dir.join("pages"),
        ),
    )
    .unwrap();
    config.to_string_lossy().into_owned()
}

#[test]
fn test_ingest_then_rank() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let settings = load_config(Some(config.as_str())).unwrap();
    let catalog = Catalog::load(&settings.classification_file, &settings.types_file).unwrap();

    let log_path = dir.path().join("ingredients.tsv");
    let (recipes, report) =
        ingest_all(&settings, &catalog, &[SourceKind::SkinnyTaste], Some(&log_path)).unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.parsed, 3);
    assert_eq!(
        report.failure_summary(),
        vec![
            ("didn't find ingredients, but the title starts with numbers", 1),
            ("not a recipe web page", 1),
        ]
    );
    assert!(report.types_used.contains("greens"));
    assert!(report.groups_used.contains("meat"));

    let log = fs::read_to_string(&log_path).unwrap();
    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("url\tdeclaration\tdetail\tquantity\tname\tclass\ttype"));
    assert!(log.contains("http://skinnytaste.com/chicken-rice/\t1 lb chicken breast\t\t1 lb\tchicken breast\twhite meat\tpoultry"));
    assert!(log.contains("\tsalt\t[unknown]\t"));

    let prefs = PreferenceVector::from_json(r#"{"greens": 2, "pork": -1, "poultry": 1}"#).unwrap();
    let query = RankingQuery::new(prefs, 2.0, 2).unwrap();
    let ranked = rank(&recipes, catalog.types(), &query);

    assert_eq!(ranked.len(), 2);
    // kale salad: (2 + 0) / 3, chicken & rice: (1 + 0) / 2, bacon kale: (-2 + 2) / 2
    assert_eq!(ranked[0].title, "Kale Salad");
    assert!((ranked[0].score - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(ranked[0].positives, vec!["4 cups kale, chopped"]);
    assert_eq!(ranked[0].neutrals, vec!["1 tbsp olive oil"]);
    assert_eq!(ranked[1].title, "Chicken & Rice");
    assert_eq!(ranked[1].url, "http://skinnytaste.com/chicken-rice/");
    assert!((ranked[1].score - 0.5).abs() < 1e-9);

    let json = serde_json::to_value(&ranked).unwrap();
    assert_eq!(json[1]["negatives"], serde_json::json!([]));
}

#[test]
fn test_catalog_refuses_rules_without_types() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("classification.tsv"), format!("{RULES}tofu\n")).unwrap();
    fs::write(dir.path().join("types.tsv"), TYPES).unwrap();

    let err = Catalog::load(
        dir.path().join("classification.tsv"),
        dir.path().join("types.tsv"),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::MissingTypes { ref classes } if classes == &["tofu"]));
    assert_eq!(err.to_string(), "can't find an ingredient type for class(es) tofu");
}

#[test]
fn test_type_in_two_groups_stops_loading() {
    let dir = tempfile::tempdir().unwrap();
    let types = format!("{TYPES}duck\tpoultry\tbirds\n");
    fs::write(dir.path().join("classification.tsv"), RULES).unwrap();
    fs::write(dir.path().join("types.tsv"), types).unwrap();

    let err = Catalog::load(
        dir.path().join("classification.tsv"),
        dir.path().join("types.tsv"),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::TypeGroupConflict { line: 8, .. }));
}
