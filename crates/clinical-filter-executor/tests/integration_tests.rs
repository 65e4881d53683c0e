//! Integration tests for filter composition.
//!
//! Runs the standard catalog against an in-memory fixture covering every
//! supported category.

use clinical_filter::{Category, FilterSelection, IdentifierSet, Predicate};
use clinical_filter_executor::{
    catalog, CacheConfig, CandidateSet, CategoryFilter, ComposerConfig, Document, DocumentIndex,
    DocumentQuery, ExecutorError, FilterComposer, MemoryIndex, PredicateStrategy, QueryError,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Fixture index with failure injection and query counting.
struct IntegrationTestStore {
    documents: MemoryIndex,
    failing: Mutex<Vec<Predicate>>,
    queries: AtomicUsize,
}

impl IntegrationTestStore {
    fn new() -> Self {
        let documents = MemoryIndex::new()
            // Biopsy: E1 and E2 have a HAI score, E3 only fibrosis
            .with_documents(
                "biopcy",
                vec![
                    json!({"ExaminationId": "E1", "HAI1": 6, "HAI2": null}),
                    json!({"ExaminationId": "E2", "HAI3": 4, "Fibrosis2": 2}),
                    json!({"ExaminationId": "E3", "HAI1": null, "Fibrosis1": 3}),
                    json!({"ExaminationId": "E4", "PortalArea1": "A1"}),
                ],
            )
            .unwrap()
            // Serology: E1 HbsAG positive in year 3, E5 negative throughout
            .with_documents(
                "hepatitbserology",
                vec![
                    json!({"ExaminationId": "E1", "HbsAGFirstYear": "0", "HbsAG3": "1"}),
                    json!({"ExaminationId": "E2", "HbsAGFirstYear": "1", "AntiHbe1": "1"}),
                    json!({"ExaminationId": "E5", "HbsAGFirstYear": "0", "HbsAG1": "0"}),
                ],
            )
            .unwrap()
            .with_documents(
                "noninvasivetests",
                vec![
                    json!({"ExaminationId": "E1", "APRI": 0.8, "FIB4": 0}),
                    json!({"ExaminationId": "E2", "APRI": 0, "FIB4": 1.4}),
                    json!({"ExaminationId": "E3", "APRI": 1.1, "FIB4": 2.1}),
                ],
            )
            .unwrap()
            .with_documents(
                "vaccinehistory",
                vec![
                    json!({"ExaminationId": "E2", "COVID": "Var", "HPV": "Yok"}),
                    json!({"ExaminationId": "E3", "COVID": "Var", "HPV": "Var"}),
                    json!({"ExaminationId": "E4", "COVID": "Yok", "Zooster": "Var"}),
                ],
            )
            .unwrap()
            .with_documents(
                "coinfectioninformation",
                vec![
                    json!({"ExaminationId": "E2", "AntiHCV": "Pozitif"}),
                    json!({"ExaminationId": "E3", "AntiHCV": "Negatif"}),
                ],
            )
            .unwrap()
            .with_documents(
                "sourceinformation",
                vec![
                    json!({"ExaminationId": "E1", "HaveFamilyCirrhosis": "Hayir"}),
                    json!({"ExaminationId": "E2", "HaveFamilyCirrhosis": "Evet"}),
                    json!({"ExaminationId": "E3", "HaveFamilyCirrhosis": "Evet"}),
                ],
            )
            .unwrap();

        IntegrationTestStore {
            documents,
            failing: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    fn fail_on(&self, predicate: Predicate) {
        self.failing.lock().unwrap().push(predicate);
    }

    fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DocumentIndex for IntegrationTestStore {
    fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&query.predicate) {
            return Err(QueryError::Timeout(Duration::from_millis(500)));
        }
        self.documents.query(query)
    }
}

fn ids(values: &[&str]) -> IdentifierSet {
    values.iter().map(|v| v.to_string()).collect()
}

fn values(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn matched(values: &[&str]) -> CandidateSet {
    CandidateSet::Matched(ids(values))
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[test]
fn test_scenario_single_biopsy_token() {
    let store = IntegrationTestStore::new();
    let biopsy = catalog::biopsy().unwrap();

    let strategy = PredicateStrategy::new(&store, &biopsy);
    assert_eq!(strategy.evaluate("hai"), ids(&["E1", "E2"]));

    let filter = CategoryFilter::new(biopsy.clone());
    assert_eq!(filter.filter(&store, &values(&["hai"])), ids(&["E1", "E2"]));

    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new().with(Category::Biopsy, ["hai"]);
    assert_eq!(composer.compose(&selection).candidates, matched(&["E1", "E2"]));
}

#[test]
fn test_scenario_biopsy_and_vaccine() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new()
        .with(Category::Biopsy, ["hai"])
        .with(Category::VaccineHistory, ["covid"]);

    let result = composer.compose(&selection);

    assert_eq!(result.candidates, matched(&["E2"]));
    assert_eq!(result.stats.categories_evaluated, 2);
}

#[test]
fn test_scenario_nothing_selected() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();

    let all_empty = Category::ALL
        .iter()
        .fold(FilterSelection::new(), |selection, category| {
            selection.with(*category, Vec::<String>::new())
        });
    let unconstrained = composer.compose(&all_empty);

    let disjoint = FilterSelection::new()
        .with(Category::Biopsy, ["portalArea"])
        .with(Category::VaccineHistory, ["covid"]);
    let no_match = composer.compose(&disjoint);

    assert!(unconstrained.candidates.is_unconstrained());
    assert!(no_match.candidates.is_no_match());
    assert_ne!(unconstrained.candidates, no_match.candidates);
    assert_eq!(store.query_count(), 2);
}

// ============================================================================
// Category Filter Tests
// ============================================================================

#[test]
fn test_every_category_rejects_empty_and_unknown() {
    let store = IntegrationTestStore::new();

    for filter in catalog::standard_filters().unwrap() {
        assert!(
            filter.filter(&store, &[]).is_empty(),
            "{} with no values",
            filter.category()
        );
        assert!(
            filter.filter(&store, &values(&["no-such-token"])).is_empty(),
            "{} with unknown value",
            filter.category()
        );
    }
    assert_eq!(store.query_count(), 0);
}

#[test]
fn test_serology_matches_any_follow_up_year() {
    let store = IntegrationTestStore::new();
    let filter = CategoryFilter::new(catalog::hepatit_b_serology().unwrap());

    assert_eq!(filter.filter(&store, &values(&["HBSAG"])), ids(&["E1", "E2"]));
    assert_eq!(filter.filter(&store, &values(&["antiHbe"])), ids(&["E2"]));
    assert_eq!(
        filter.filter(&store, &values(&["hbsag", "antihbe"])),
        ids(&["E2"])
    );
}

#[test]
fn test_non_invasive_tests_need_positive_value() {
    let store = IntegrationTestStore::new();
    let filter = CategoryFilter::new(catalog::non_invasive_tests().unwrap());

    assert_eq!(filter.filter(&store, &values(&["apri"])), ids(&["E1", "E3"]));
    assert_eq!(filter.filter(&store, &values(&["fib4"])), ids(&["E2", "E3"]));
    assert_eq!(filter.filter(&store, &values(&["apri", "fib4"])), ids(&["E3"]));
}

#[test]
fn test_unmatched_token_does_not_void_category() {
    let store = IntegrationTestStore::new();
    let filter = CategoryFilter::new(catalog::vaccine_history().unwrap());

    // nobody has RSV recorded; covid alone decides
    assert_eq!(
        filter.filter(&store, &values(&["covid", "rsv"])),
        ids(&["E2", "E3"])
    );
}

#[test]
fn test_coinfection_and_source_information() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new()
        .with(Category::CoinfectionInformation, ["antiHcv"])
        .with(Category::SourceInformation, ["HaveFamilyCirrhosis"]);

    assert_eq!(composer.compose(&selection).candidates, matched(&["E2"]));
}

// ============================================================================
// Composition Properties
// ============================================================================

#[test]
fn test_registration_order_is_irrelevant() {
    let store = IntegrationTestStore::new();
    let selection = FilterSelection::new()
        .with(Category::Biopsy, ["hai", "fibrosis"])
        .with(Category::NonInvasiveTests, ["fib4"])
        .with(Category::VaccineHistory, ["covid"]);

    let filters = catalog::standard_filters().unwrap();
    let expected = FilterComposer::new(&store).unwrap().compose(&selection).candidates;
    assert_eq!(expected, matched(&["E2"]));

    // rotate through every starting position, forward and backward
    for start in 0..filters.len() {
        let mut rotated = filters.clone();
        rotated.rotate_left(start);

        let forward = rotated
            .iter()
            .cloned()
            .fold(FilterComposer::empty(&store), FilterComposer::register);
        let backward = rotated
            .iter()
            .rev()
            .cloned()
            .fold(FilterComposer::empty(&store), FilterComposer::register);

        assert_eq!(forward.compose(&selection).candidates, expected);
        assert_eq!(backward.compose(&selection).candidates, expected);
    }
}

#[test]
fn test_single_category_equals_filter_result() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();

    for filter in catalog::standard_filters().unwrap() {
        let token = filter.field_map().tokens().next().unwrap().to_string();
        let direct = filter.filter(&store, &[token.clone()]);
        let selection = FilterSelection::new().with(filter.category(), [token]);

        assert_eq!(
            composer.compose(&selection).candidates,
            CandidateSet::Matched(direct),
            "{}",
            filter.category()
        );
    }
}

#[test]
fn test_two_categories_intersect_exactly() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();
    let biopsy = CategoryFilter::new(catalog::biopsy().unwrap());
    let tests = CategoryFilter::new(catalog::non_invasive_tests().unwrap());

    for (biopsy_token, test_token) in [("hai", "apri"), ("fibrosis", "apri"), ("portalArea", "fib4")] {
        let s1 = biopsy.filter(&store, &values(&[biopsy_token]));
        let s2 = tests.filter(&store, &values(&[test_token]));
        let expected: IdentifierSet = s1.intersection(&s2).cloned().collect();

        let selection = FilterSelection::new()
            .with(Category::Biopsy, [biopsy_token])
            .with(Category::NonInvasiveTests, [test_token]);

        assert_eq!(
            composer.compose(&selection).candidates,
            CandidateSet::Matched(expected)
        );
    }
}

#[test]
fn test_reserved_categories_are_ignored() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new()
        .with(Category::Biopsy, ["hai"])
        .with(Category::LaboratoryFindings, ["alt"])
        .with(Category::Treatment, ["entecavir"]);

    assert_eq!(composer.compose(&selection).candidates, matched(&["E1", "E2"]));
    assert_eq!(
        composer.explain(&selection).ignored_categories,
        vec![Category::LaboratoryFindings, Category::Treatment]
    );
}

// ============================================================================
// Failure Tolerance
// ============================================================================

#[test]
fn test_failed_token_behaves_as_empty() {
    let store = IntegrationTestStore::new();
    store.fail_on(Predicate::equals("HPV", "Var"));
    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new().with(Category::VaccineHistory, ["covid", "hpv"]);

    let result = composer.compose(&selection);

    assert_eq!(result.candidates, matched(&["E2", "E3"]));
    assert_eq!(result.stats.evaluation.predicate_failures, 1);
}

#[test]
fn test_failed_only_token_empties_category() {
    let store = IntegrationTestStore::new();
    store.fail_on(Predicate::equals("COVID", "Var"));
    let composer = FilterComposer::new(&store).unwrap();
    let selection = FilterSelection::new()
        .with(Category::Biopsy, ["hai"])
        .with(Category::VaccineHistory, ["covid"]);

    assert!(composer.compose(&selection).candidates.is_no_match());
}

#[test]
fn test_failures_are_retried_next_composition() {
    let store = IntegrationTestStore::new();
    store.fail_on(Predicate::equals("COVID", "Var"));
    let config = ComposerConfig::builder()
        .with_cache(CacheConfig::default())
        .build();
    let composer = FilterComposer::with_config(&store, config).unwrap();
    let selection = FilterSelection::new().with(Category::VaccineHistory, ["covid"]);

    assert!(composer.compose(&selection).candidates.is_no_match());
    store.failing.lock().unwrap().clear();
    assert_eq!(composer.compose(&selection).candidates, matched(&["E2", "E3"]));
    assert_eq!(store.query_count(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_cache_expiry_requeries() {
    let store = IntegrationTestStore::new();
    let config = ComposerConfig::builder()
        .with_cache(CacheConfig {
            max_entries: 16,
            ttl: Duration::from_millis(1),
        })
        .build();
    let composer = FilterComposer::with_config(&store, config).unwrap();
    let selection = FilterSelection::new().with(Category::Biopsy, ["hai"]);

    composer.compose(&selection);
    std::thread::sleep(Duration::from_millis(10));
    let result = composer.compose(&selection);

    assert_eq!(result.candidates, matched(&["E1", "E2"]));
    assert_eq!(result.stats.evaluation.cache_hits, 0);
    assert_eq!(store.query_count(), 2);
}

#[test]
fn test_max_hits_limits_candidates() {
    let store = IntegrationTestStore::new();
    let config = ComposerConfig::builder().with_max_hits(1).build();
    let composer = FilterComposer::with_config(&store, config).unwrap();
    let selection = FilterSelection::new().with(Category::Biopsy, ["hai"]);

    assert_eq!(composer.compose(&selection).count(), 1);
}

#[test]
fn test_parallel_matches_sequential() {
    let store = IntegrationTestStore::new();
    let selection = FilterSelection::new()
        .with(Category::Biopsy, ["hai", "fibrosis"])
        .with(Category::HepatitBSerology, ["hbsag"])
        .with(Category::NonInvasiveTests, ["fib4"])
        .with(Category::VaccineHistory, ["covid"]);

    let sequential = FilterComposer::new(&store).unwrap();
    let parallel = FilterComposer::with_config(
        &store,
        ComposerConfig::builder().with_parallel(true).build(),
    )
    .unwrap();

    let expected = sequential.compose(&selection).candidates;
    assert_eq!(expected, matched(&["E2"]));
    for _ in 0..10 {
        assert_eq!(parallel.compose(&selection).candidates, expected);
    }
}

// ============================================================================
// Wire Selections
// ============================================================================

#[test]
fn test_compose_json_selection() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();

    let result = composer
        .compose_json(
            r#"{
                "Biopcy": ["hai"],
                "VaccineHistory": ["covid"],
                "Treatment": null,
                "LaboratoryFindings": []
            }"#,
        )
        .unwrap();
    assert_eq!(result.to_vec(), vec!["E2".to_string()]);

    let empty = composer.compose_json("{}").unwrap();
    assert!(empty.candidates.is_unconstrained());
}

#[test]
fn test_invalid_json_selection_is_surfaced() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();

    for bad in ["null", "[]", r#"{"Biopsy": "hai"}"#, "{"] {
        assert!(
            matches!(composer.compose_json(bad), Err(ExecutorError::InvalidSelection(_))),
            "{}",
            bad
        );
    }
    assert_eq!(store.query_count(), 0);
}

#[test]
fn test_aliased_category_keys_are_rejected() {
    let store = IntegrationTestStore::new();
    let composer = FilterComposer::new(&store).unwrap();

    for duplicated in [
        r#"{"Biopsy": ["hai"], "biopcy": []}"#,
        r#"{"Biopcy": ["hai"], "biopsy": ["fibrosis"]}"#,
        r#"{"VaccineHistory": ["covid"], "VaccineHistory": ["hpv"]}"#,
    ] {
        let result = composer.compose_json(duplicated);
        assert!(
            matches!(result, Err(ExecutorError::InvalidSelection(ref m)) if m.contains("both select")),
            "{}",
            duplicated
        );
    }
    assert_eq!(store.query_count(), 0);
}

#[test]
fn test_numeric_examination_ids() {
    let index = MemoryIndex::new()
        .with_documents(
            "biopcy",
            vec![
                json!({"ExaminationId": 10, "HAI1": 6}),
                json!({"ExaminationId": true, "HAI1": 2}),
                json!({"ExaminationId": "E11", "HAI2": 1}),
            ],
        )
        .unwrap()
        .with_documents(
            "vaccinehistory",
            vec![json!({"ExaminationId": 10, "COVID": "Var"})],
        )
        .unwrap();
    let composer = FilterComposer::new(&index).unwrap();

    let biopsy = composer.compose(&FilterSelection::new().with(Category::Biopsy, ["hai"]));
    assert_eq!(biopsy.candidates, matched(&["10", "E11"]));

    let both = composer.compose(
        &FilterSelection::new()
            .with(Category::Biopsy, ["hai"])
            .with(Category::VaccineHistory, ["covid"]),
    );
    assert_eq!(both.candidates, matched(&["10"]));
}
