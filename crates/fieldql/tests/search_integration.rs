//! Integration tests for the query pipeline.
//!
//! The schema is loaded from a TOML model definition, the way a host would
//! ship it, and every query goes through the public API only.

use std::sync::Arc;

use fieldql_rs::{
    search, translate, Comparator, Expr, FieldType, LogicalOp, ModelRegistry, Predicate,
    PredicateEvaluator, PredicateValue, QueryEngine, QueryError, QueryParser, ScalarValue, Schema,
    SchemaCache, SchemaOptions, SearchOutcome, MAX_TERMS,
};
use serde_json::{json, Value};

const MODELS: &str = r#"
[[models.payment.fields]]
name = "amount"
type = "number"

[[models.payment.fields]]
name = "paid_on"
type = "date"
nullable = true

[[models.payment.fields]]
name = "is_refunded"
type = "boolean"

[[models.payment.fields]]
name = "status"
type = "choice"
suggestions = [
    { value = "a", label = "Active" },
    { value = "b", label = "Blocked" },
    { value = "c", label = "Closed" },
]

[[models.payment.fields]]
name = "user"
type = "relation"
model = "user"
default_field = "email"

[[models.user.fields]]
name = "email"
type = "text"

[[models.user.fields]]
name = "signed_up"
type = "datetime"

[[models.user.fields]]
name = "manager"
type = "relation"
model = "user"
nullable = true
"#;

fn registry() -> ModelRegistry {
    toml::from_str(MODELS).expect("model definitions should parse")
}

fn schema() -> Schema {
    Schema::new(registry(), "payment").expect("schema should build")
}

fn records() -> Vec<Value> {
    vec![
        json!({"id": 1, "amount": 25, "paid_on": "2024-03-01", "is_refunded": false, "status": "a",
               "user": {"email": "x@y.com", "signed_up": "2023-01-01 09:00:00", "manager": null}}),
        json!({"id": 2, "amount": 5, "paid_on": null, "is_refunded": true, "status": "b",
               "user": {"email": "z@y.com", "signed_up": "2024-06-30 12:00:00",
                        "manager": {"email": "x@y.com"}}}),
        json!({"id": 3, "amount": 110.5, "paid_on": "2023-12-24", "is_refunded": false, "status": "c",
               "user": {"email": "boss@y.com", "signed_up": "2020-02-02 02:02:02", "manager": null}}),
    ]
}

fn ids(query: &str) -> Vec<i64> {
    let schema = schema();
    let records = records();
    QueryEngine::new(&schema)
        .apply(query)
        .filter(&records)
        .into_iter()
        .filter_map(|r| r["id"].as_i64())
        .collect()
}

#[test]
fn test_overview_query_end_to_end() {
    assert_eq!(ids(r#"user.email = "x@y.com" and amount > 10"#), [1]);
}

#[test]
fn test_precedence_and_negation_scope() {
    let expr = QueryParser::parse("a=1 or b=2 and c=3").unwrap();
    assert!(matches!(
        &expr,
        Expr::Logical { op: LogicalOp::Or, right, .. }
            if matches!(**right, Expr::Logical { op: LogicalOp::And, .. })
    ));

    let expr = QueryParser::parse("not a=1 and b=2").unwrap();
    assert!(matches!(
        &expr,
        Expr::Logical { op: LogicalOp::And, left, .. } if matches!(**left, Expr::Not { .. })
    ));

    assert_eq!(ids("not is_refunded = true and amount < 100"), [1]);
}

#[test]
fn test_simple_comparison_round_trip() {
    let schema = schema();
    let predicate = search("amount >= 10", &schema).unwrap().unwrap();
    match &predicate {
        Predicate::Compare { field, op, value } => {
            assert_eq!(field.dotted(), "amount");
            assert_eq!(*op, Comparator::Gte);
            assert_eq!(value, &PredicateValue::Scalar(ScalarValue::Int(10)));
        }
        other => panic!("unexpected predicate {other:?}"),
    }
    let again = search(&predicate.to_string(), &schema).unwrap().unwrap();
    assert_eq!(again, predicate);
}

#[test]
fn test_error_kinds_and_offsets() {
    let schema = schema();
    let cases = [
        (r#"user.email = "abc"#, "lex", 13),
        ("(amount = 1 and status = 'a'", "parse", 28),
        ("ghost.field = 1", "schema", 0),
        (r#"is_refunded = "yes""#, "translation", 14),
        (r#"status in ["z"]"#, "translation", 11),
    ];
    for (query, kind, offset) in cases {
        let err = search(query, &schema).unwrap_err();
        assert_eq!(err.kind(), kind, "query: {query}");
        assert_eq!(err.offset(), Some(offset), "query: {query}");
    }
}

#[test]
fn test_scalar_operators_reject_lists_at_translation() {
    let schema = schema();
    for query in ["amount = [1, 2]", "amount = (1, 2)", "amount > [1]"] {
        match search(query, &schema) {
            Err(QueryError::Translation(e)) => {
                assert!(e.message.contains("does not accept a list"), "{query}: {}", e.message);
                assert_eq!(e.offset, Some(query.find(|c| c == '[' || c == '(').unwrap()));
            }
            other => panic!("expected a translation error for {query}, got {other:?}"),
        }
    }
}

#[test]
fn test_long_chains_are_rejected_before_translation() {
    let schema = schema();
    let query = vec!["amount = 1"; 20_000].join(" and ");
    let err = search(&query, &schema).unwrap_err();
    assert_eq!(err.kind(), "parse");

    let outcome = QueryEngine::new(&schema).apply(&query);
    assert!(outcome.warning().is_some());
    assert!(outcome.filter(&records()).is_empty());

    let longest = vec!["amount > 1"; MAX_TERMS].join(" or ");
    assert_eq!(ids(&longest), [1, 2, 3]);
}

#[test]
fn test_choices_accept_declared_values_and_labels() {
    assert_eq!(ids(r#"status in ["a","b"]"#), [1, 2]);
    assert_eq!(ids(r#"status = "Closed""#), [3]);
    assert!(matches!(
        search(r#"status in ["z"]"#, &schema()),
        Err(QueryError::Translation(_))
    ));
}

#[test]
fn test_null_checks_on_any_type() {
    assert_eq!(ids("paid_on = null"), [2]);
    assert_eq!(ids("paid_on != null"), [1, 3]);
    assert_eq!(ids("user.manager.email = null"), [1, 3]);
    assert!(matches!(
        search("amount = null", &schema()).unwrap(),
        Some(Predicate::IsNull { negated: false, .. })
    ));
}

#[test]
fn test_empty_list_matches_nothing() {
    assert!(ids("amount in []").is_empty());
    assert_eq!(ids("amount not in []"), [1, 2, 3]);
}

#[test]
fn test_relation_traversal_and_default_field() {
    assert_eq!(ids(r#"user.manager.email ~ "X@Y""#), [2]);
    assert_eq!(ids(r#"user = "boss@y.com""#), [3]);
    assert_eq!(ids(r#"user.signed_up < "2023-06-01""#), [1, 3]);
}

#[test]
fn test_dates_and_numbers_from_strings() {
    assert_eq!(ids(r#"paid_on >= "2024-01-01""#), [1]);
    assert_eq!(ids(r#"amount > "1e2""#), [3]);
}

#[test]
fn test_invalid_queries_yield_no_results_with_warning() {
    let schema = schema();
    let engine = QueryEngine::new(&schema);
    let outcome = engine.apply("amount >");
    assert!(outcome.warning().is_some());
    assert!(outcome.filter(&records()).is_empty());

    assert!(matches!(engine.apply(""), SearchOutcome::All));
    assert_eq!(ids("   ").len(), 3);
}

#[test]
fn test_introspection_document() {
    let json = serde_json::to_value(schema().as_introspection()).unwrap();
    assert_eq!(json["current_model"], "payment");
    assert_eq!(json["models"]["payment"]["amount"]["type"], "number");
    assert_eq!(json["models"]["payment"]["status"]["suggestions"][1]["label"], "Blocked");
    assert_eq!(json["models"]["payment"]["user"]["relation"], "user");
    assert_eq!(json["models"]["user"]["signed_up"]["type"], "datetime");
    assert_eq!(json["models"]["user"]["manager"]["nullable"], true);
}

#[test]
fn test_depth_limit_bounds_self_reference() {
    let schema = schema();
    assert!(search("user.manager.email = 'a'", &schema).is_ok());
    let err = search("user.manager.manager.email = 'a'", &schema).unwrap_err();
    assert_eq!(err.kind(), "schema");
    assert!(err.to_string().contains("maximum relation depth"));

    let deeper = Schema::with_options(registry(), "payment", SchemaOptions::default().with_max_depth(3))
        .unwrap();
    assert!(search("user.manager.manager.email = 'a'", &deeper).is_ok());
}

#[test]
fn test_translate_parsed_expression_directly() {
    let schema = schema();
    let err = search("user.manager != null", &schema).unwrap_err();
    assert_eq!(err.kind(), "schema");

    let expr = QueryParser::parse("user.manager.email != null").unwrap();
    let predicate = translate(&expr, &schema).unwrap();
    match predicate {
        Predicate::IsNull { field, negated } => {
            assert!(negated);
            assert_eq!(field.lookup(), "user__manager__email");
            assert_eq!(field.field_type, FieldType::Text);
        }
        other => panic!("unexpected predicate {other:?}"),
    }
}

#[test]
fn test_cached_schema_is_shared_across_threads() {
    let registry = Arc::new(registry());
    let cache = Arc::new(SchemaCache::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let schema = cache
                    .get_or_build(&registry, "payment", &SchemaOptions::default())
                    .unwrap();
                let predicate = search("amount > 10", &schema).unwrap().unwrap();
                let records = records();
                PredicateEvaluator::new(&predicate).filter_records(&records).len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(cache.len(), 1);
}
