//! Tests for the query parser.

use super::*;
use crate::error::QueryError;

fn cmp(path: &str, op: Comparator, value: Operand) -> Expr {
    let segments: Vec<&str> = path.split('.').collect();
    let offset = 0;
    Expr::Comparison(Comparison {
        field: NamePath::new(segments, offset),
        op,
        value,
        offset,
    })
}

fn parse_err(input: &str) -> (usize, String) {
    match QueryParser::parse(input) {
        Err(QueryError::Parse(e)) => (e.offset, e.message),
        other => panic!("expected a parse error for {input:?}, got {other:?}"),
    }
}

fn comparison(expr: &Expr) -> &Comparison {
    match expr {
        Expr::Comparison(c) => c,
        other => panic!("expected a comparison, got {other:?}"),
    }
}

// ==================== Comparison Tests ====================

#[test]
fn test_parse_simple_comparison() {
    let expr = QueryParser::parse("age = 30").unwrap();
    assert_eq!(
        expr,
        cmp(
            "age",
            Comparator::Eq,
            Operand::Literal(Literal::new(LiteralValue::Int(30), 6))
        )
    );
}

#[test]
fn test_parse_every_comparator() {
    let cases = [
        ("a = 1", Comparator::Eq),
        ("a != 1", Comparator::Ne),
        ("a > 1", Comparator::Gt),
        ("a >= 1", Comparator::Gte),
        ("a < 1", Comparator::Lt),
        ("a <= 1", Comparator::Lte),
        ("a ~ 1", Comparator::Contains),
        ("a !~ 1", Comparator::NotContains),
    ];
    for (input, op) in cases {
        let expr = QueryParser::parse(input).unwrap();
        assert_eq!(comparison(&expr).op, op, "input: {input}");
    }
}

#[test]
fn test_parse_literal_kinds() {
    let cases = [
        ("a = 1", LiteralValue::Int(1)),
        ("a = -2.5", LiteralValue::Float(-2.5)),
        ("a = 1e3", LiteralValue::Float(1000.0)),
        ("a = 'x'", LiteralValue::String("x".to_string())),
        ("a = TRUE", LiteralValue::Bool(true)),
        ("a = false", LiteralValue::Bool(false)),
        ("a = Null", LiteralValue::Null),
    ];
    for (input, expected) in cases {
        let expr = QueryParser::parse(input).unwrap();
        match &comparison(&expr).value {
            Operand::Literal(literal) => assert_eq!(literal.value, expected, "input: {input}"),
            other => panic!("expected literal for {input}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_dotted_path() {
    let expr = QueryParser::parse(r#"author.profile.email ~ "@example""#).unwrap();
    let c = comparison(&expr);
    assert_eq!(c.field.segments, ["author", "profile", "email"]);
    assert_eq!(c.field.dotted(), "author.profile.email");
    assert_eq!(c.op, Comparator::Contains);
}

#[test]
fn test_parse_field_to_field() {
    let expr = QueryParser::parse("updated_at > created_at").unwrap();
    let c = comparison(&expr);
    assert_eq!(c.value, Operand::Name(NamePath::new(["created_at"], 13)));
}

// ==================== List Tests ====================

#[test]
fn test_parse_in_list() {
    let expr = QueryParser::parse(r#"status in ["a", "b"]"#).unwrap();
    let c = comparison(&expr);
    assert_eq!(c.op, Comparator::In);
    match &c.value {
        Operand::List { items, offset } => {
            assert_eq!(*offset, 10);
            let values: Vec<_> = items.iter().map(|l| l.value.clone()).collect();
            assert_eq!(
                values,
                [
                    LiteralValue::String("a".to_string()),
                    LiteralValue::String("b".to_string())
                ]
            );
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_parse_not_in_with_parentheses() {
    let expr = QueryParser::parse("id not in (1, 2, 3)").unwrap();
    let c = comparison(&expr);
    assert_eq!(c.op, Comparator::NotIn);
    assert!(matches!(&c.value, Operand::List { items, .. } if items.len() == 3));
}

#[test]
fn test_parse_empty_list() {
    let expr = QueryParser::parse("id in []").unwrap();
    assert!(matches!(
        &comparison(&expr).value,
        Operand::List { items, .. } if items.is_empty()
    ));
}

#[test]
fn test_parse_list_trailing_comma() {
    let expr = QueryParser::parse("id in [1, 2,]").unwrap();
    assert!(matches!(
        &comparison(&expr).value,
        Operand::List { items, .. } if items.len() == 2
    ));
}

#[test]
fn test_parse_in_with_scalar_is_left_to_translator() {
    let expr = QueryParser::parse("id in 1").unwrap();
    assert!(matches!(&comparison(&expr).value, Operand::Literal(_)));
}

#[test]
fn test_list_after_scalar_operator_is_left_to_translator() {
    for input in ["id = [1, 2]", "id = (1, 2)"] {
        let expr = QueryParser::parse(input).unwrap();
        let c = comparison(&expr);
        assert_eq!(c.op, Comparator::Eq);
        assert!(
            matches!(&c.value, Operand::List { items, offset: 5 } if items.len() == 2),
            "{input}"
        );
    }
}

#[test]
fn test_mismatched_list_brackets() {
    let (offset, _) = parse_err("id in [1, 2)");
    assert_eq!(offset, 11);
}

#[test]
fn test_list_of_names_is_error() {
    let (offset, message) = parse_err("id in [other]");
    assert_eq!(offset, 7);
    assert!(message.contains("expected a value"), "{message}");
}

#[test]
fn test_unterminated_list() {
    let (offset, message) = parse_err("id in [1, 2");
    assert_eq!(offset, 11);
    assert!(message.contains("end of input"), "{message}");
}

// ==================== Boolean Operator Tests ====================

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = QueryParser::parse("a=1 or b=2 and c=3").unwrap();
    match expr {
        Expr::Logical {
            op: LogicalOp::Or,
            left,
            right,
        } => {
            assert_eq!(comparison(&left).field.dotted(), "a");
            match *right {
                Expr::Logical {
                    op: LogicalOp::And,
                    left,
                    right,
                } => {
                    assert_eq!(comparison(&left).field.dotted(), "b");
                    assert_eq!(comparison(&right).field.dotted(), "c");
                }
                other => panic!("expected AND on the right, got {other:?}"),
            }
        }
        other => panic!("expected OR at the root, got {other:?}"),
    }
}

#[test]
fn test_not_scope_is_single_operand() {
    let expr = QueryParser::parse("not a=1 and b=2").unwrap();
    match expr {
        Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Not { offset: 0, .. }));
            assert_eq!(comparison(&right).field.dotted(), "b");
        }
        other => panic!("expected AND at the root, got {other:?}"),
    }
}

#[test]
fn test_not_applies_to_group() {
    let expr = QueryParser::parse("not (a=1 or b=2)").unwrap();
    match expr {
        Expr::Not { operand, .. } => {
            assert!(matches!(*operand, Expr::Logical { op: LogicalOp::Or, .. }));
        }
        other => panic!("expected NOT, got {other:?}"),
    }
}

#[test]
fn test_double_negation_is_kept() {
    let expr = QueryParser::parse("not not a = 1").unwrap();
    match expr {
        Expr::Not { operand, .. } => assert!(matches!(*operand, Expr::Not { offset: 4, .. })),
        other => panic!("expected NOT, got {other:?}"),
    }
}

#[test]
fn test_and_is_left_associative() {
    let expr = QueryParser::parse("a=1 and b=2 and c=3").unwrap();
    assert_eq!(expr.to_string(), "((a = 1 and b = 2) and c = 3)");
}

#[test]
fn test_parentheses_override_precedence() {
    let expr = QueryParser::parse("(a=1 or b=2) and c=3").unwrap();
    assert_eq!(expr.to_string(), "((a = 1 or b = 2) and c = 3)");
}

#[test]
fn test_keywords_case_insensitive() {
    let lower = QueryParser::parse("not a=1 and b=2 or c=3").unwrap();
    let upper = QueryParser::parse("NOT a=1 AND b=2 OR c=3").unwrap();
    assert_eq!(lower.to_string(), upper.to_string());
}

// ==================== Error Tests ====================

#[test]
fn test_empty_input_is_error() {
    let (offset, message) = parse_err("");
    assert_eq!(offset, 0);
    assert!(message.contains("end of input"), "{message}");

    let (offset, _) = parse_err("   ");
    assert_eq!(offset, 3);
}

#[test]
fn test_unbalanced_paren_reports_eof() {
    let (offset, message) = parse_err("(a=1 and b=2");
    assert_eq!(offset, 12);
    assert!(message.contains("unexpected end of input"), "{message}");
    assert!(message.contains("')'"), "{message}");
}

#[test]
fn test_unexpected_closing_paren() {
    let (offset, message) = parse_err("a=1)");
    assert_eq!(offset, 3);
    assert!(message.contains("unexpected ')'"), "{message}");
}

#[test]
fn test_trailing_tokens_are_error() {
    let (offset, message) = parse_err("a = 1 b = 2");
    assert_eq!(offset, 6);
    assert!(message.contains("'b'"), "{message}");
}

#[test]
fn test_missing_right_operand() {
    let (offset, message) = parse_err("a = ");
    assert_eq!(offset, 4);
    assert!(message.contains("expected a value"), "{message}");
}

#[test]
fn test_missing_comparator() {
    let (offset, message) = parse_err("a 1");
    assert_eq!(offset, 2);
    assert!(message.contains("comparison operator"), "{message}");
}

#[test]
fn test_comparator_in_field_position() {
    let (offset, _) = parse_err("= 1");
    assert_eq!(offset, 0);
}

#[test]
fn test_not_without_in() {
    let (offset, message) = parse_err("a not 1");
    assert_eq!(offset, 6);
    assert!(message.contains("'in'"), "{message}");
}

#[test]
fn test_dangling_boolean_operator() {
    let (offset, _) = parse_err("a = 1 and");
    assert_eq!(offset, 9);
    let (offset, _) = parse_err("or a = 1");
    assert_eq!(offset, 0);
}

#[test]
fn test_empty_path_segment() {
    let (offset, message) = parse_err("author..email = 1");
    assert_eq!(offset, 7);
    assert!(message.contains("empty path segment"), "{message}");

    let (offset, _) = parse_err("author. = 1");
    assert_eq!(offset, 7);
}

#[test]
fn test_integer_overflow() {
    let (offset, message) = parse_err("a = 99999999999999999999");
    assert_eq!(offset, 4);
    assert!(message.contains("out of range"), "{message}");
}

#[test]
fn test_lex_error_propagates() {
    match QueryParser::parse(r#"name = "abc"#) {
        Err(QueryError::Lex(e)) => assert_eq!(e.offset, 7),
        other => panic!("expected a lex error, got {other:?}"),
    }
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}a = 1{}", "(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
    assert!(QueryParser::parse(&deep).is_ok());

    let too_deep = format!(
        "{}a = 1{}",
        "(".repeat(MAX_NESTING_DEPTH + 1),
        ")".repeat(MAX_NESTING_DEPTH + 1)
    );
    let (offset, message) = parse_err(&too_deep);
    assert_eq!(offset, MAX_NESTING_DEPTH);
    assert!(message.contains("nested"), "{message}");

    let nots = format!("{}a = 1", "not ".repeat(10_000));
    let (_, message) = parse_err(&nots);
    assert!(message.contains("nested"), "{message}");
}

#[test]
fn test_term_limit_bounds_flat_chains() {
    let at_limit = vec!["a = 1"; MAX_TERMS].join(" and ");
    assert!(QueryParser::parse(&at_limit).is_ok());

    // "a = 1" is 5 characters and " and " is 5, so the connective after
    // term N starts at N * 10 - 4.
    let too_long = vec!["a = 1"; MAX_TERMS + 1].join(" and ");
    let (offset, message) = parse_err(&too_long);
    assert_eq!(offset, MAX_TERMS * 10 - 4);
    assert!(message.contains("comparisons"), "{message}");

    let huge = vec!["a = 1"; 20_000].join(" or ");
    let (_, message) = parse_err(&huge);
    assert!(message.contains(&MAX_TERMS.to_string()), "{message}");
}

#[test]
fn test_term_limit_counts_across_groups() {
    let group = vec!["a = 1"; MAX_TERMS / 2].join(" or ");
    let query = format!("({group}) and ({group}) and b = 2");
    let (offset, _) = parse_err(&query);
    assert_eq!(&query[offset..offset + 3], "and");
    assert!(offset > query.len() / 2);
}

// ==================== Display and Serialization ====================

#[test]
fn test_display_round_trips() {
    let inputs = [
        r#"(name = "Ada" or age >= 30)"#,
        "not deleted_at = null",
        r#"status not in ["a", "b"]"#,
        "updated_at > created_at",
    ];
    for input in inputs {
        let expr = QueryParser::parse(input).unwrap();
        let reparsed = QueryParser::parse(&expr.to_string()).unwrap();
        assert_eq!(expr.to_string(), reparsed.to_string(), "input: {input}");
    }
}

#[test]
fn test_display_quotes_strings() {
    let expr = QueryParser::parse(r#"name = 'say "hi"'"#).unwrap();
    assert_eq!(expr.to_string(), r#"name = "say \"hi\"""#);
}

#[test]
fn test_expression_serializes_to_json() {
    let expr = QueryParser::parse("not age > 3").unwrap();
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(json["node"], "not");
    assert_eq!(json["operand"]["node"], "comparison");
    assert_eq!(json["operand"]["op"], ">");
    assert_eq!(json["operand"]["value"]["kind"], "literal");
    assert_eq!(json["operand"]["value"]["type"], "int");
    assert_eq!(json["operand"]["value"]["value"], 3);
}

#[test]
fn test_parser_accepts_any_token_iterator() {
    let tokens = vec![
        Ok(Token::new(TokenKind::Name, "a", 0)),
        Ok(Token::new(TokenKind::Comparator(Comparator::Eq), "=", 2)),
        Ok(Token::new(TokenKind::Int, "1", 4)),
    ];
    let expr = QueryParser::new(tokens.into_iter())
        .unwrap()
        .parse_query()
        .unwrap();
    assert_eq!(expr.to_string(), "a = 1");
}
