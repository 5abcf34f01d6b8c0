//! Rewriter Scenario Tests
//!
//! End-to-end checks of the public rewriting API against realistic templates:
//! - The reference scenarios (SELECT, multi-parameter, INSERT, literal colons, repeats)
//! - Route-style templates with many parameters
//! - Invariants that must hold for every template (counts, order, round trip)
//! - Concurrent use from several threads

use namedsql::{rewrite, rewrite_with, RewriteOptions};
use pretty_assertions::assert_eq;

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn test_reference_scenarios() {
    let cases: &[(&str, &str, &[&str])] = &[
        ("SELECT * FROM users WHERE id = :id", "SELECT * FROM users WHERE id = ?", &["id"]),
        (
            "SELECT * FROM users WHERE email = :email AND age > :min_age",
            "SELECT * FROM users WHERE email = ? AND age > ?",
            &["email", "min_age"],
        ),
        (
            "INSERT INTO users (id, name, email) VALUES (:id, :name, :email)",
            "INSERT INTO users (id, name, email) VALUES (?, ?, ?)",
            &["id", "name", "email"],
        ),
        (
            "SELECT * FROM logs WHERE message = 'Time: 10:30' AND user_id = :user_id",
            "SELECT * FROM logs WHERE message = 'Time: 10:30' AND user_id = ?",
            &["user_id"],
        ),
        ("UPDATE t SET a = :x WHERE b = :x", "UPDATE t SET a = ? WHERE b = ?", &["x", "x"]),
    ];

    for (template, expected_query, expected_params) in cases {
        let rewritten = rewrite(template);
        assert_eq!(rewritten.query, *expected_query, "template: {template}");
        assert_eq!(rewritten.params, *expected_params, "template: {template}");
    }
}

// ============================================================================
// Route-Style Templates
// ============================================================================

#[test]
fn test_user_registration_route() {
    let rewritten = rewrite(
        "INSERT INTO users (id, email, password, name, created_at, status) \
         VALUES (:id, :email, :password, :name, :created_at, :status)",
    );

    assert_eq!(
        rewritten.params,
        vec!["id", "email", "password", "name", "created_at", "status"]
    );
    assert!(rewritten.query.ends_with("VALUES (?, ?, ?, ?, ?, ?)"));
}

#[test]
fn test_order_creation_routes() {
    let templates = [
        (
            "INSERT INTO orders (id, order_number, user_id, status, total_amount, created_at) \
             VALUES (:id, :order_number, :user_id, :status, :total, :created_at)",
            vec!["id", "order_number", "user_id", "status", "total", "created_at"],
        ),
        (
            "INSERT INTO order_items (id, order_id, product_id, quantity, price, subtotal) \
             VALUES (:id, :order_id, :product_id, :quantity, :price, :subtotal)",
            vec!["id", "order_id", "product_id", "quantity", "price", "subtotal"],
        ),
        (
            "UPDATE products SET stock = stock - :quantity WHERE id = :product_id",
            vec!["quantity", "product_id"],
        ),
    ];

    for (template, expected) in templates {
        assert_eq!(rewrite(template).params, expected);
    }
}

#[test]
fn test_postgres_flavoured_template() {
    let template = "SELECT payload->>'kind', created_at::date \
                    FROM events \
                    WHERE payload @> '{\"tags\": [\"a:b\"]}'::jsonb \
                      AND created_at BETWEEN :from AND :to";
    let rewritten = rewrite(template);

    assert_eq!(rewritten.params, vec!["from", "to"]);
    assert!(rewritten.query.contains("created_at::date"));
    assert!(rewritten.query.contains("'{\"tags\": [\"a:b\"]}'::jsonb"));
    assert!(rewritten.query.ends_with("BETWEEN ? AND ?"));
}

#[test]
fn test_commented_template_with_options() {
    let template = "-- fetch :limit rows for a user\n\
                    SELECT * FROM users /* :ignored */ WHERE id = :id";

    assert_eq!(rewrite(template).params, vec!["limit", "ignored", "id"]);

    let options = RewriteOptions::default().with_comments();
    assert_eq!(rewrite_with(template, &options).params, vec!["id"]);
}

// ============================================================================
// Invariants
// ============================================================================

const CORPUS: &[&str] = &[
    "",
    ":",
    "::",
    ":a",
    "SELECT 1",
    "SELECT * FROM users WHERE id = :id",
    "WHERE t = '10:30' AND u = :u AND v = \"x:y\"",
    "WHERE a = :a OR a = :a OR b = :b",
    "VALUES (:a,:b,:c)",
    "SELECT 'unterminated :x",
    "SELECT \"it's\" || 'say \"hi\"' || :name",
    "SELECT 'a''b:c' , :d",
    "x::int + :y::text",
    "map {key: value, other: :real}",
    "日本語 :名前 :name",
];

#[test]
fn test_placeholder_count_matches_params() {
    for template in CORPUS {
        let rewritten = rewrite(template);
        assert_eq!(rewritten.slots().len(), rewritten.params.len(), "template: {template}");
        assert_eq!(
            rewritten.query.matches('?').count(),
            rewritten.params.len(),
            "template: {template}"
        );
    }
}

#[test]
fn test_round_trip_reconstructs_template() {
    let options = [
        RewriteOptions::default(),
        RewriteOptions::default().with_comments(),
        RewriteOptions::default().with_backslash_escapes(),
    ];

    for template in CORPUS {
        for options in &options {
            assert_eq!(rewrite_with(template, options).to_template(), *template);
        }
    }
}

#[test]
fn test_params_follow_template_order() {
    for template in CORPUS {
        let rewritten = rewrite(template);
        let mut cursor = 0;
        for name in &rewritten.params {
            let needle = format!(":{name}");
            let found = template[cursor..]
                .find(&needle)
                .unwrap_or_else(|| panic!("{needle} not found in order in {template}"));
            cursor += found + needle.len();
        }
    }
}

#[test]
fn test_plain_text_is_identity() {
    for template in ["SELECT 1", "a : b", "ratio 16:9", "'quoted :x'", "x::int"] {
        let rewritten = rewrite(template);
        assert_eq!(rewritten.query, template);
        assert!(rewritten.params.is_empty());
    }
}

#[test]
fn test_large_template_is_linear_and_complete() {
    let clause = "(:a, 'b:c', :d_1)";
    let template = vec![clause; 10_000].join(", ");

    let rewritten = rewrite(&template);
    assert_eq!(rewritten.placeholder_count(), 20_000);
    assert_eq!(rewritten.distinct_params(), vec!["a", "d_1"]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_rewrites_are_independent() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let template = format!("SELECT * FROM t{i} WHERE a = :a{i} AND b = :b{i}");
                rewrite(&template)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let rewritten = handle.join().unwrap();
        assert_eq!(rewritten.params, vec![format!("a{i}"), format!("b{i}")]);
        assert_eq!(rewritten.query, format!("SELECT * FROM t{i} WHERE a = ? AND b = ?"));
    }
}
