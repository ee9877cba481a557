//! In-memory evaluator tests over typed values.

use serde::Serialize;
use smartquery::{evaluate, QueryCommand, QueryError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Employee {
    id: i64,
    name: String,
    age: i64,
    department: Department,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Department {
    name: String,
}

fn employee(id: i64, name: &str, age: i64, department: &str) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        age,
        department: Department {
            name: department.to_string(),
        },
    }
}

fn staff() -> Vec<Employee> {
    vec![
        employee(1, "Ada", 36, "Engineering"),
        employee(2, "Bob", 52, "Sales"),
        employee(3, "Cleo", 36, "Engineering"),
        employee(4, "Dan", 28, "Sales"),
        employee(5, "Eve", 44, "Engineering"),
    ]
}

fn command(filter: &str, orderby: &str, skip: i32, top: i32) -> QueryCommand {
    QueryCommand::parse("Employee", skip, top, "", orderby, filter, Default::default()).unwrap()
}

#[test]
fn test_total_is_pre_pagination() {
    let cmd = command("Age~gte~30", "", 0, 2);
    let result = evaluate(staff(), &cmd).unwrap();
    assert_eq!(result.total, 4);
    assert_eq!(result.items.len(), 2);
}

#[test]
fn test_nested_member_path() {
    let cmd = command("Department.Name~eq~'Sales'", "", -1, -1);
    let result = evaluate(staff(), &cmd).unwrap();
    let ids: Vec<i64> = result.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn test_multi_key_sort_is_stable() {
    // Primary key Age leaves 1 and 3 tied; with no secondary key the input
    // order must survive.
    let cmd = command("", "Age", -1, -1);
    let result = evaluate(staff(), &cmd).unwrap();
    let ids: Vec<i64> = result.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![4, 1, 3, 5, 2]);

    // A descending secondary key breaks the tie the other way.
    let cmd = command("", "Age,Name desc", -1, -1);
    let result = evaluate(staff(), &cmd).unwrap();
    let ids: Vec<i64> = result.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![4, 3, 1, 5, 2]);
}

#[test]
fn test_skip_top_sentinels() {
    let all = evaluate(staff(), &command("", "Id", -1, -1)).unwrap();
    assert_eq!(all.items.len(), 5);

    let skipped = evaluate(staff(), &command("", "Id", 2, -1)).unwrap();
    let ids: Vec<i64> = skipped.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 4, 5]);

    let capped = evaluate(staff(), &command("", "Id", -1, 2)).unwrap();
    let ids: Vec<i64> = capped.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2]);

    // 0 is an explicit value, not "unspecified"
    let empty = evaluate(staff(), &command("", "Id", -1, 0)).unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 5);
}

#[test]
fn test_skip_past_the_end_yields_empty_page() {
    let result = evaluate(staff(), &command("", "", 99, 10)).unwrap();
    assert_eq!(result.total, 5);
    assert!(result.items.is_empty());
}

#[test]
fn test_unknown_filter_member_is_an_error() {
    let cmd = command("Salary~gt~100", "", -1, -1);
    assert!(matches!(
        evaluate(staff(), &cmd).unwrap_err(),
        QueryError::UnknownMember(member) if member == "Salary"
    ));
}

#[test]
fn test_unknown_sort_member_is_an_error() {
    let cmd = command("", "Salary", -1, -1);
    assert!(matches!(
        evaluate(staff(), &cmd).unwrap_err(),
        QueryError::UnknownMember(_)
    ));
}

#[test]
fn test_or_composition() {
    let cmd = command("Age~lt~30 or Age~gt~50", "", -1, -1);
    let result = evaluate(staff(), &cmd).unwrap();
    let ids: Vec<i64> = result.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn test_grouped_composition() {
    let cmd = command(
        "Department.Name~eq~'Engineering' and (Age~lt~40 or Name~eq~'Eve')",
        "Id",
        -1,
        -1,
    );
    let result = evaluate(staff(), &cmd).unwrap();
    let ids: Vec<i64> = result.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn test_text_operators() {
    let starts = evaluate(staff(), &command("Name~sw~'A'", "", -1, -1)).unwrap();
    assert_eq!(starts.items[0].name, "Ada");

    let ends = evaluate(staff(), &command("Name~ew~'ve'", "", -1, -1)).unwrap();
    assert_eq!(ends.items[0].name, "Eve");

    let contains = evaluate(staff(), &command("Name~ct~'le'", "", -1, -1)).unwrap();
    assert_eq!(contains.items[0].name, "Cleo");
}

#[test]
fn test_numeric_equality_crosses_int_and_float() {
    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Reading {
        value: f64,
    }

    let cmd = QueryCommand::parse("Reading", -1, -1, "", "", "Value~eq~2", Default::default())
        .unwrap();
    let result = evaluate(vec![Reading { value: 2.0 }, Reading { value: 2.5 }], &cmd).unwrap();
    assert_eq!(result.total, 1);
}

#[test]
fn test_json_value_rows() {
    // The evaluator also accepts raw JSON documents.
    let docs = vec![
        serde_json::json!({"Name": "x", "Rank": 2}),
        serde_json::json!({"Name": "y", "Rank": 1}),
    ];
    let cmd = QueryCommand::parse("Doc", -1, -1, "", "Rank", "", Default::default()).unwrap();
    let result = evaluate(docs, &cmd).unwrap();
    assert_eq!(result.items[0]["Name"], "y");
}
