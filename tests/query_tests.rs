use chrono::NaiveDate;
use film_catalog::query::{FieldSet, FieldValue};

#[test]
fn test_empty_fieldset_renders_nothing() {
    let fields = FieldSet::new();
    assert!(fields.is_empty());
    assert_eq!(fields.len(), 0);
    assert_eq!(fields.set_clause(1), "");
    assert_eq!(fields.where_clause(1), "");
    assert!(fields.values().is_empty());
}

#[test]
fn test_set_clause_numbers_from_start() {
    let mut fields = FieldSet::new();
    fields.add("title", FieldValue::Text("Heat".into()));
    fields.add("rating", FieldValue::Int(9));

    assert_eq!(fields.set_clause(1), "title = $1, rating = $2");
    // A different starting placeholder shifts every number, nothing else.
    assert_eq!(fields.set_clause(3), "title = $3, rating = $4");
}

#[test]
fn test_where_clause_joins_with_and() {
    let mut fields = FieldSet::new();
    fields.add("f2.title", FieldValue::Text("Heat".into()));
    fields.add("a.actor_name", FieldValue::Text("Al Pacino".into()));

    assert_eq!(
        fields.where_clause(1),
        "f2.title = $1 AND a.actor_name = $2"
    );
}

#[test]
fn test_values_follow_insertion_order() {
    let date = NaiveDate::from_ymd_opt(1995, 12, 15).unwrap();

    let mut fields = FieldSet::new();
    fields.add("release_date", FieldValue::Date(date));
    fields.add("title", FieldValue::Text("Heat".into()));
    fields.add("rating", FieldValue::Int(9));

    // Placeholder order and value order must agree exactly, or the bound
    // parameters land in the wrong columns.
    assert_eq!(
        fields.set_clause(1),
        "release_date = $1, title = $2, rating = $3"
    );
    assert_eq!(
        fields.values(),
        &[
            FieldValue::Date(date),
            FieldValue::Text("Heat".into()),
            FieldValue::Int(9),
        ]
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let build = || {
        let mut fields = FieldSet::new();
        fields.add("sex", FieldValue::Text("male".into()));
        fields.add("actor_name", FieldValue::Text("Robert De Niro".into()));
        fields.set_clause(1)
    };
    assert_eq!(build(), build());
}

#[test]
fn test_values_never_appear_in_clause_text() {
    let mut fields = FieldSet::new();
    fields.add("title", FieldValue::Text("'; DROP TABLE films; --".into()));

    let clause = fields.where_clause(1);
    assert_eq!(clause, "title = $1");
    assert!(!clause.contains("DROP"));
}
