mod common;

use common::{seed, widget_db, widget_session, Widget, WIDGET, WIDGET_SELECT};
use entity_repo_core::db::DbError;
use entity_repo_core::{create_parameter_map, GenericRepository, ParameterMap, RepoError};
use rusqlite::types::Value;

fn names(widgets: &[Widget]) -> Vec<&str> {
    widgets.iter().map(|widget| widget.name.as_str()).collect()
}

#[test]
fn load_by_query_returns_the_single_match() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("alpha", 1), ("beta", 2)]);

    let widget = repo
        .load_by_query(&format!("{WIDGET_SELECT} WHERE name = 'beta'"))
        .unwrap();
    assert_eq!(widget.quantity, 2);
}

#[test]
fn load_by_query_rejects_zero_and_many_rows() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("alpha", 1), ("beta", 2)]);

    let none = repo
        .load_by_query(&format!("{WIDGET_SELECT} WHERE name = 'gamma'"))
        .unwrap_err();
    assert!(matches!(none, RepoError::NoResult { .. }));

    let many = repo.load_by_query(WIDGET_SELECT).unwrap_err();
    assert!(matches!(many, RepoError::NonUniqueResult { .. }));
}

#[test]
fn find_by_query_binds_parameters_by_name() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 5), ("c", 10), ("d", 20)]);

    let params = ParameterMap::new().with("max", 10).with(":min", 5);
    let found = repo
        .find_by_query(
            &format!("{WIDGET_SELECT} WHERE quantity BETWEEN :min AND :max ORDER BY id"),
            Some(&params),
        )
        .unwrap();
    assert_eq!(names(&found), ["b", "c"]);
}

#[test]
fn find_by_query_without_parameters_runs_unbound() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 2)]);

    let found = repo
        .find_by_query(&format!("{WIDGET_SELECT} ORDER BY id DESC"), None)
        .unwrap();
    assert_eq!(names(&found), ["b", "a"]);
}

#[test]
fn find_by_query_limited_caps_rows() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 2), ("c", 3)]);

    let sql = format!("{WIDGET_SELECT} ORDER BY id;");
    for max in 1..=4 {
        let found = repo.find_by_query_limited(&sql, None, max).unwrap();
        assert_eq!(found.len(), (max as usize).min(3));
    }
}

#[test]
fn bounded_queries_reject_max_results_below_one() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1)]);

    for max in [0, -1, -50] {
        let limited = repo
            .find_by_query_limited(WIDGET_SELECT, None, max)
            .unwrap_err();
        assert!(matches!(limited, RepoError::InvalidArgument(_)));

        let paged = repo
            .find_by_named_query_paged("Widget.all", None, 0, max)
            .unwrap_err();
        assert!(matches!(paged, RepoError::InvalidArgument(_)));
    }
}

#[test]
fn named_single_result_semantics_differ_on_zero_rows() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::<Widget, _>::try_new(&session, WIDGET).unwrap();

    let params = ParameterMap::new().with("name", "nobody".to_string());
    assert!(repo
        .find_single_by_named_query("Widget.byName", Some(&params))
        .unwrap()
        .is_none());

    let err = repo
        .load_by_named_query("Widget.byName", Some(&params))
        .unwrap_err();
    assert!(matches!(err, RepoError::NoResult { query } if query == "Widget.byName"));
}

#[test]
fn named_single_result_semantics_differ_on_many_rows() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    let seeded = seed(&repo, &[("twin", 1), ("twin", 2)]);

    let params = ParameterMap::new().with("name", "twin".to_string());
    let err = repo
        .load_by_named_query("Widget.byName", Some(&params))
        .unwrap_err();
    assert!(matches!(err, RepoError::NonUniqueResult { .. }));

    let first = repo
        .find_single_by_named_query("Widget.byName", Some(&params))
        .unwrap()
        .expect("one of the twins should be returned");
    assert!(seeded.contains(&first));
}

#[test]
fn load_by_named_query_returns_unique_match() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    let seeded = seed(&repo, &[("solo", 7), ("other", 1)]);

    let params = create_parameter_map([
        Value::Text("name".to_string()),
        Value::Text("solo".to_string()),
    ])
    .unwrap();
    let widget = repo
        .load_by_named_query("Widget.byName", Some(&params))
        .unwrap();
    assert_eq!(widget, seeded[0]);
}

#[test]
fn find_by_named_query_returns_all_matches() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 5), ("c", 9)]);

    let params = ParameterMap::new().with("min", 5);
    let found = repo
        .find_by_named_query("Widget.byMinQuantity", Some(&params))
        .unwrap();
    assert_eq!(names(&found), ["b", "c"]);
}

#[test]
fn paged_named_query_applies_offset_before_cap() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);

    let page = repo
        .find_by_named_query_paged("Widget.all", None, 1, 2)
        .unwrap();
    assert_eq!(names(&page), ["b", "c"]);

    let tail = repo
        .find_by_named_query_paged("Widget.all", None, 4, 10)
        .unwrap();
    assert_eq!(names(&tail), ["e"]);

    let past_end = repo
        .find_by_named_query_paged("Widget.all", None, 10, 1)
        .unwrap();
    assert!(past_end.is_empty());
}

#[test]
fn paged_named_query_keeps_the_statement_ordering() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 5), ("c", 9), ("d", 3)]);

    let page = repo
        .find_by_named_query_paged("Widget.byQuantityDesc", None, 1, 2)
        .unwrap();
    assert_eq!(names(&page), ["b", "d"]);
}

#[test]
fn single_result_queries_accept_a_trailing_line_comment() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 2)]);

    let sql = format!("{WIDGET_SELECT} WHERE name = 'a' -- pick a");
    assert_eq!(repo.find_by_query(&sql, None).unwrap().len(), 1);
    assert_eq!(repo.load_by_query(&sql).unwrap().name, "a");

    let params = ParameterMap::new().with("name", "b".to_string());
    let widget = repo
        .load_by_named_query("Widget.byNameAnnotated", Some(&params))
        .unwrap();
    assert_eq!(widget.quantity, 2);
}

#[test]
fn paged_named_query_rejects_negative_offset() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::<Widget, _>::try_new(&session, WIDGET).unwrap();

    let err = repo
        .find_by_named_query_paged("Widget.all", None, -1, 5)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
}

#[test]
fn unknown_named_query_is_reported() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::<Widget, _>::try_new(&session, WIDGET).unwrap();

    let err = repo.find_by_named_query("Widget.nope", None).unwrap_err();
    assert!(matches!(err, RepoError::UnknownNamedQuery(name) if name == "Widget.nope"));
}

#[test]
fn parameter_without_placeholder_is_a_store_error() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::<Widget, _>::try_new(&session, WIDGET).unwrap();

    let params = ParameterMap::new().with("unused", 1);
    let err = repo
        .find_by_named_query("Widget.all", Some(&params))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidParameterName(name))) if name == ":unused"
    ));
}

#[test]
fn native_query_returns_untyped_rows() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 1), ("b", 5), ("c", 9)]);

    let params = ParameterMap::new().with("min", 2);
    let rows = repo
        .find_by_native_query(
            "SELECT name, quantity * 2 AS doubled FROM widgets WHERE quantity > :min ORDER BY name",
            Some(&params),
        )
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].columns(), ["name", "doubled"]);
    assert_eq!(rows[0].get("name"), Some(&Value::Text("b".to_string())));
    assert_eq!(rows[0].get("doubled"), Some(&Value::Integer(10)));
    assert_eq!(
        rows[1].values(),
        [Value::Text("c".to_string()), Value::Integer(18)]
    );
}

#[test]
fn execute_update_returns_affected_row_count() {
    let conn = widget_db();
    let session = widget_session(&conn);
    let repo = GenericRepository::try_new(&session, WIDGET).unwrap();
    seed(&repo, &[("a", 0), ("b", 0), ("c", 3)]);

    let params = ParameterMap::new().with("below", 1).with("delta", 4);
    assert_eq!(repo.execute_update("Widget.restock", Some(&params)).unwrap(), 2);
    assert_eq!(repo.execute_update("Widget.purgeEmpty", None).unwrap(), 0);

    let quantities = repo
        .load_all()
        .unwrap()
        .into_iter()
        .map(|widget| widget.quantity)
        .collect::<Vec<_>>();
    assert_eq!(quantities, [4, 4, 3]);
}
