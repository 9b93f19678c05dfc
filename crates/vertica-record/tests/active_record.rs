//! Record persistence, finders and bulk operations against a scripted driver.

mod support;

use support::{Customer, ScriptedDriver, connect, customer_catalog, customer_row};
use vertica_record::RecordState;
use vertica_record::prelude::*;

fn customers() -> ScriptedDriver {
    customer_catalog(ScriptedDriver::new())
}

/// Append-only table without an identity or int column.
#[derive(Debug)]
struct AuditLine(Record);

impl ActiveRecord for AuditLine {
    const TABLE_NAME: &'static str = "audit_lines";

    fn from_record(record: Record) -> Self {
        AuditLine(record)
    }

    fn record(&self) -> &Record {
        &self.0
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }
}

#[test]
fn insert_renders_exact_statement() {
    let mut conn = connect(customers());
    let mut acme = Customer::new_record();
    acme.set("name", "Acme");
    acme.set("status", 1);

    assert!(acme.insert(&mut conn, true, None).unwrap());
    assert!(!acme.is_new_record());
    assert_eq!(
        conn.driver().data_statements(),
        ["INSERT INTO customers (name, status) VALUES ('Acme', 1)"]
    );
}

#[test]
fn insert_writes_only_catalog_columns() {
    let mut conn = connect(customers());
    let mut acme = Customer::new_record();
    acme.set("name", "Acme");
    acme.set("order_count", 12);

    acme.insert(&mut conn, true, None).unwrap();
    assert_eq!(
        conn.driver().data_statements(),
        ["INSERT INTO customers (name) VALUES ('Acme')"]
    );
}

#[test]
fn insert_limited_to_named_attributes() {
    let mut conn = connect(customers());
    let mut acme = Customer::new_record();
    acme.set("name", "Acme");
    acme.set("status", 3);

    acme.insert(&mut conn, true, Some(&["name"])).unwrap();
    assert_eq!(
        conn.driver().data_statements(),
        ["INSERT INTO customers (name) VALUES ('Acme')"]
    );
}

#[test]
fn limited_insert_leaves_unwritten_attributes_dirty() {
    let mut conn = connect(customers());
    let mut acme = Customer::new_record();
    acme.set("id", 1);
    acme.set("name", "Acme");
    acme.set("status", 3);

    acme.insert(&mut conn, true, Some(&["id", "name"])).unwrap();
    assert_eq!(
        acme.record().dirty_attributes(None).keys().collect::<Vec<_>>(),
        ["status"]
    );

    conn.driver_mut().clear_log();
    assert!(acme.save(&mut conn).unwrap());
    assert_eq!(
        conn.driver().data_statements(),
        ["UPDATE customers SET status=3 WHERE id=1"]
    );
}

#[test]
fn insert_cancelled_by_validation_or_hook() {
    let mut conn = connect(customers());

    let mut unnamed = Customer::new_record();
    unnamed.set("status", 1);
    assert!(!unnamed.insert(&mut conn, true, None).unwrap());
    assert!(unnamed.is_new_record());

    let mut vetoed = Customer::new_record();
    vetoed.set("name", "vetoed");
    assert!(!vetoed.save(&mut conn).unwrap());

    assert!(conn.driver().log().is_empty());
}

#[test]
fn insert_then_find_round_trips() {
    let driver = customers().respond(
        "SELECT * FROM customers WHERE id=1",
        vec![customer_row(1, "Acme", 1)],
    );
    let mut conn = connect(driver);

    let mut acme = Customer::new_record();
    acme.set("name", "Acme");
    acme.set("status", 1);
    acme.insert(&mut conn, true, None).unwrap();

    let found = Customer::find_by_pk(&mut conn, 1)
        .unwrap()
        .expect("inserted customer");
    assert_eq!(found.get("name"), acme.get("name"));
    assert_eq!(found.get("status"), acme.get("status"));
    assert!(!found.record().is_dirty());
    assert_eq!(
        found.primary_key_value(&mut conn).unwrap(),
        Some(Value::BigInt(1))
    );
}

#[test]
fn update_writes_dirty_attributes_pinned_on_loaded_key() {
    let driver = customers().respond(
        "SELECT * FROM customers WHERE id=1",
        vec![customer_row(1, "Acme", 1)],
    );
    let mut conn = connect(driver);
    let mut acme = Customer::find_by_pk(&mut conn, 1).unwrap().unwrap();
    conn.driver_mut().clear_log();

    acme.set("id", 99);
    acme.set("name", "Acme Corp");
    assert!(acme.save(&mut conn).unwrap());
    assert_eq!(
        conn.driver().data_statements(),
        ["UPDATE customers SET name='Acme Corp' WHERE id=1"]
    );

    // The key was never written, so later saves still target the stored row.
    conn.driver_mut().clear_log();
    acme.set("ID", 100);
    acme.set("status", 5);
    acme.save(&mut conn).unwrap();
    assert_eq!(
        conn.driver().data_statements(),
        ["UPDATE customers SET status=5 WHERE id=1"]
    );

    // Only the unwritable key changes are left, so nothing is sent.
    conn.driver_mut().clear_log();
    acme.update(&mut conn, true, None).unwrap();
    assert!(conn.driver().data_statements().is_empty());
}

#[test]
fn delete_removes_by_primary_key() {
    let driver = customers().respond(
        "SELECT * FROM customers WHERE id=4",
        vec![customer_row(4, "Initech", 0)],
    );
    let mut conn = connect(driver);
    let mut initech = Customer::find_by_pk(&mut conn, 4).unwrap().unwrap();

    assert_eq!(initech.delete(&mut conn).unwrap(), 1);
    assert_eq!(initech.record().state(), RecordState::Deleted);
    assert_eq!(
        conn.driver().statements_starting_with("DELETE"),
        ["DELETE FROM customers WHERE id=4"]
    );
}

#[test]
fn update_all_never_writes_primary_key() {
    let mut conn = connect(customers().affect("UPDATE customers", 1));
    let affected = Customer::update_all(
        &mut conn,
        [("id", 7), ("status", 0)],
        &Condition::eq("id", 3).and(Condition::eq("status", 1)),
    )
    .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        conn.driver().data_statements(),
        ["UPDATE customers SET status=0 WHERE id=3 AND status=1"]
    );
}

#[test]
fn update_all_key_pin_ignores_column_case() {
    let mut conn = connect(customers());
    let affected =
        Customer::update_all(&mut conn, [("status", 2)], &Condition::eq("ID", 3)).unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        conn.driver().data_statements(),
        ["UPDATE customers SET status=2 WHERE ID=3"]
    );
}

#[test]
fn update_all_without_key_pin_is_a_no_op() {
    let mut conn = connect(customers());
    let affected =
        Customer::update_all(&mut conn, [("status", 0)], &Condition::eq("status", 1)).unwrap();
    assert_eq!(affected, 0);

    let ranged = Customer::update_all(
        &mut conn,
        [("status", 0)],
        &Condition::in_list("id", [1, 2]),
    )
    .unwrap();
    assert_eq!(ranged, 0);
    assert!(conn.driver().data_statements().is_empty());
}

#[test]
fn update_all_counters_runs_once_per_key() {
    let mut conn = connect(customers());
    let affected = Customer::update_all_counters(
        &mut conn,
        &[("views", 1)],
        &Condition::in_list("id", [10, 11]),
    )
    .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(
        conn.driver().data_statements(),
        [
            "UPDATE customers SET views=views+1 WHERE id=10",
            "UPDATE customers SET views=views+1 WHERE id=11",
        ]
    );
}

#[test]
fn update_all_counters_resolves_keys_from_condition() {
    let driver = customers().respond(
        "SELECT id FROM customers WHERE status=1",
        vec![
            Row::from_pairs([("id", 5)]),
            Row::from_pairs([("id", 6)]),
        ],
    );
    let mut conn = connect(driver);
    Customer::update_all_counters(&mut conn, &[("views", -2)], &Condition::eq("status", 1))
        .unwrap();

    assert_eq!(
        conn.driver().data_statements(),
        [
            "SELECT id FROM customers WHERE status=1",
            "UPDATE customers SET views=views+-2 WHERE id=5",
            "UPDATE customers SET views=views+-2 WHERE id=6",
        ]
    );
}

#[test]
fn update_all_counters_rejects_columns_outside_allow_list() {
    let mut conn = connect(customers());
    for column in ["status", "views; DROP TABLE customers", "clicks"] {
        let err = Customer::update_all_counters(
            &mut conn,
            &[(column, 1)],
            &Condition::eq("id", 1),
        )
        .unwrap_err();
        assert!(
            matches!(err, Error::InvalidIdentifier(_)),
            "{column} should be rejected, got {err:?}"
        );
    }
    assert!(conn.driver().data_statements().is_empty());
}

#[test]
fn delete_all_attempts_every_key_and_reports_failures() {
    let driver = customers().fail_on("DELETE FROM customers WHERE id=2");
    let mut conn = connect(driver);

    let err = Customer::delete_all(&mut conn, Some(&Condition::in_list("id", [1, 2, 3])))
        .unwrap_err();
    let bulk = match err {
        Error::Bulk(bulk) => bulk,
        other => panic!("expected bulk error, got {other:?}"),
    };
    assert_eq!(bulk.operation, "delete_all");
    assert_eq!(bulk.table, "customers");
    assert_eq!(bulk.affected, 2);
    assert_eq!(bulk.failed_keys(), [&Value::BigInt(2)]);
    assert_eq!(
        conn.driver().statements_starting_with("DELETE"),
        [
            "DELETE FROM customers WHERE id=1",
            "DELETE FROM customers WHERE id=2",
            "DELETE FROM customers WHERE id=3",
        ]
    );
}

#[test]
fn delete_all_without_condition_selects_every_key() {
    let driver = customers().respond(
        "SELECT id FROM customers",
        vec![Row::from_pairs([("id", 8)])],
    );
    let mut conn = connect(driver);
    assert_eq!(Customer::delete_all(&mut conn, None).unwrap(), 1);
    assert_eq!(
        conn.driver().data_statements(),
        ["SELECT id FROM customers", "DELETE FROM customers WHERE id=8"]
    );
}

#[test]
fn delete_all_without_primary_key_issues_single_statement() {
    let driver = ScriptedDriver::new()
        .catalog("audit_lines", &[("message", "varchar(200)", false)])
        .affect("DELETE FROM audit_lines", 4);
    let mut conn = connect(driver);

    let affected =
        AuditLine::delete_all(&mut conn, Some(&Condition::eq("message", "retry"))).unwrap();
    assert_eq!(affected, 4);
    assert_eq!(
        conn.driver().data_statements(),
        ["DELETE FROM audit_lines WHERE message='retry'"]
    );

    let mut line = AuditLine::new_record();
    line.set("message", "retry");
    line.insert(&mut conn, false, None).unwrap();
    assert!(matches!(
        AuditLine::find_by_pk(&mut conn, 1),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn one_on_empty_result_is_none() {
    let mut conn = connect(customers());
    let found = Customer::find()
        .filter(Condition::eq("name", "nobody"))
        .one(&mut conn)
        .unwrap();
    assert!(found.is_none());

    let row = Customer::find()
        .filter(Condition::eq("status", 1))
        .limit(3)
        .as_array()
        .one(&mut conn)
        .unwrap();
    assert!(row.is_none());
    assert_eq!(
        conn.driver().data_statements(),
        [
            "SELECT * FROM customers WHERE name='nobody' LIMIT 1",
            "SELECT * FROM customers WHERE status=1 LIMIT 3",
        ]
    );
}

#[test]
fn all_on_empty_result_is_empty() {
    let mut conn = connect(customers());
    let found = Customer::find_all(&mut conn, Condition::eq("status", 9)).unwrap();
    assert!(found.is_empty());
    assert!(Customer::find_all_by_pk(&mut conn, Vec::new()).unwrap().is_empty());
    assert_eq!(conn.driver().data_statements().len(), 1);
}

#[test]
fn query_flags_columns_unknown_to_catalog() {
    let mut row = customer_row(1, "Acme", 1).into_pairs();
    row.push(("order_count".to_string(), Value::from(3)));
    let driver = customers().respond("SELECT * FROM customers", vec![Row::from_pairs(row)]);
    let mut conn = connect(driver);

    let found = Customer::find()
        .order_by("name", Direction::Asc)
        .limit(5)
        .all(&mut conn)
        .unwrap();
    assert_eq!(found.len(), 1);
    let record = found[0].record();
    assert!(record.is_extra("order_count"));
    assert!(!record.is_extra("name"));
    assert_eq!(
        found[0].to_json(),
        serde_json::json!({"id": 1, "name": "Acme", "status": 1, "order_count": 3})
    );
    assert_eq!(
        conn.driver().data_statements(),
        ["SELECT * FROM customers ORDER BY name ASC LIMIT 5"]
    );
}

#[test]
fn computed_select_loads_as_extra() {
    let driver = customers().respond(
        "SELECT COUNT(*) AS n FROM customers",
        vec![Row::from_pairs([("n", 3)])],
    );
    let mut conn = connect(driver);

    let found = Customer::find()
        .select_expr("COUNT(*)", "n")
        .filter(Condition::eq("status", 1))
        .all(&mut conn)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].record().is_extra("n"));
    assert_eq!(found[0].get("n"), Some(&Value::BigInt(3)));
    assert_eq!(
        conn.driver().data_statements(),
        ["SELECT COUNT(*) AS n FROM customers WHERE status=1"]
    );
}

#[test]
fn count_exists_and_column() {
    let driver = customers()
        .respond(
            "SELECT COUNT(*) FROM customers WHERE status=1",
            vec![Row::from_pairs([("count", 2)])],
        )
        .respond(
            "SELECT name FROM customers WHERE status=1",
            vec![
                Row::from_pairs([("name", "Acme")]),
                Row::from_pairs([("name", "Globex")]),
            ],
        );
    let mut conn = connect(driver);
    let active = || Customer::find().filter(Condition::eq("status", 1));

    assert_eq!(active().count(&mut conn).unwrap(), 2);
    assert!(active().exists(&mut conn).unwrap());
    assert!(
        !Customer::find()
            .filter(Condition::eq("status", 7))
            .exists(&mut conn)
            .unwrap()
    );
    assert_eq!(
        active().column(&mut conn, "name").unwrap(),
        [Value::from("Acme"), Value::from("Globex")]
    );
}

#[test]
fn as_array_returns_raw_rows() {
    let driver = customers().respond(
        "SELECT id, name FROM customers",
        vec![Row::from_pairs([("id", Value::from(1)), ("name", Value::from("Acme"))])],
    );
    let mut conn = connect(driver);
    let rows = Customer::find()
        .select(["id", "name"])
        .as_array()
        .all(&mut conn)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_named("name"), Some(&Value::from("Acme")));
    // Raw rows never consult the catalog.
    assert_eq!(conn.driver().log().len(), 1);
}

#[test]
fn query_delete_reuses_where_clause() {
    let mut conn = connect(customers().affect("DELETE FROM customers", 3));
    let affected = Customer::find()
        .filter(Condition::eq("status", 0))
        .delete(&mut conn)
        .unwrap();
    assert_eq!(affected, 3);
    assert_eq!(
        conn.driver().log(),
        ["DELETE FROM customers WHERE status=0"]
    );
}

#[test]
fn query_delete_refuses_paging() {
    let mut conn = connect(customers());
    let limited = Customer::find()
        .filter(Condition::eq("status", 0))
        .order_by("id", Direction::Desc)
        .limit(10)
        .delete(&mut conn);
    assert!(matches!(limited, Err(Error::Unsupported(_))));

    let offset = Customer::find().offset(5).delete(&mut conn);
    assert!(matches!(offset, Err(Error::Unsupported(_))));
    assert!(conn.driver().log().is_empty());
}

#[test]
fn unlink_is_unsupported() {
    let mut acme = Customer::new_record();
    let order = Record::new("orders");
    assert!(matches!(
        acme.unlink("orders", &order),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(acme.unlink_all("orders"), Err(Error::Unsupported(_))));
}
