//! Connection lifecycle, catalog caching and command behavior against a
//! scripted driver.

mod support;

use std::sync::Arc;

use support::{ScriptedDriver, config, connect, customer_catalog};
use vertica_record::prelude::*;
use vertica_record::{ConnectionErrorKind, Migration, SchemaCache};

#[test]
fn connection_opens_lazily_on_first_statement() {
    let mut conn = connect(ScriptedDriver::new());
    assert!(!conn.is_active());
    assert_eq!(conn.driver().connects, 0);

    conn.execute("SET SESSION AUTOCOMMIT TO ON", &[]).unwrap();
    conn.execute("SELECT 1", &[]).unwrap();
    assert!(conn.is_active());
    assert_eq!(conn.driver().connects, 1);

    conn.close().unwrap();
    conn.close().unwrap();
    assert!(!conn.is_active());
    assert_eq!(conn.driver().disconnects, 1);
}

#[test]
fn connection_runs_init_statements_once_per_open() {
    let config = config().init_statement("SET SEARCH_PATH TO app, public");
    let mut conn = Connection::new(config, ScriptedDriver::new());
    conn.open().unwrap();
    conn.open().unwrap();
    conn.execute("SELECT 1", &[]).unwrap();
    assert_eq!(
        conn.driver().log(),
        ["SET SEARCH_PATH TO app, public", "SELECT 1"]
    );
}

#[test]
fn failed_init_statement_closes_the_handle() {
    let config = config().init_statement("SET SEARCH_PATH TO app");
    let driver = ScriptedDriver::new().fail_on("SET SEARCH_PATH TO app");
    let mut conn = Connection::new(config, driver);

    assert!(conn.open().is_err());
    assert!(!conn.is_active());
    assert_eq!(conn.driver().disconnects, 1);

    // The next statement reopens and retries the init statement.
    assert!(conn.execute("SELECT 1", &[]).is_err());
    assert!(!conn.is_active());
    assert_eq!(
        conn.driver().log(),
        ["SET SEARCH_PATH TO app", "SET SEARCH_PATH TO app"]
    );
}

#[test]
fn connection_rejects_non_vertica_component() {
    let config = config().component("mysql");
    let mut conn = Connection::new(config, ScriptedDriver::new());
    let err = conn.open().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(conn.driver().connects, 0);
}

#[test]
fn connection_surfaces_driver_connect_failure() {
    let mut conn = connect(ScriptedDriver::new().refuse_connect("data source not found"));
    let err = conn.execute("SELECT 1", &[]).unwrap_err();
    match err {
        Error::Connection(e) => {
            assert_eq!(e.kind, ConnectionErrorKind::Connect);
            assert!(e.message.contains("data source not found"));
        }
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[test]
fn failed_statement_carries_rendered_sql() {
    let driver = ScriptedDriver::new().fail_on("DELETE FROM customers WHERE id=3");
    let mut conn = connect(driver);
    let err = conn
        .execute("DELETE FROM customers WHERE id=?", &[Value::from(3)])
        .unwrap_err();
    match err {
        Error::Execution(e) => {
            assert_eq!(e.sql.as_deref(), Some("DELETE FROM customers WHERE id=3"));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
}

#[test]
fn check_credentials_reports_failure_message() {
    let mut conn = connect(ScriptedDriver::new());
    assert_eq!(conn.check_credentials("VerticaDSN", "dbadmin", "secret"), None);

    let message = conn
        .check_credentials("VerticaDSN", "dbadmin", "wrong")
        .expect("bad password should fail");
    assert!(message.contains("authentication failed"));

    // A login check never opens the connection's own handle.
    assert!(!conn.is_active());
    assert_eq!(conn.driver().login_attempts, ["VerticaDSN", "VerticaDSN"]);
}

#[test]
fn database_name_is_read_once() {
    let driver = ScriptedDriver::new().respond(
        "SELECT database_name FROM databases",
        vec![Row::from_pairs([("database_name", "analytics")])],
    );
    let mut conn = connect(driver);
    assert_eq!(conn.database_name().unwrap(), "analytics");
    assert_eq!(conn.database_name().unwrap(), "analytics");
    assert_eq!(
        conn.driver()
            .statements_starting_with("SELECT database_name")
            .len(),
        1
    );
}

#[test]
fn schema_cache_hits_catalog_once_per_table() {
    let mut conn = connect(customer_catalog(ScriptedDriver::new()));
    for _ in 0..3 {
        assert_eq!(
            &*conn.table_columns("customers").unwrap(),
            ["id", "name", "status", "views"]
        );
        assert_eq!(conn.table_primary_key("customers").unwrap(), "id");
    }
    let driver = conn.driver();
    assert_eq!(
        driver
            .statements_starting_with("SELECT column_name FROM COLUMNS")
            .len(),
        1
    );
    assert_eq!(
        driver
            .statements_starting_with("SELECT is_identity, column_name")
            .len(),
        1
    );
    let stats = conn.schema_cache().stats();
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.hits, 4);
}

#[test]
fn shared_schema_cache_spans_connections() {
    let cache = Arc::new(SchemaCache::new());
    let mut first =
        connect(customer_catalog(ScriptedDriver::new())).with_schema_cache(Arc::clone(&cache));
    let mut second =
        connect(customer_catalog(ScriptedDriver::new())).with_schema_cache(Arc::clone(&cache));

    first.table_primary_key("customers").unwrap();
    second.table_primary_key("customers").unwrap();
    assert_eq!(first.driver().log().len(), 1);
    assert!(second.driver().log().is_empty());

    cache.invalidate("customers");
    second.table_primary_key("customers").unwrap();
    assert_eq!(second.driver().log().len(), 1);
}

#[test]
fn primary_key_prefers_identity_over_int() {
    let driver = ScriptedDriver::new()
        .catalog(
            "events",
            &[
                ("tenant_id", "int", false),
                ("event_id", "int", true),
                ("payload", "varchar(1024)", false),
            ],
        )
        .catalog(
            "metrics",
            &[("label", "varchar(20)", false), ("bucket", "int", false)],
        )
        .catalog("notes", &[("body", "long varchar", false)]);
    let mut conn = connect(driver);
    assert_eq!(conn.table_primary_key("events").unwrap(), "event_id");
    assert_eq!(conn.table_primary_key("metrics").unwrap(), "bucket");
    assert_eq!(conn.table_primary_key("notes").unwrap(), "");
}

#[test]
fn catalog_errors_are_not_cached() {
    let driver = customer_catalog(ScriptedDriver::new())
        .fail_on("SELECT column_name FROM COLUMNS WHERE table_name='customers'");
    let mut conn = connect(driver);
    assert!(conn.table_columns("customers").is_err());
    assert!(conn.table_columns("customers").is_err());
    assert_eq!(conn.driver().log().len(), 2);
    assert!(conn.schema_cache().cached_columns("customers").is_none());
}

#[test]
fn command_uses_selected_table_for_catalog_lookups() {
    let mut conn = connect(customer_catalog(ScriptedDriver::new()));
    assert!(matches!(
        conn.create_command().primary_key(),
        Err(Error::Configuration(_))
    ));

    conn.select_table("customers");
    let mut command = conn.create_command();
    assert_eq!(command.primary_key().unwrap(), "id");
    assert_eq!(command.columns().unwrap().len(), 4);
}

#[test]
fn command_builds_and_executes_update() {
    let mut conn = connect(ScriptedDriver::new().affect("UPDATE customers", 1));
    let affected = {
        let mut command = conn.create_command();
        command
            .build_update(
                "customers",
                "id",
                Value::from(9),
                [("id", Value::from(9)), ("status", Value::from(2))],
            )
            .unwrap();
        assert_eq!(command.raw_sql(), "UPDATE customers SET status=2 WHERE id=9");
        command.execute().unwrap()
    };
    assert_eq!(affected, 1);
    assert_eq!(conn.driver().log(), ["UPDATE customers SET status=2 WHERE id=9"]);
}

#[test]
fn command_without_statement_is_an_error() {
    let mut conn = connect(ScriptedDriver::new());
    assert!(conn.create_command().execute().is_err());
    assert!(conn.driver().log().is_empty());
}

#[test]
fn command_converts_select_into_delete() {
    let mut conn = connect(ScriptedDriver::new());
    let mut command = conn.create_command();
    command
        .set_sql("SELECT * FROM orders WHERE status=0")
        .build_delete_from_query()
        .unwrap();
    assert_eq!(command.sql(), "DELETE FROM orders WHERE status=0");

    command.set_sql("UPDATE orders SET status=1");
    assert!(command.build_delete_from_query().is_err());
}

#[test]
fn command_refuses_to_widen_paged_delete() {
    let mut conn = connect(ScriptedDriver::new());
    let mut command = conn.create_command();
    for sql in [
        "SELECT * FROM orders WHERE status=0 ORDER BY id",
        "SELECT * FROM orders WHERE status=0 LIMIT 10",
        "SELECT * FROM orders WHERE status=0 limit 10 offset 20",
    ] {
        command.set_sql(sql);
        assert!(
            matches!(command.build_delete_from_query(), Err(Error::Unsupported(_))),
            "{sql}"
        );
    }
    assert!(conn.driver().log().is_empty());
}

#[test]
fn command_scalar_reads_first_column() {
    let driver = ScriptedDriver::new().respond(
        "SELECT COUNT(*) FROM customers",
        vec![Row::from_pairs([("count", 42)])],
    );
    let mut conn = connect(driver);
    let mut command = conn.create_command();
    command.set_sql("SELECT COUNT(*) FROM customers");
    assert_eq!(command.query_scalar().unwrap(), Some(Value::BigInt(42)));
}

#[test]
fn command_table_name_by_id() {
    let driver = ScriptedDriver::new().respond(
        "SELECT table_name FROM tables WHERE table_id=45035996273704982",
        vec![Row::from_pairs([("table_name", "customers")])],
    );
    let mut conn = connect(driver);
    let mut command = conn.create_command();
    assert_eq!(
        command.table_name_by_id(45_035_996_273_704_982_i64).unwrap(),
        Some("customers".to_string())
    );
    assert_eq!(command.table_name_by_id(1).unwrap(), None);
}

struct CreateCustomers;

impl Migration for CreateCustomers {
    fn name(&self) -> &str {
        "create_customers"
    }

    fn up<D: Driver>(&self, migrator: &mut Migrator<'_, D>) -> Result<()> {
        migrator.create_table(
            &CreateTable::new("customers")
                .column("id", "IDENTITY(1,1)")
                .column("name", "VARCHAR(80) NOT NULL")
                .constraint("PRIMARY KEY (id)"),
        )
    }
}

#[test]
fn migrator_requires_vertica_configuration() {
    let mut conn = Connection::new(config().component("pgsql"), ScriptedDriver::new());
    assert!(matches!(
        Migrator::new(&mut conn),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn migrator_applies_and_refuses_to_revert() {
    let mut conn = connect(customer_catalog(ScriptedDriver::new()));
    conn.table_columns("customers").unwrap();

    let mut migrator = Migrator::new(&mut conn).unwrap();
    migrator.up(&CreateCustomers).unwrap();
    assert!(matches!(
        migrator.down(&CreateCustomers),
        Err(Error::Unsupported(_))
    ));

    let created = conn.driver().statements_starting_with("CREATE TABLE customers");
    assert_eq!(created.len(), 1);
    assert!(created[0].contains("PRIMARY KEY (id)"));
    assert!(conn.schema_cache().cached_columns("customers").is_none());
}
