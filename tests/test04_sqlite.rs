#![cfg(feature = "sqlite")]

use sql_dbd::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

fn open_with_table(prefix: &str, autocommit: bool) -> Result<Connection, SqlDbdError> {
    let conn = SqliteOptionsBuilder::new(unique_db_path(prefix))
        .create(true)
        .autocommit(autocommit)
        .build()?;
    conn.run(
        "CREATE TABLE scores (id INTEGER PRIMARY KEY, Name TEXT, score REAL, big INTEGER)",
        &[],
    )?;
    Ok(conn)
}

#[test]
fn integers_round_trip_exactly() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_table("ints", true)?;
    let mut insert = conn.prepare("INSERT INTO scores (id, big) VALUES (?, ?)")?;
    for (id, big) in [(1, i64::MAX), (2, i64::MIN), (3, 0)] {
        insert.execute(&[id.into(), big.into()])?;
        assert_eq!(insert.affected_rows()?, 1);
    }

    let mut select = conn.prepare("SELECT big FROM scores ORDER BY id")?;
    select.execute(&[])?;
    let values = select
        .rows(false)
        .map(|row| row.map(Row::into_values))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        values,
        vec![
            vec![DbValue::Integer(i64::MAX)],
            vec![DbValue::Integer(i64::MIN)],
            vec![DbValue::Integer(0)],
        ]
    );
    Ok(())
}

#[test]
fn nulls_and_mixed_kinds_decode() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_table("mixed", true)?;
    conn.run(
        "INSERT INTO scores (id, Name, score) VALUES (?, ?, ?)",
        &[1.into(), ScriptValue::Nil, 2.5.into()],
    )?;
    conn.run(
        "INSERT INTO scores (id, Name, score) VALUES (?, ?, ?)",
        &[2.into(), "it's".into(), true.into()],
    )?;

    let mut stmt = conn.prepare("SELECT id, Name, score FROM scores WHERE id = ?")?;
    assert_eq!(
        stmt.columns()?,
        Some(vec!["id".into(), "name".into(), "score".into()])
    );

    stmt.execute(&[1.into()])?;
    let row = stmt.fetch(true)?.expect("row 1");
    assert_eq!(row.get("name"), Some(&DbValue::Nil));
    assert_eq!(row.get("score"), Some(&DbValue::Float(2.5)));
    assert!(stmt.fetch(true)?.is_none());
    assert!(stmt.fetch(true)?.is_none());

    stmt.execute(&[2.into()])?;
    let row = stmt.fetch(true)?.expect("row 2");
    assert_eq!(row.get("name"), Some(&DbValue::String("it's".into())));
    // REAL affinity stores the bound boolean as 1.0.
    assert_eq!(row.get("score"), Some(&DbValue::Float(1.0)));
    Ok(())
}

#[test]
fn rollback_discards_and_commit_persists() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open_with_table("tx", true)?;
    conn.autocommit(false)?;
    assert!(!conn.in_transaction());

    conn.run("INSERT INTO scores (id) VALUES (?)", &[1.into()])?;
    assert!(conn.in_transaction());
    assert!(conn.rollback()?);
    assert!(!conn.in_transaction());

    conn.run("INSERT INTO scores (id) VALUES (?)", &[2.into()])?;
    assert!(conn.commit()?);

    conn.run("INSERT INTO scores (id) VALUES (?)", &[3.into()])?;
    // Switching autocommit back on commits the pending insert.
    conn.autocommit(true)?;
    assert!(!conn.in_transaction());

    let mut stmt = conn.prepare("SELECT id FROM scores ORDER BY id")?;
    stmt.execute(&[])?;
    let ids = stmt
        .rows(false)
        .map(|row| row.map(|r| r.get_by_index(0).and_then(DbValue::as_int)))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(ids, vec![Some(2), Some(3)]);
    Ok(())
}

#[test]
fn close_rolls_back_pending_work() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("close");
    {
        let conn = SqliteOptionsBuilder::new(path.clone()).create(true).build()?;
        conn.run("CREATE TABLE t (id INTEGER)", &[])?;
    }
    {
        let mut conn = SqliteOptionsBuilder::new(path.clone()).autocommit(false).build()?;
        conn.run("INSERT INTO t VALUES (?)", &[7.into()])?;
        conn.close();
        conn.close();
    }
    let conn = SqliteOptionsBuilder::new(path).build()?;
    let mut stmt = conn.prepare("SELECT count(*) AS n FROM t")?;
    stmt.execute(&[])?;
    let row = stmt.fetch(true)?.expect("count row");
    assert_eq!(row.get("n"), Some(&DbValue::Integer(0)));
    Ok(())
}

#[test]
fn missing_file_without_create_fails_to_open() {
    let path = unique_db_path("absent");
    let err = SqliteOptionsBuilder::new(path).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
}

#[test]
fn prepare_and_count_errors() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_table("errors", true)?;
    let err = conn.prepare("SELEC 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrepareFailed);

    let mut stmt = conn.prepare("INSERT INTO scores (id, Name) VALUES (?, ?)")?;
    let err = stmt.execute(&[1.into()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParamCountMismatch);

    stmt.execute(&[1.into(), "a".into()])?;
    let err = stmt.execute(&[1.into(), "b".into()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecuteFailed);
    assert!(err.to_string().contains("UNIQUE"));
    Ok(())
}

#[test]
fn quote_last_id_and_rowcount() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_table("extras", true)?;
    assert_eq!(conn.quote("it's")?, "it''s");

    let mut stmt = conn.prepare("INSERT INTO scores (Name) VALUES (?)")?;
    stmt.execute(&["x".into()])?;
    stmt.execute(&["y".into()])?;
    assert_eq!(conn.last_id()?, 2);
    assert_eq!(stmt.rowcount().unwrap_err().kind(), ErrorKind::NotImplemented);

    assert!(conn.ping());
    assert_eq!(conn.driver_name(), "sqlite");
    Ok(())
}

#[test]
fn connect_from_json_options() -> Result<(), Box<dyn std::error::Error>> {
    let json = format!(
        r#"{{"driver": "sqlite", "db_path": "{}", "create": true}}"#,
        unique_db_path("json").replace('\\', "\\\\")
    );
    let options = ConnectOptions::from_json(&json)?;
    let conn = Connection::connect(&options)?;
    let mut stmt = conn.prepare("SELECT 1 + ? AS two")?;
    stmt.execute(&[1.into()])?;
    let row = stmt.fetch(true)?.expect("row");
    assert_eq!(row.get("two"), Some(&DbValue::Integer(2)));
    Ok(())
}

#[test]
fn returning_statements_report_changed_rows() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_table("returning", true)?;
    for id in 1..=3 {
        conn.run("INSERT INTO scores (id, Name) VALUES (?, 'a')", &[id.into()])?;
    }

    let mut update = conn.prepare("UPDATE scores SET Name = ? RETURNING id")?;
    update.execute(&["z".into()])?;
    assert_eq!(update.affected_rows()?, 3);
    assert_eq!(update.rows(false).count(), 3);

    // A plain read afterwards does not inherit the update's count.
    let mut select = conn.prepare("SELECT id FROM scores")?;
    select.execute(&[])?;
    assert_eq!(select.affected_rows()?, 0);
    Ok(())
}

#[test]
fn step_errors_surface_at_the_row_that_raises_them() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteOptionsBuilder::new(":memory:").create(true).build()?;
    let mut stmt = conn.prepare(
        "SELECT CASE WHEN x = 2 THEN abs(-9223372036854775808) ELSE x END AS v \
         FROM (SELECT 1 AS x UNION ALL SELECT 2)",
    )?;
    stmt.execute(&[])?;
    let row = stmt.fetch(true)?.expect("first row");
    assert_eq!(row.get("v"), Some(&DbValue::Integer(1)));
    let err = stmt.fetch(true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchFailed);
    assert!(err.to_string().contains("integer overflow"));

    // When the very first step fails there is no result at all.
    let mut first = conn.prepare("SELECT abs(-9223372036854775808)")?;
    assert_eq!(first.execute(&[]).unwrap_err().kind(), ErrorKind::ExecuteFailed);
    Ok(())
}
