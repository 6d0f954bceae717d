use sql_dbd::prelude::*;
use sql_dbd::test_utils::{DriverCall, ScriptedDriver};

fn writer() -> ScriptedDriver {
    ScriptedDriver::new().params(1).affected(1)
}

#[test]
fn first_execute_opens_the_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer();
    let log = driver.log();
    let mut conn = driver.connect(false);
    let mut stmt = conn.prepare("insert into t values (?)")?;

    assert!(!conn.in_transaction());
    stmt.execute(&[1.into()])?;
    stmt.execute(&[2.into()])?;
    assert!(conn.in_transaction());
    assert_eq!(log.count(&DriverCall::Begin), 1);

    // BEGIN happens after the checks and before the first bind.
    let calls = log.calls();
    let begin = calls.iter().position(|c| *c == DriverCall::Begin);
    let first_bind = calls
        .iter()
        .position(|c| matches!(c, DriverCall::Bind { .. }));
    assert!(begin < first_bind);

    assert!(conn.commit()?);
    assert!(!conn.in_transaction());
    assert_eq!(log.count(&DriverCall::Commit), 1);

    stmt.execute(&[3.into()])?;
    assert_eq!(log.count(&DriverCall::Begin), 2);
    Ok(())
}

#[test]
fn enabling_autocommit_commits_exactly_once() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer();
    let log = driver.log();
    let mut conn = driver.connect(false);
    let mut stmt = conn.prepare("insert into t values (?)")?;
    stmt.execute(&[1.into()])?;

    conn.autocommit(true)?;
    assert!(conn.is_autocommit());
    assert!(!conn.in_transaction());
    assert_eq!(log.count(&DriverCall::Commit), 1);
    assert_eq!(log.count(&DriverCall::Rollback), 0);

    conn.autocommit(true)?;
    stmt.execute(&[2.into()])?;
    assert_eq!(log.count(&DriverCall::Commit), 1);
    assert_eq!(log.count(&DriverCall::Begin), 1);
    Ok(())
}

#[test]
fn unchanged_autocommit_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer();
    let log = driver.log();
    let mut conn = driver.connect(true);
    conn.autocommit(true)?;
    assert!(log.calls().is_empty());

    conn.autocommit(false)?;
    assert!(!conn.is_autocommit());
    assert!(log.calls().is_empty());
    Ok(())
}

#[test]
fn commit_without_a_transaction_skips_the_backend() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer();
    let log = driver.log();
    let mut conn = driver.connect(false);
    assert!(conn.commit()?);
    assert!(conn.rollback()?);
    assert!(log.calls().is_empty());
    Ok(())
}

#[test]
fn backends_without_transactions_report_false() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer().without_transactions();
    let log = driver.log();
    let mut conn = driver.connect(false);
    let mut stmt = conn.prepare("insert into t values (?)")?;
    stmt.execute(&[1.into()])?;

    assert!(!conn.commit()?);
    assert!(!conn.rollback()?);
    assert_eq!(log.count(&DriverCall::Begin), 0);
    Ok(())
}

#[test]
fn failed_commit_keeps_the_transaction_open() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer().fail_commit("could not serialize access");
    let log = driver.log();
    let mut conn = driver.connect(false);
    conn.run("insert into t values (?)", &[1.into()])?;

    let err = conn.commit().unwrap_err();
    assert!(err.to_string().contains("could not serialize access"));
    assert!(conn.in_transaction());

    assert!(conn.rollback()?);
    assert!(!conn.in_transaction());
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    Ok(())
}

#[test]
fn close_rolls_back_and_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer();
    let log = driver.log();
    let mut conn = driver.connect(false);
    conn.run("insert into t values (?)", &[1.into()])?;

    conn.close();
    conn.close();
    assert!(conn.is_closed());
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    assert_eq!(log.count(&DriverCall::Commit), 0);
    assert_eq!(log.count(&DriverCall::CloseConnection), 1);

    drop(conn);
    assert_eq!(log.count(&DriverCall::CloseConnection), 1);
    Ok(())
}

#[test]
fn drop_closes_the_connection() {
    let driver = writer();
    let log = driver.log();
    {
        let _conn = driver.connect(true);
    }
    assert_eq!(log.calls(), vec![DriverCall::CloseConnection]);
}

#[test]
fn closed_connection_behaviour() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = writer().connect(true);
    assert!(conn.ping());
    assert_eq!(conn.to_string(), "scripted connection: open");
    conn.close();

    assert!(!conn.ping());
    assert_eq!(conn.prepare("select 1").unwrap_err().kind(), ErrorKind::DbUnavailable);
    assert_eq!(conn.autocommit(false).unwrap_err().kind(), ErrorKind::DbUnavailable);
    assert_eq!(conn.quote("x").unwrap_err().kind(), ErrorKind::DbUnavailable);
    assert!(!conn.commit()?);
    assert!(!conn.rollback()?);
    assert_eq!(conn.to_string(), "scripted connection: closed");
    Ok(())
}

#[test]
fn capability_gaps_are_not_implemented() -> Result<(), Box<dyn std::error::Error>> {
    let conn = writer().connect(true);
    let err = conn.quote("it's").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    assert_eq!(conn.last_id().unwrap_err().kind(), ErrorKind::NotImplemented);

    let mut stmt = conn.prepare("insert into t values (?)")?;
    stmt.execute(&[1.into()])?;
    assert_eq!(stmt.rowcount().unwrap_err().kind(), ErrorKind::NotImplemented);
    Ok(())
}

#[test]
fn run_reports_affected_rows_and_closes() -> Result<(), Box<dyn std::error::Error>> {
    let driver = writer().affected(3);
    let log = driver.log();
    let conn = driver.connect(true);
    assert_eq!(conn.run("update t set a = ?", &[1.into()])?, 3);
    assert_eq!(log.count(&DriverCall::CloseStatement), 1);
    Ok(())
}

#[test]
fn prepare_failure_is_reported() {
    let conn = ScriptedDriver::new().fail_prepare("syntax error at or near \"selec\"").connect(true);
    let err = conn.prepare("selec 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrepareFailed);
    assert!(err.to_string().contains("syntax error"));
}
