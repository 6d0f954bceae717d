use std::borrow::Cow;

use sql_dbd::prelude::*;
use sql_dbd::test_utils::{DriverCall, ScriptedDriver};
use sql_dbd::translation::{MAX_PLACEHOLDERS, translate};

#[test]
fn dollar_backends_receive_numbered_markers() -> Result<(), Box<dyn std::error::Error>> {
    let driver = ScriptedDriver::new()
        .placeholders(PlaceholderStyle::Dollar)
        .params(2);
    let log = driver.log();
    let conn = driver.connect(true);

    let stmt = conn.prepare("SELECT * FROM t WHERE a=? AND b='c?d' AND e=?")?;
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a=$1 AND b='c?d' AND e=$2");
    assert_eq!(
        log.calls().first(),
        Some(&DriverCall::Prepare(
            "SELECT * FROM t WHERE a=$1 AND b='c?d' AND e=$2".to_string()
        ))
    );
    Ok(())
}

#[test]
fn colon_style_and_positional_style() -> Result<(), Box<dyn std::error::Error>> {
    let oracle_like = translate_placeholders("update t set a = ? where b = ?", PlaceholderStyle::Colon)?;
    assert_eq!(oracle_like, "update t set a = :1 where b = :2");

    let sqlite_like =
        translate_placeholders("update t set a = ? where b = ?", PlaceholderStyle::Positional)?;
    assert!(matches!(sqlite_like, Cow::Borrowed(_)));
    Ok(())
}

#[test]
fn each_prepare_numbers_from_one() -> Result<(), Box<dyn std::error::Error>> {
    let conn = ScriptedDriver::new()
        .placeholders(PlaceholderStyle::Dollar)
        .params(1)
        .connect(true);
    let first = conn.prepare("select 1 where x = ?")?;
    let second = conn.prepare("select 1 where x = ?")?;
    assert_eq!(first.sql(), "select 1 where x = $1");
    assert_eq!(first.sql(), second.sql());
    Ok(())
}

#[test]
fn too_many_placeholders_fail_prepare_before_the_backend() {
    let driver = ScriptedDriver::new().placeholders(PlaceholderStyle::Dollar);
    let log = driver.log();
    let conn = driver.connect(true);

    let mut sql = String::from("select 1");
    for _ in 0..=MAX_PLACEHOLDERS {
        sql.push_str(", ?");
    }
    let err = conn.prepare(&sql).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrepareFailed);
    assert!(log.calls().is_empty());
}

#[test]
fn leading_marker_is_copied_verbatim() {
    assert_eq!(translate("?", '$').unwrap(), "?");
    assert_eq!(translate("select ?", '$').unwrap(), "select $1");
}

#[test]
fn escaped_quotes_do_not_end_literals() {
    let out = translate(r"insert into t values ('it\'s ?', ?)", '$').unwrap();
    assert_eq!(out, r"insert into t values ('it\'s ?', $1)");
}
