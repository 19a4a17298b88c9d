//! Tests for result sets, rows, fields and streaming
//! Run with: cargo test --test result_test

use serde_json::json;
use sqlite_facade::{Database, Error, Field, Result, Row, SqliteType};

fn setup() -> Result<Database> {
    let db = Database::memory()?;
    db.execute_batch(
        "CREATE TABLE test (id INTEGER PRIMARY KEY NOT NULL, num INTEGER, name TEXT, flo FLOAT, data BLOB);
         INSERT INTO test (num, name, flo, data) VALUES (0, 'zero', 0.5, x'0102');
         INSERT INTO test (num, name, flo, data) VALUES (NULL, 'null', NULL, NULL);
         INSERT INTO test (num, name, flo, data) VALUES (2, 'two', 2.0, x'');",
    )?;
    Ok(db)
}

mod store_tests {
    use super::*;

    #[test]
    fn test_store_shape() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT id, num, name, flo, data FROM test ORDER BY id").store()?;
        assert_eq!(res.num_rows(), 3);
        assert_eq!(res.num_fields(), 5);
        assert_eq!(res.columns(), ["id", "num", "name", "flo", "data"]);
        assert!(!res.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_result_keeps_columns() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT id, name FROM test WHERE id < 0").store()?;
        assert!(res.is_empty());
        assert_eq!(res.num_rows(), 0);
        assert_eq!(res.num_fields(), 2);
        assert!(matches!(res.row(0), Err(Error::Index { index: 0, len: 0 })));
        Ok(())
    }

    #[test]
    fn test_is_null_distinguishes_zero() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT num FROM test ORDER BY id").store()?;
        assert!(!res.row(0)?.is_null("num")?);
        assert_eq!(res.row(0)?.get::<i64, _>("num")?, 0);
        assert!(res.row(1)?.is_null("num")?);
        assert!(res.row(1)?.get::<i64, _>("num").is_err());
        assert_eq!(res.row(1)?.get::<Option<i64>, _>("num")?, None);
        Ok(())
    }

    #[test]
    fn test_field_kinds() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT id, name, flo, data, num FROM test WHERE id = 1").store()?;
        let row = res.row(0)?;
        assert_eq!(row.field("id")?.kind(), SqliteType::Integer);
        assert_eq!(row.field("name")?.kind(), SqliteType::Text);
        assert_eq!(row.field("flo")?.kind(), SqliteType::Real);
        assert_eq!(row.field("data")?.kind(), SqliteType::Blob);
        assert_eq!(row.field(4)?, &Field::Integer(0));
        Ok(())
    }

    #[test]
    fn test_column_lookup_is_case_insensitive_fallback() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT name AS Label FROM test WHERE id = 1").store()?;
        let row = res.row(0)?;
        assert_eq!(row.get::<String, _>("Label")?, "zero");
        assert_eq!(row.get::<String, _>("label")?, "zero");
        Ok(())
    }

    #[test]
    fn test_lookup_and_index_errors() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT id, name FROM test").store()?;
        let row = res.row(0)?;

        match row.field("missing") {
            Err(Error::Lookup(name)) => assert_eq!(name, "missing"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(row.field(2), Err(Error::Index { index: 2, len: 2 })));
        assert!(matches!(res.row(3), Err(Error::Index { index: 3, len: 3 })));
        Ok(())
    }

    #[test]
    fn test_type_mismatch() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT name, data FROM test WHERE id = 1").store()?;
        let row = res.row(0)?;
        assert!(matches!(
            row.get::<i64, _>("name"),
            Err(Error::TypeMismatch { found: SqliteType::Text, .. })
        ));
        assert!(matches!(
            row.get::<f64, _>("data"),
            Err(Error::TypeMismatch { found: SqliteType::Blob, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_text_is_not_rewritten() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT CAST(x'ff41' AS TEXT) AS raw").store()?;
        let row = res.row(0)?;
        assert!(matches!(row.get::<String, _>("raw"), Err(Error::TypeMismatch { .. })));
        assert_eq!(row.get::<Vec<u8>, _>("raw")?, vec![0xff, 0x41]);
        Ok(())
    }

    #[test]
    fn test_iteration_and_json() -> Result<()> {
        let db = setup()?;
        let res = db.query("SELECT id, name, data FROM test ORDER BY id").store()?;

        let names: Vec<String> = res
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect::<Result<_>>()?;
        assert_eq!(names, ["zero", "null", "two"]);

        let json = res.to_json();
        assert_eq!(json[0], json!({"id": 1, "name": "zero", "data": "AQI="}));
        assert_eq!(json[1]["data"], serde_json::Value::Null);
        assert_eq!(res.row(2)?.to_json_array(), json!([3, "two", ""]));
        Ok(())
    }
}

mod stream_tests {
    use super::*;

    fn collect_stream(db: &Database, sql: &str) -> Result<Vec<Row>> {
        let mut q = db.query(sql);
        let mut stream = q.stream()?;
        let mut rows = Vec::new();
        let mut row = stream.use_next()?;
        while !row.is_empty() {
            rows.push(row);
            row = stream.use_next()?;
        }
        assert!(stream.is_exhausted());
        Ok(rows)
    }

    #[test]
    fn test_stream_matches_store() -> Result<()> {
        let db = setup()?;
        let sql = "SELECT * FROM test ORDER BY id";
        let streamed = collect_stream(&db, sql)?;
        let stored = db.query(sql).store()?.into_rows();
        assert_eq!(streamed, stored);
        Ok(())
    }

    #[test]
    fn test_use_next_after_end_stays_empty() -> Result<()> {
        let db = setup()?;
        let mut q = db.query("SELECT id FROM test WHERE id = 1");
        let mut stream = q.stream()?;
        assert_eq!(stream.use_next()?.get::<i64, _>(0)?, 1);
        assert!(stream.use_next()?.is_empty());
        assert!(stream.use_next()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_stream_iterator() -> Result<()> {
        let db = setup()?;
        let mut q = db.query("SELECT num FROM test WHERE num IS NOT NULL ORDER BY id");
        let nums: Vec<i64> = q
            .stream()?
            .map(|row| row.and_then(|row| row.get(0)))
            .collect::<Result<_>>()?;
        assert_eq!(nums, [0, 2]);
        Ok(())
    }

    #[test]
    fn test_abort_releases_query() -> Result<()> {
        let db = setup()?;
        let mut q = db.query("SELECT * FROM test");
        let mut stream = q.stream()?;
        let first = stream.use_next()?;
        assert_eq!(first.num_fields(), 5);
        assert!(stream.abort().is_ok());

        // the query and the connection are usable again
        let status = q.exec_sql("INSERT INTO test (name) VALUES ('after abort')");
        assert!(status.is_ok());
        db.vacuum()?;
        let count: i64 = db.query("SELECT COUNT(*) FROM test").store()?.row(0)?.get(0)?;
        assert_eq!(count, 4);
        Ok(())
    }

    #[test]
    fn test_stream_with_bound_params() -> Result<()> {
        let db = setup()?;
        let mut q = db.query("SELECT name FROM test WHERE num = :num");
        q.bind(":num", 2);
        let rows: Vec<Row> = q.stream()?.collect::<Result<_>>()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<String, _>("name")?, "two");
        assert_eq!(q.param_count(), 0);
        Ok(())
    }

    #[test]
    fn test_stream_bad_sql_is_execution_error() -> Result<()> {
        let db = setup()?;
        let mut q = db.query("SELECT FROM");
        assert!(matches!(q.stream(), Err(Error::Execution { .. })));
        Ok(())
    }
}
