//! Drives the whole API once against a database and prints what happened.
//!
//! Usage: `walkthrough [PATH]` (defaults to an in-memory database).
//! Log verbosity follows `RUST_LOG`.

use sqlite_facade::{Database, Query, Result, Row, Transaction, MEMORY};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| MEMORY.to_string());
    let db = Database::open(&path)?;
    tracing::info!(path = %path, open = db.is_open(), "Database ready");
    println!("SQLite version: {}", db.version());
    println!("crate version:  {}", env!("CARGO_PKG_VERSION"));

    // the table does not exist yet, so this reports a non-zero status
    let mut drop_query = Query::new(&db, "DROP TABLE test;");
    println!("drop missing table: {}", drop_query.exec());

    let mut q = Query::new(&db, "replaced before it ever runs");
    let status = q.exec_sql(
        "CREATE TABLE test (id INTEGER PRIMARY KEY NOT NULL, num INTEGER, name VARCHAR(20), \
         flo FLOAT, data BLOB, comment TEXT);",
    );
    println!("create table: {}", status);

    let blob: Vec<u8> = (0..30).collect();
    q.bind(1, &blob);
    let status = q.exec_sql("INSERT INTO test (data) VALUES (?1)");
    println!("insert blob via bind: {}, id: {}", status, q.insert_id());

    q.append("INSERT INTO test (data) VALUES (?)").append(&blob);
    let status = q.exec();
    println!("insert blob via append: {}, id: {}", status, q.insert_id());

    q.append("INSERT INTO test (comment) VALUES (@com)");
    q.bind("@com", "Test");
    let status = q.exec();
    println!("insert text via named bind: {}, id: {}", status, q.insert_id());

    q.append("INSERT INTO test(name, data, comment) VALUES ('Test',?,?)");
    q.bind(1, vec![0x55u8; 10]).bind(2, "A test text");
    let status = q.exec();
    println!("insert multiple binds: {}, id: {}", status, q.insert_id());

    q.append("INSERT INTO test (num, flo) VALUES(")
        .append(1000)
        .append(",")
        .append(3.1415f32)
        .append(")");
    let status = q.exec();
    println!("insert rendered values: {}, id: {}", status, q.insert_id());

    q.append("INSERT INTO test(id, name) VALUES (13,'Schöne Grüße')");
    let status = q.exec();
    println!(
        "insert utf-8: {}, id: {}, affected rows: {}",
        status,
        q.insert_id(),
        q.affected_rows()
    );

    q.append("UPDATE test SET num=");
    q.append(10);
    q.append(" WHERE id=2");
    let status = q.exec();
    println!("update: {}, affected rows: {}", status, q.affected_rows());

    match db.vacuum() {
        Ok(()) => println!("vacuum: ok"),
        Err(err) => println!("vacuum: {}", err),
    }

    q.append("SELECT * FROM test");
    let res = q.store()?;
    println!("result: got {} rows", res.num_rows());

    let num: i64 = res.row(1)?.get("num")?;
    let flo: f64 = res.row(4)?.get("flo")?;
    let num_is_null = res.row(0)?.is_null("num")?;
    let data: Vec<u8> = res.row(0)?.get(4)?;
    let comment: String = res.row(2)?.get("comment")?;
    println!(
        "fields: num={} flo={} row 0 num is null={} blob={} bytes comment={}",
        num,
        flo,
        num_is_null,
        data.len(),
        comment
    );

    for row in &res {
        print_row(row);
    }

    q.append("SELECT * FROM test");
    let mut stream = q.stream()?;
    let mut row = stream.use_next()?;
    while !row.is_empty() {
        print_row(&row);
        row = stream.use_next()?;
    }
    drop(stream);

    // first row only, then release the statement
    q.append("SELECT * FROM test");
    let mut stream = q.stream()?;
    let first = stream.use_next()?;
    println!("first row has {} fields, abort: {}", first.num_fields(), stream.abort());

    let mut tr = Transaction::new(&db)?;
    println!("insert in transaction: {}", q.exec_sql("INSERT INTO test(name) VALUES ('Marco')"));
    tr.commit()?;

    tr.begin()?;
    println!("insert then roll back: {}", q.exec_sql("INSERT INTO test(name) VALUES ('not stored')"));
    tr.rollback()?;

    {
        let _scoped = Transaction::new(&db)?;
        println!("insert in scope: {}", q.exec_sql("INSERT INTO test(name) VALUES ('not stored either')"));
        // rolled back when `_scoped` leaves this block
    }

    q.append("SELECT COUNT(*) AS n FROM test WHERE name IS NOT NULL AND name <> 'Test'");
    let names: i64 = q.store()?.row(0)?.get("n")?;
    println!("named rows kept: {}", names);
    Ok(())
}

fn print_row(row: &Row) {
    let line: Vec<String> = row
        .fields()
        .iter()
        .filter(|field| !field.is_null())
        .map(|field| field.to_string())
        .collect();
    println!("{} |", line.join(" |"));
}
