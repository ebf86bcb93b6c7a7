//! Tests for row iteration and column decoding
//! Run with: cargo test --test row_sequence_test

use chrono::NaiveTime;
use sqlite_driver::{
    json_extract_expr, Connection, Error, Point, RowQuery, SequenceState, Value,
};

fn seeded(values: &[i64]) -> Connection {
    let mut conn = Connection::in_memory();
    conn.run("CREATE TABLE t (a INTEGER, b TEXT)", &[]).unwrap();
    for v in values {
        conn.run(
            "INSERT INTO t VALUES (%@, %@)",
            &[Value::Int64(*v), Value::String(format!("row{}", v))],
        )
        .unwrap();
    }
    conn
}

/// Bind `value` into a one-column table and read the stored bytes back
fn round_trip(value: Value) -> Option<Vec<u8>> {
    let mut conn = Connection::in_memory();
    conn.run("CREATE TABLE v (x)", &[]).unwrap();
    conn.run("INSERT INTO v VALUES (%@)", &[value]).unwrap();

    let query = RowQuery::new("SELECT x FROM v", vec![]);
    let mut result = conn.execute(&query).unwrap();
    let mut rows = result.rows();
    let row = rows.next().unwrap().unwrap();
    row.data("x").unwrap()
}

mod sequence_tests {
    use super::*;

    #[test]
    fn test_zero_rows() {
        let mut conn = seeded(&[]);
        let query = RowQuery::new("SELECT a, b FROM t", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();

        assert_eq!(rows.state(), SequenceState::FirstPending);
        assert!(rows.next().is_none());
        assert_eq!(rows.state(), SequenceState::Exhausted);
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
        assert_eq!(rows.state(), SequenceState::Exhausted);
    }

    #[test]
    fn test_n_rows_in_order() {
        let mut conn = seeded(&[10, 20, 30]);
        let query = RowQuery::new("SELECT a, b FROM t ORDER BY a", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();

        let mut seen = Vec::new();
        while let Some(row) = rows.next() {
            let row = row.unwrap();
            let a = row.get::<i64>("a").unwrap().unwrap();
            assert_eq!(row.data("b").unwrap(), Some(format!("row{}", a).into_bytes()));
            seen.push(a);
        }
        assert_eq!(seen, vec![10, 20, 30]);
        assert_eq!(rows.state(), SequenceState::Exhausted);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_state_after_first_row() {
        let mut conn = seeded(&[1, 2]);
        let query = RowQuery::new("SELECT a FROM t", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();
        assert!(rows.next().unwrap().is_ok());
        assert_eq!(rows.state(), SequenceState::Iterating);
    }

    #[test]
    fn test_sequence_is_not_restartable() {
        let mut conn = seeded(&[1, 2, 3]);
        let query = RowQuery::new("SELECT a FROM t ORDER BY a", vec![]);
        let mut result = conn.execute(&query).unwrap();

        {
            let mut rows = result.rows();
            let row = rows.next().unwrap().unwrap();
            assert_eq!(row.get::<i64>("a").unwrap(), Some(1));
        }

        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<i64>("a").unwrap(), Some(2));
    }

    #[test]
    fn test_iteration_error_ends_sequence() {
        let mut conn = seeded(&[5, i64::MIN, 7]);
        let query = RowQuery::new("SELECT abs(a) AS a FROM t ORDER BY rowid", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();

        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<i64>("a").unwrap(), Some(5));

        let err = match rows.next() {
            Some(Err(err)) => err,
            _ => panic!("expected an iteration error"),
        };
        assert!(matches!(err, Error::Iteration(_)));
        assert_eq!(err.message(), "Error getting next row");
        assert_eq!(err.more_information(), Some("integer overflow"));

        assert_eq!(rows.state(), SequenceState::Exhausted);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_decode_after_iteration_error() {
        let mut conn = seeded(&[5, i64::MIN]);
        let query = RowQuery::new("SELECT abs(a) AS a FROM t ORDER BY rowid", vec![]);
        let mut result = conn.execute(&query).unwrap();
        {
            let mut rows = result.rows();
            assert!(rows.next().unwrap().is_ok());
            assert!(matches!(rows.next(), Some(Err(Error::Iteration(_)))));
        }

        let err = result.cursor().decode("a").unwrap_err();
        assert!(matches!(err, Error::Iteration(_)));
        assert_eq!(err.message(), "Error getting next row");
        assert_eq!(err.more_information(), Some("integer overflow"));
        assert!(matches!(
            result.cursor().decode("missing"),
            Err(Error::Iteration(_))
        ));
    }

    #[test]
    fn test_try_for_each_stops_at_error() {
        let mut conn = seeded(&[1, i64::MIN]);
        let query = RowQuery::new("SELECT abs(a) AS a FROM t ORDER BY rowid", vec![]);
        let mut result = conn.execute(&query).unwrap();

        let mut total = 0;
        let outcome = result.rows().try_for_each(|row| {
            total += row.get::<i64>("a")?.unwrap_or(0);
            Ok(())
        });
        assert!(matches!(outcome, Err(Error::Iteration(_))));
        assert_eq!(total, 1);
    }

    #[test]
    fn test_abandoned_sequence_finalizes() {
        let mut conn = seeded(&[1, 2, 3]);
        {
            let query = RowQuery::new("SELECT a FROM t", vec![]);
            let mut result = conn.execute(&query).unwrap();
            let mut rows = result.rows();
            assert!(rows.next().is_some());
        }
        assert_eq!(conn.open_statement_count(), 0);
    }
}

mod decode_tests {
    use super::*;

    #[test]
    fn test_absent_column_is_none() {
        let mut conn = seeded(&[1]);
        let query = RowQuery::new("SELECT a FROM t", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();

        assert_eq!(row.data("missing").unwrap(), None);
        assert_eq!(row.get::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn test_columns_in_result_order() {
        let mut conn = seeded(&[1]);
        let query = RowQuery::new("SELECT b, a, a + 1 AS c FROM t", vec![]);
        let mut result = conn.execute(&query).unwrap();
        assert_eq!(result.column_names(), ["b", "a", "c"]);

        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.columns(), ["b", "a", "c"]);
    }

    #[test]
    fn test_null_and_empty_are_distinct() {
        assert_eq!(round_trip(Value::Null), None);
        assert_eq!(round_trip(Value::from("")), Some(Vec::new()));
        assert_eq!(round_trip(Value::Data(Vec::new())), Some(Vec::new()));
    }

    #[test]
    fn test_round_trip_text_and_blob() {
        assert_eq!(round_trip(Value::from("héllo")), Some("héllo".as_bytes().to_vec()));
        assert_eq!(
            round_trip(Value::Data(vec![0, 159, 255])),
            Some(vec![0, 159, 255])
        );
    }

    #[test]
    fn test_round_trip_numbers_as_text() {
        assert_eq!(round_trip(Value::Bool(true)), Some(b"1".to_vec()));
        assert_eq!(round_trip(Value::Bool(false)), Some(b"0".to_vec()));
        assert_eq!(round_trip(Value::Int8(-128)), Some(b"-128".to_vec()));
        assert_eq!(round_trip(Value::Int16(i16::MAX)), Some(b"32767".to_vec()));
        assert_eq!(round_trip(Value::Int32(i32::MIN)), Some(b"-2147483648".to_vec()));
        assert_eq!(round_trip(Value::UInt8(255)), Some(b"255".to_vec()));
        assert_eq!(round_trip(Value::UInt16(0)), Some(b"0".to_vec()));
        assert_eq!(round_trip(Value::UInt32(u32::MAX)), Some(b"4294967295".to_vec()));
        assert_eq!(
            round_trip(Value::UInt64(i64::MAX as u64)),
            Some(b"9223372036854775807".to_vec())
        );
        assert_eq!(round_trip(Value::Double(2.5)), Some(b"2.5".to_vec()));
        assert_eq!(round_trip(Value::Float(-0.5)), Some(b"-0.5".to_vec()));
    }

    #[test]
    fn test_i32_boundary_is_not_truncated() {
        let boundary = i64::from(i32::MAX) + 1;
        for value in [Value::Int(boundary), Value::Int64(boundary)] {
            assert_eq!(round_trip(value), Some(b"2147483648".to_vec()));
        }
    }

    #[test]
    fn test_round_trip_point_and_time() {
        let bytes = round_trip(Value::point(1.5, -2.0)).unwrap();
        assert_eq!(bytes, br#"{"x":1.5,"y":-2.0}"#.to_vec());

        let bytes = round_trip(Value::time(9, 30, 0).unwrap()).unwrap();
        assert_eq!(bytes, b"09:30:00".to_vec());
    }

    #[test]
    fn test_typed_get() {
        let mut conn = Connection::in_memory();
        conn.run("CREATE TABLE p (loc TEXT, at TEXT, ratio REAL)", &[])
            .unwrap();
        conn.run(
            "INSERT INTO p VALUES (%@, %@, %@)",
            &[
                Value::point(3.0, 4.0),
                Value::time(23, 1, 2).unwrap(),
                Value::Double(0.125),
            ],
        )
        .unwrap();

        let query = RowQuery::new(
            format!("SELECT loc, at, ratio, {} AS x FROM p", json_extract_expr("loc", "x")),
            vec![],
        );
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();

        assert_eq!(row.get::<Point>("loc").unwrap(), Some(Point::new(3.0, 4.0)));
        assert_eq!(
            row.get::<NaiveTime>("at").unwrap(),
            NaiveTime::from_hms_opt(23, 1, 2)
        );
        assert_eq!(row.get::<f64>("ratio").unwrap(), Some(0.125));
        assert_eq!(row.get::<f64>("x").unwrap(), Some(3.0));
    }

    #[test]
    fn test_typed_get_mismatch_is_decode_error() {
        let mut conn = seeded(&[1]);
        let query = RowQuery::new("SELECT b FROM t", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();

        let err = row.get::<i64>("b").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_row_to_json() {
        let mut conn = Connection::in_memory();
        conn.run("CREATE TABLE j (i INTEGER, r REAL, s TEXT, d BLOB, n)", &[])
            .unwrap();
        conn.run(
            "INSERT INTO j VALUES (%@, %@, %@, %@, %@)",
            &[
                Value::Int(42),
                Value::Double(1.5),
                Value::from("hi"),
                Value::Data(b"abc".to_vec()),
                Value::Null,
            ],
        )
        .unwrap();

        let query = RowQuery::new("SELECT * FROM j", vec![]);
        let mut result = conn.execute(&query).unwrap();
        let mut rows = result.rows();
        let row = rows.next().unwrap().unwrap();
        let json = serde_json::Value::Object(row.to_json().unwrap());

        assert_eq!(
            json,
            serde_json::json!({ "i": 42, "r": 1.5, "s": "hi", "d": "YWJj", "n": null })
        );
    }
}
