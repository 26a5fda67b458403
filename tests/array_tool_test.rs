use serde_json::{json, Map, Value};

use webframe::{
    array_tool::{ArrayKey, ArrayTool},
    exception::Exception,
};

fn records() -> Vec<Value> {
    vec![json!({"id": 1, "n": "a"}), json!({"id": 2, "n": "b"})]
}

#[test]
fn test_index_by() {
    let indexed = ArrayTool::index_by("id", &records(), false).unwrap();
    assert_eq!(indexed.keys().collect::<Vec<_>>(), vec!["1", "2"]);
    assert_eq!(indexed["1"], json!({"id": 1, "n": "a"}));
    assert_eq!(indexed["2"], json!({"id": 2, "n": "b"}));
}

#[test]
fn test_index_by_remove_value() {
    let indexed = ArrayTool::index_by("id", &records(), true).unwrap();
    assert_eq!(indexed["1"], json!({"n": "a"}));
    assert_eq!(indexed["2"], json!({"n": "b"}));
}

#[test]
fn test_index_by_list_rows() {
    let rows = vec![json!(["x", "first"]), json!(["y", "second"])];
    let indexed = ArrayTool::index_by(0usize, &rows, true).unwrap();
    assert_eq!(indexed["x"], json!(["first"]));
    assert_eq!(indexed["y"], json!(["second"]));
}

#[test]
fn test_index_by_later_duplicate_overwrites() {
    let rows = vec![json!({"k": "a", "v": 1}), json!({"k": "a", "v": 2})];
    let indexed = ArrayTool::index_by("k", &rows, false).unwrap();
    assert_eq!(indexed.len(), 1);
    assert_eq!(indexed["a"]["v"], json!(2));
}

#[test]
fn test_index_by_errors() {
    let missing = vec![json!({"id": 1}), json!({"n": "b"})];
    assert_eq!(
        ArrayTool::index_by("id", &missing, false),
        Err(Exception::IndexNotInArray)
    );
    let scalar = vec![json!({"id": 1}), json!(5)];
    assert_eq!(
        ArrayTool::index_by("id", &scalar, false),
        Err(Exception::ScalarVariable)
    );
    let nested = vec![json!({"id": [1, 2]})];
    assert_eq!(
        ArrayTool::index_by("id", &nested, false),
        Err(Exception::IllegalOffset)
    );
}

#[test]
fn test_map() {
    let mapped = ArrayTool::map(&records(), "n", "id").unwrap();
    let mut expected = Map::new();
    expected.insert("a".to_string(), json!(1));
    expected.insert("b".to_string(), json!(2));
    assert_eq!(mapped, expected);
}

#[test]
fn test_map_bool_key() {
    let rows = vec![json!({"flag": true, "v": "yes"}), json!({"flag": false, "v": "no"})];
    let mapped = ArrayTool::map(&rows, "flag", "v").unwrap();
    assert_eq!(mapped["1"], json!("yes"));
    assert_eq!(mapped["0"], json!("no"));
}

#[test]
fn test_map_missing_value_key() {
    assert_eq!(
        ArrayTool::map(&records(), "id", "missing"),
        Err(Exception::IndexNotInArray)
    );
}

#[test]
fn test_column() {
    assert_eq!(
        ArrayTool::column(&records(), "n").unwrap(),
        vec![json!("a"), json!("b")]
    );
    assert_eq!(
        ArrayTool::column(&[json!("scalar")], ArrayKey::Index(0)),
        Err(Exception::ScalarVariable)
    );
    assert_eq!(
        ArrayTool::column(&[json!({"n": null})], "n"),
        Err(Exception::IndexNotInArray)
    );
}

#[test]
fn test_add_skips_non_numeric() {
    let values = vec![json!(1), json!(2), json!(true), json!("x"), json!(3)];
    assert_eq!(ArrayTool::add(&values), 6.0);
    assert_eq!(ArrayTool::add(&[json!("1.5"), json!(" 2 "), json!(null)]), 3.5);
}

#[test]
fn test_average() {
    assert_eq!(ArrayTool::average(&[]), 0.0);
    assert_eq!(ArrayTool::average(&[json!(false), json!("nope")]), 0.0);
    assert_eq!(ArrayTool::average(&[json!(2), json!("4"), json!(true)]), 3.0);
}

#[test]
fn test_max_min() {
    let values = vec![json!(3), json!("-7"), json!(10.5), json!(true), json!("abc")];
    assert_eq!(ArrayTool::max(&values), Ok(10.5));
    assert_eq!(ArrayTool::min(&values), Ok(-7.0));
    assert_eq!(ArrayTool::max(&[json!(true), json!("x")]), Err(Exception::EmptyInput));
    assert_eq!(ArrayTool::min(&[]), Err(Exception::EmptyInput));
}

#[test]
fn test_remove() {
    let mut record = match json!({"id": 1, "n": "a"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    assert_eq!(ArrayTool::remove("id", &mut record), Ok(json!(1)));
    assert_eq!(Value::Object(record.clone()), json!({"n": "a"}));
    assert_eq!(
        ArrayTool::remove("id", &mut record),
        Err(Exception::IndexNotInArray)
    );
}

#[test]
fn test_remove_keeps_order() {
    let mut record = match json!({"a": 1, "b": 2, "c": 3}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    ArrayTool::remove("a", &mut record).unwrap();
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "c"]);
}

#[test]
fn test_remove_null_is_missing() {
    let mut record = Map::new();
    record.insert("gone".to_string(), Value::Null);
    assert_eq!(
        ArrayTool::remove("gone", &mut record),
        Err(Exception::IndexNotInArray)
    );
    assert!(record.contains_key("gone"));
}
