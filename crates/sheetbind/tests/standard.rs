use serde::Deserialize;
use sheetbind::backends::MemoryWorkbook;
use sheetbind::{
    BytesCell, Connector, DecodeFromBytes, FieldMapCache, NamedSheet, ReaderState, SheetError,
    SheetNamer, SheetReader, SheetRecord, decode_all,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default, PartialEq, Deserialize, BytesCell)]
struct Temp {
    #[serde(rename = "Foo")]
    foo: String,
}

impl DecodeFromBytes for Temp {
    type Error = serde_json::Error;

    fn decode_from_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, SheetRecord)]
struct Standard {
    #[sheet("ID")]
    id: u64,
    #[sheet("column(NameOf)")]
    name: String,
    #[sheet("NameOf")]
    name_ptr: Option<String>,
    #[sheet("AgeOf")]
    age: i32,
    #[sheet("Slice;split(|)")]
    slice: Vec<i32>,
    #[sheet("UnmarshalAttr")]
    temp: Option<Temp>,
    #[sheet("-")]
    without: String,
}

const HEADER: [&str; 7] = ["ID", "NameOf", "AgeOf", "Slice", "UnmarshalAttr", "without", "Note"];

fn standard_rows() -> Vec<Vec<&'static str>> {
    vec![
        HEADER.to_vec(),
        vec!["1", "Andy", "1", "1|2", "{\"Foo\":\"Andy\"}", "x", "first"],
        vec!["2", "Leo", "2", "2|3|4", "{\"Foo\":\"Leo\"}", "y", "second"],
        vec!["3", "Ben", "3", "3|4|5|6", "", "", ""],
        vec!["4", "Ming", "4", "1", "{\"Foo\":\"Ming\"}"],
    ]
}

fn connector() -> Connector {
    let mut connector = Connector::new().with_cache(Arc::new(FieldMapCache::new()));
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", standard_rows()));
    connector
}

fn andy() -> Standard {
    Standard {
        id: 1,
        name: "Andy".into(),
        name_ptr: Some("Andy".into()),
        age: 1,
        slice: vec![1, 2],
        temp: Some(Temp { foo: "Andy".into() }),
        without: String::new(),
    }
}

#[test]
fn reads_standard_sheet() {
    let mut connector = connector();
    let mut reader = connector.new_reader_for::<Standard>().unwrap();
    assert_eq!(reader.sheet_name(), "Standard");

    let mut rows: Vec<Standard> = Vec::new();
    reader.read_all(&mut rows).unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], andy());
    assert_eq!(rows[2].slice, vec![3, 4, 5, 6]);
    assert_eq!(rows[2].temp, None);
    assert_eq!(rows[3].slice, vec![1]);
    assert!(rows.iter().all(|r| r.without.is_empty()));
}

#[test]
fn single_row_protocol() {
    let mut connector = connector();
    let mut reader = connector.new_reader("Standard").unwrap();

    assert!(matches!(
        reader.read::<Standard>(),
        Err(SheetError::NotPositioned { .. })
    ));
    assert!(reader.next());
    assert_eq!(reader.read::<Standard>().unwrap(), andy());

    while reader.next() {}
    assert_eq!(reader.state(), ReaderState::Exhausted);
    assert!(matches!(
        reader.read::<Standard>(),
        Err(SheetError::NotPositioned { .. })
    ));
    reader.close();
    reader.close();
}

#[test]
fn boxed_records_match_plain_records() {
    let mut book = MemoryWorkbook::new().with_sheet("Standard", standard_rows());
    let mut plain: Vec<Standard> = Vec::new();
    let mut boxed: Vec<Box<Standard>> = Vec::new();
    decode_all(&mut book, &mut plain).unwrap();
    decode_all(&mut book, &mut boxed).unwrap();

    assert_eq!(plain.len(), boxed.len());
    for (p, b) in plain.iter().zip(&boxed) {
        assert_eq!(p, b.as_ref());
    }
}

#[test]
fn map_rows_hold_raw_text_for_every_column() {
    let mut connector = connector();
    let mut reader = connector.new_reader("Standard").unwrap();

    let mut maps: Vec<HashMap<String, String>> = Vec::new();
    reader.read_all(&mut maps).unwrap();
    assert_eq!(maps.len(), 4);
    assert_eq!(maps[0].len(), HEADER.len());
    assert_eq!(maps[0]["Slice"], "1|2");
    assert_eq!(maps[0]["without"], "x");
    assert_eq!(maps[3]["Note"], "");

    let mut pairs: Vec<Vec<(String, String)>> = Vec::new();
    reader.read_all(&mut pairs).unwrap();
    let names: Vec<&str> = pairs[0].iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, HEADER.to_vec());
}

#[test]
fn independent_readers_agree() {
    let mut connector = connector();
    let mut first: Vec<Standard> = Vec::new();
    let mut second: Vec<Standard> = Vec::new();
    connector
        .new_reader("Standard")
        .unwrap()
        .read_all(&mut first)
        .unwrap();
    connector
        .new_reader("Standard")
        .unwrap()
        .read_all(&mut second)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_column_leaves_default() {
    let rows = vec![
        vec!["ID", "NameOf", "AgeOf"],
        vec!["7", "Kim", "30"],
    ];
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", rows));

    let mut out: Vec<Standard> = Vec::new();
    connector
        .new_reader_for::<Standard>()
        .unwrap()
        .read_all(&mut out)
        .unwrap();
    assert_eq!(out[0].id, 7);
    assert!(out[0].slice.is_empty());
    assert_eq!(out[0].temp, None);
}

#[test]
fn bad_integer_names_column_and_row() {
    let rows = vec![
        vec!["ID", "AgeOf"],
        vec!["1", "10"],
        vec!["2", "abc"],
        vec!["3", "12"],
    ];
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", rows));

    let mut out: Vec<Standard> = Vec::new();
    let err = connector
        .new_reader_for::<Standard>()
        .unwrap()
        .read_all(&mut out)
        .unwrap_err();

    match err {
        SheetError::CellConversion(cell) => {
            assert_eq!(cell.column, "AgeOf");
            assert_eq!(cell.row, 2);
            assert_eq!(cell.raw, "abc");
            assert_eq!(cell.target_type, "i32");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(out.len(), 1);
}

#[test]
fn bad_json_payload_is_a_conversion_error() {
    let rows = vec![vec!["ID", "UnmarshalAttr"], vec!["1", "{not json"]];
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", rows));

    let mut reader = connector.new_reader_for::<Standard>().unwrap();
    assert!(reader.next());
    let err = reader.read::<Standard>().unwrap_err();
    let cell = err.cell().expect("conversion error");
    assert_eq!(cell.column, "UnmarshalAttr");
    assert!(matches!(cell.cause, sheetbind::CellFailure::Decode(_)));
}

#[test]
fn bad_segment_is_reported() {
    let rows = vec![vec!["Slice"], vec!["1|x|3"]];
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", rows));

    let mut out: Vec<Standard> = Vec::new();
    let err = connector
        .new_reader_for::<Standard>()
        .unwrap()
        .read_all(&mut out)
        .unwrap_err();
    match err.cell().map(|cell| &cell.cause) {
        Some(sheetbind::CellFailure::Segment { index, segment, .. }) => {
            assert_eq!(*index, 1);
            assert_eq!(segment, "x");
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

/* ───────────────────────────── sheet naming ───────────────────────────── */

#[derive(Debug, Default, PartialEq, SheetRecord)]
#[sheet(name = "People 2024")]
struct Person {
    #[sheet("ID")]
    id: u32,
    #[sheet("NameOf")]
    name: String,
}

struct Archive {
    year: u16,
}

impl NamedSheet for Archive {
    fn sheet_name(&self) -> String {
        format!("People {}", self.year)
    }
}

fn people_book() -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet("Person", vec![vec!["ID"], vec!["0"]])
        .with_sheet("People 2024", vec![vec!["ID", "NameOf"], vec!["1", "Andy"]])
        .with_sheet("People 2023", vec![vec!["ID", "NameOf"], vec!["9", "Old"]])
}

#[test]
fn declared_sheet_name_beats_type_name() {
    let mut connector = Connector::new();
    connector.attach(people_book());

    let mut out: Vec<Person> = Vec::new();
    connector
        .new_reader_for::<Person>()
        .unwrap()
        .read_all(&mut out)
        .unwrap();
    assert_eq!(out, vec![Person { id: 1, name: "Andy".into() }]);
}

#[test]
fn capability_and_literal_namers() {
    let mut connector = Connector::new();
    connector.attach(people_book());

    let mut old: Vec<Person> = Vec::new();
    connector
        .new_reader(SheetNamer::from_value(Archive { year: 2023 }))
        .unwrap()
        .read_all(&mut old)
        .unwrap();
    assert_eq!(old[0].name, "Old");

    let mut by_type: Vec<BTreeMap<String, String>> = Vec::new();
    connector
        .new_reader("Person")
        .unwrap()
        .read_all(&mut by_type)
        .unwrap();
    assert_eq!(by_type[0]["ID"], "0");
}

#[test]
fn missing_sheet() {
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Other", vec![vec!["ID"]]));
    match connector.new_reader_for::<Standard>().unwrap_err() {
        SheetError::MissingSheet { sheet, available } => {
            assert_eq!(sheet, "Standard");
            assert_eq!(available, vec!["Other"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/* ───────────────────────── directives and shapes ───────────────────────── */

#[derive(Debug, Default, PartialEq, SheetRecord)]
struct Audit {
    #[sheet("CreatedBy")]
    created_by: String,
    #[sheet("Revision;default(1)")]
    revision: u32,
}

#[derive(Debug, Default, PartialEq, SheetRecord)]
#[sheet(name = "Orders")]
struct Order {
    #[sheet("OrderId")]
    id: u64,
    #[sheet("Tags;split(,);nil(n/a)")]
    tags: Vec<String>,
    #[sheet("Paid")]
    paid: bool,
    #[sheet("Shipped")]
    shipped: Option<chrono::NaiveDate>,
    #[sheet(flatten)]
    audit: Audit,
    #[sheet(ignore)]
    scratch: std::collections::HashSet<u32>,
    #[cfg(feature = "json")]
    #[sheet("Meta")]
    meta: Option<sheetbind::Json<BTreeMap<String, u32>>>,
}

#[test]
fn directives_shapes_and_flatten() {
    let rows = vec![
        vec!["OrderId", "Tags", "Paid", "Shipped", "CreatedBy", "Revision", "Meta"],
        vec!["10", "a,b", "TRUE", "2024-01-15", "ops", "3", "{\"qty\":2}"],
        vec!["11", "n/a", "0", "", "ops", "", ""],
    ];
    let mut connector = Connector::new();
    connector.attach(MemoryWorkbook::new().with_sheet("Orders", rows));

    let mut out: Vec<Order> = Vec::new();
    connector
        .new_reader_for::<Order>()
        .unwrap()
        .read_all(&mut out)
        .unwrap();

    assert_eq!(out[0].tags, vec!["a", "b"]);
    assert!(out[0].paid);
    assert_eq!(out[0].shipped, chrono::NaiveDate::from_ymd_opt(2024, 1, 15));
    assert_eq!(out[0].audit, Audit { created_by: "ops".into(), revision: 3 });
    #[cfg(feature = "json")]
    assert_eq!(
        out[0].meta.as_ref().map(|m| m.0["qty"]),
        Some(2)
    );

    assert!(out[1].tags.is_empty());
    assert!(!out[1].paid);
    assert_eq!(out[1].shipped, None);
    assert_eq!(out[1].audit.revision, 1);
    #[cfg(feature = "json")]
    assert_eq!(out[1].meta, None);
}

#[derive(Debug, Default, SheetRecord)]
struct Broken {
    #[sheet("Values")]
    values: Vec<i32>,
}

#[test]
fn collection_without_split_is_unsupported() {
    let mut connector = Connector::new();
    connector.attach(
        MemoryWorkbook::new().with_sheet("Broken", vec![vec!["Values"], vec!["1|2"]]),
    );
    let mut reader = connector.new_reader_for::<Broken>().unwrap();
    assert!(reader.next());
    match reader.read::<Broken>().unwrap_err() {
        SheetError::UnsupportedFieldType { field, .. } => assert_eq!(field, "values"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn field_maps_are_built_once_per_cache() {
    let cache = Arc::new(FieldMapCache::new());
    let mut connector = Connector::new().with_cache(Arc::clone(&cache));
    connector.attach(MemoryWorkbook::new().with_sheet("Standard", standard_rows()));

    let mut out: Vec<Standard> = Vec::new();
    connector
        .new_reader_for::<Standard>()
        .unwrap()
        .read_all(&mut out)
        .unwrap();
    assert!(cache.contains::<Standard>());
    let first = cache.get_or_build::<Standard>().unwrap();

    connector
        .new_reader_for::<Standard>()
        .unwrap()
        .read_all(&mut out)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &cache.get_or_build::<Standard>().unwrap()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn reader_open_uses_global_cache() {
    let mut reader = SheetReader::open(
        &mut MemoryWorkbook::new().with_sheet("Standard", standard_rows()),
        "Standard",
    )
    .unwrap();
    let decoded: Vec<_> = reader.rows::<Standard>().collect::<Result<_, _>>().unwrap();
    assert_eq!(decoded.len(), 4);
    assert!(FieldMapCache::global().contains::<Standard>());
}
