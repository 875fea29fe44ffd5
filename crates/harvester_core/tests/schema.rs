use std::sync::Once;

use harvester_core::{classify, inspect, Field, Record, RowVerdict, SCHEMAS};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// A row of `columns` cells with the payload starting at `name_at`.
fn row(columns: usize, name_at: usize) -> Vec<String> {
    let mut cells = vec![String::from("x"); columns];
    let payload = ["Bistro Rössli", "Hauptgasse 4", "3600", "Thun", "BE", "033 222 11 00"];
    for (offset, value) in payload.iter().enumerate() {
        cells[name_at + offset] = value.to_string();
    }
    cells
}

#[test]
fn every_known_layout_maps_the_six_fields() {
    init_logging();
    for (columns, name_at) in [(13, 2), (15, 4), (17, 6), (19, 8), (21, 10)] {
        let record = classify(&row(columns, name_at)).expect("data row");
        assert_eq!(
            record,
            Record::new("Bistro Rössli", "Hauptgasse 4", "3600", "Thun", "BE", "033 222 11 00"),
            "layout with {columns} columns"
        );
    }
}

#[test]
fn schema_table_matches_observed_layouts() {
    let columns: Vec<usize> = SCHEMAS.iter().map(|schema| schema.columns).collect();
    assert_eq!(columns, vec![13, 15, 17, 19, 21]);
    for pair in SCHEMAS.windows(2) {
        assert_eq!(pair[1].name, pair[0].name + 2);
    }
}

#[test]
fn unknown_column_counts_are_rejected() {
    for columns in [0usize, 1, 6, 12, 14, 16, 18, 20, 22, 23, 25] {
        let cells = vec!["value"; columns];
        assert_eq!(classify(&cells), None, "{columns} columns");
        if columns > 0 {
            assert_eq!(inspect(&cells), RowVerdict::UnknownLayout { columns });
        }
    }
}

#[test]
fn blank_rows_are_spacers() {
    let cells = vec!["", " ", "\t"];
    assert_eq!(inspect(&cells), RowVerdict::Spacer);

    let wide = vec![""; 15];
    assert_eq!(inspect(&wide), RowVerdict::Spacer);

    let empty: Vec<&str> = Vec::new();
    assert_eq!(inspect(&empty), RowVerdict::Spacer);
}

#[test]
fn missing_name_or_address_is_dropped() {
    let mut no_name = row(15, 4);
    no_name[4].clear();
    assert_eq!(inspect(&no_name), RowVerdict::MissingRequired { columns: 15 });

    let mut no_address = row(17, 6);
    no_address[7] = "   ".to_string();
    assert_eq!(classify(&no_address), None);
}

#[test]
fn optional_fields_may_be_empty_and_values_are_trimmed() {
    let mut cells = row(13, 2);
    cells[2] = "  Café du Lac ".to_string();
    cells[7].clear();

    let record = classify(&cells).expect("data row");
    assert_eq!(record.name(), "Café du Lac");
    assert_eq!(record.get(Field::Phone), "");
    assert_eq!(
        record.values(),
        ["Café du Lac", "Hauptgasse 4", "3600", "Thun", "BE", ""]
    );
}
