use std::fs;

use harvester_core::Record;
use harvester_engine::{render_csv, CsvExporter, ExportError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn records() -> Vec<Record> {
    vec![
        Record::new("Café du Lac", "Quai 1", "1006", "Lausanne", "VD", "021 000 00 00"),
        Record::new("Pizzeria \"Roma\"", "Via Nassa 3, 2. Stock", "6900", "Lugano", "TI", ""),
    ]
}

#[test]
fn header_uses_export_column_names() {
    let bytes = render_csv(&[]).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "restaurant_name,address,zip_code,city,canton,phone\n"
    );
}

#[test]
fn values_are_quoted_when_needed() {
    let text = String::from_utf8(render_csv(&records()).unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "Café du Lac,Quai 1,1006,Lausanne,VD,021 000 00 00");
    assert_eq!(
        lines[2],
        "\"Pizzeria \"\"Roma\"\"\",\"Via Nassa 3, 2. Stock\",6900,Lugano,TI,"
    );
}

#[test]
fn export_creates_directory_and_replaces_file() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("data");
    let exporter = CsvExporter::new(dir.clone());

    let first = exporter.export("lunchcheck.csv", &records()).unwrap();
    assert_eq!(first.record_count, 2);
    assert_eq!(first.output_path, dir.join("lunchcheck.csv"));
    assert!(dir.is_dir());

    let second = exporter.export("lunchcheck.csv", &records()[..1]).unwrap();
    assert_eq!(second.output_path, first.output_path);
    let content = fs::read_to_string(&second.output_path).unwrap();
    assert_eq!(content.lines().count(), 2);

    let leftovers: Vec<_> = fs::read_dir(&dir).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn file_in_place_of_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("data");
    fs::write(&not_a_dir, "x").unwrap();

    let exporter = CsvExporter::new(not_a_dir.clone());
    let err = exporter.export("lunchcheck.csv", &records()).unwrap_err();
    assert!(matches!(err, ExportError::OutputDir { ref path, .. } if *path == not_a_dir));
    assert_eq!(fs::read_to_string(&not_a_dir).unwrap(), "x");
}

#[test]
fn exported_file_matches_rendered_csv() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path().to_path_buf());

    let summary = exporter.export("lunchcheck.csv", &records()).unwrap();
    assert_eq!(
        fs::read(&summary.output_path).unwrap(),
        render_csv(&records()).unwrap()
    );
}
