use std::fs;

use troponin_viewer::classify::ThresholdTable;
use troponin_viewer::config::GeneratorConfig;
use troponin_viewer::data::export::{export, ExportOptions};
use troponin_viewer::data::filter::{filtered_indices, init_filter_state};
use troponin_viewer::data::generator::generate;
use troponin_viewer::data::loader::load_file;
use troponin_viewer::data::model::{DataSource, Sex};
use troponin_viewer::error::DatasetError;
use troponin_viewer::stats::Summary;

const CLINIC_CSV: &str = "Paciente_ID,Edad,Sexo,Troponina_cTnI_ng_mL,Fecha\n\
                          1,34,Masculino,0.008,2025-01-01\n\
                          2,58,Femenino,0.032,2025-01-02\n\
                          3,66,Masculino,0.61,2025-01-03\n\
                          4,71,Femenino,2.4,2025-01-04\n\
                          5,80,Masculino,7.9,2025-01-05\n";

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn load_filter_summarise() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "clinic.csv", CLINIC_CSV);
    let ds = load_file(&path, &ThresholdTable::five_band()).unwrap();

    assert_eq!(ds.source, DataSource::File(path.clone()));
    assert_eq!(ds.len(), 5);

    let mut filters = init_filter_state(&ds);
    filters.sexes = [Sex::Male].into_iter().collect();
    filters.age = Some((40, 90));
    let visible = filtered_indices(&ds, &filters);
    assert_eq!(visible, vec![2, 4]);

    let summary = Summary::of(&ds.concentrations(&visible)).unwrap();
    assert!((summary.mean - 4.255).abs() < 1e-9);
    assert!((summary.median - 4.255).abs() < 1e-9);
    assert_eq!(summary.max, 7.9);
}

#[test]
fn csv_export_reloads_to_the_same_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "clinic.csv", CLINIC_CSV);
    let table = ThresholdTable::five_band();
    let ds = load_file(&path, &table).unwrap();

    let moderate_up: Vec<_> = table.diagnoses().skip(2).collect();
    let filters = init_filter_state(&ds).with_diagnoses(moderate_up);
    let visible = filtered_indices(&ds, &filters);
    assert_eq!(visible, vec![2, 3, 4]);

    let out = dir.path().join("filtered.csv");
    let n = export(&out, &ds, &visible, &ExportOptions::default()).unwrap();
    assert_eq!(n, 3);

    let text = fs::read_to_string(&out).unwrap();
    let expected: Vec<&str> = CLINIC_CSV
        .lines()
        .enumerate()
        .filter(|(i, _)| *i == 0 || *i >= 3)
        .map(|(_, l)| l)
        .collect();
    assert_eq!(text.lines().collect::<Vec<_>>(), expected);

    let reloaded = load_file(&out, &table).unwrap();
    let labels: Vec<&str> = reloaded.records.iter().map(|r| reloaded.label(r)).collect();
    assert_eq!(labels, ["Moderate", "High", "Critical"]);
}

#[test]
fn parquet_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let table = ThresholdTable::five_band();
    let ds = generate(&GeneratorConfig::default(), &table).unwrap();
    let all: Vec<usize> = (0..ds.len()).collect();

    let out = dir.path().join("synthetic.parquet");
    export(&out, &ds, &all, &ExportOptions::default()).unwrap();

    let back = load_file(&out, &table).unwrap();
    assert_eq!(back.len(), ds.len());
    assert_eq!(back.columns, ds.columns);
    for (a, b) in ds.records.iter().zip(&back.records) {
        assert_eq!(a.measurement, b.measurement);
        assert_eq!(a.diagnosis, b.diagnosis);
    }
}

#[test]
fn json_round_trip_with_diagnosis_column() {
    let dir = tempfile::tempdir().unwrap();
    let table = ThresholdTable::five_band();
    let ds = generate(&GeneratorConfig::default(), &table).unwrap();
    let some: Vec<usize> = (0..ds.len()).step_by(7).collect();

    let out = dir.path().join("subset.json");
    let options = ExportOptions {
        columns: Some(vec!["troponin_ng_mL".into(), "age".into()]),
        append_diagnosis: true,
    };
    export(&out, &ds, &some, &options).unwrap();

    let back = load_file(&out, &table).unwrap();
    assert_eq!(back.len(), some.len());
    let diagnosis_col = back.column_index("diagnosis").unwrap();
    for (record, &i) in back.records.iter().zip(&some) {
        let original = &ds.records[i];
        assert_eq!(
            record.measurement.troponin_ng_ml,
            original.measurement.troponin_ng_ml
        );
        assert_eq!(record.measurement.age, original.measurement.age);
        assert_eq!(record.cells[diagnosis_col], ds.label(original));
    }
}

#[test]
fn fallback_and_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let table = ThresholdTable::five_band();

    let path = write(&dir, "values.csv", "sample,reading\nA,0.02\nB,1.5\n");
    let ds = load_file(&path, &table).unwrap();
    assert_eq!(ds.concentration_column, "reading");

    let path = write(&dir, "names.csv", "sample,site\nA,north\n");
    let err = load_file(&path, &table).unwrap_err();
    assert!(matches!(err, DatasetError::MissingColumn));
}

#[test]
fn unparsable_file_yields_no_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let table = ThresholdTable::five_band();

    let path = write(&dir, "broken.json", "[{\"troponin_ng_mL\": 0.1},");
    let err = load_file(&path, &table).unwrap_err();
    assert!(err.is_parse_failure());

    let path = write(&dir, "broken.parquet", "not parquet at all");
    let err = load_file(&path, &table).unwrap_err();
    assert!(err.is_parse_failure());

    let err = load_file(&dir.path().join("absent.csv"), &table).unwrap_err();
    assert!(err.is_parse_failure());
}

#[test]
fn tsv_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "clinic.tsv", "age\tsex\ttroponin_ng_mL\n50\tF\t0.5\n");
    let ds = load_file(&path, &ThresholdTable::four_band()).unwrap();
    assert_eq!(ds.records[0].measurement.sex, Some(Sex::Female));
    assert_eq!(ds.label(&ds.records[0]), "Probable infarction");
}

#[test]
fn re_exporting_a_labelled_file_keeps_one_diagnosis_column() {
    let dir = tempfile::tempdir().unwrap();
    let five = ThresholdTable::five_band();
    let ds = generate(&GeneratorConfig::default(), &five).unwrap();
    let all: Vec<usize> = (0..ds.len()).collect();
    let labelled = ExportOptions {
        columns: None,
        append_diagnosis: true,
    };

    let first = dir.path().join("sample.csv");
    export(&first, &ds, &all, &labelled).unwrap();

    // Reload under another table; the stored five-band labels are stale.
    let four = ThresholdTable::four_band();
    let reloaded = load_file(&first, &four).unwrap();
    assert_eq!(reloaded.columns.last().map(String::as_str), Some("diagnosis"));

    let second = dir.path().join("again.csv");
    export(&second, &reloaded, &all, &labelled).unwrap();
    let text = fs::read_to_string(&second).unwrap();
    assert_eq!(
        text.lines().next(),
        Some("patient_id,age,sex,troponin_ng_mL,date,diagnosis")
    );
    for (line, record) in text.lines().skip(1).zip(&reloaded.records) {
        assert!(line.ends_with(&format!(",{}", reloaded.label(record))));
    }

    let pq = dir.path().join("again.parquet");
    export(&pq, &reloaded, &all, &labelled).unwrap();
    let from_parquet = load_file(&pq, &four).unwrap();
    let n_diagnosis = from_parquet
        .columns
        .iter()
        .filter(|c| c.eq_ignore_ascii_case("diagnosis"))
        .count();
    assert_eq!(n_diagnosis, 1);
    assert_eq!(from_parquet.columns.len(), 6);
}
