use std::fs;
use std::path::PathBuf;

use lifegrid_core::{AggregationKind, BeatId, KindPair, MeasurementKind, SourceFormat};
use lifegrid_io::load_matrix;
use tempfile::{tempdir, TempDir};

fn write_fixture(name: &str, text: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    (dir, path)
}

fn raw() -> KindPair {
    KindPair::new(MeasurementKind::Raw, AggregationKind::None)
}

fn delta() -> KindPair {
    KindPair::new(MeasurementKind::Delta, AggregationKind::None)
}

fn beat(raw: u32) -> BeatId {
    BeatId::from_raw(raw)
}

#[test]
fn csv_header_becomes_the_timeline() {
    let (_dir, path) = write_fixture("pop.csv", "country,1990,1991,1992\ngreece,10.2,11.5,12\n");
    let dataset = load_matrix(&path, SourceFormat::Csv).unwrap();

    assert_eq!(dataset.name(), "pop");
    assert_eq!(dataset.source(), SourceFormat::Csv);
    let labels: Vec<&str> = dataset
        .timeline()
        .iter()
        .map(|beat| beat.label.as_str())
        .collect();
    assert_eq!(labels, vec!["1990", "1991", "1992"]);
    assert_eq!(
        dataset.timeline()[0].timestamp_text(),
        "1990-01-01 00:00:00"
    );
    assert_eq!(dataset.value_at("greece", beat(0), raw()), Some(10.2));
    assert_eq!(dataset.value_at("greece", beat(2), raw()), Some(12.0));
}

#[test]
fn blank_cells_leave_no_record_and_bound_the_lifetime() {
    let (_dir, path) = write_fixture(
        "gaps.csv",
        "country,2000,2001,2002,2003\niceland,,3.5,4.5,\n",
    );
    let dataset = load_matrix(&path, SourceFormat::Csv).unwrap();

    let iceland = dataset.entity("iceland").unwrap();
    assert_eq!(iceland.life.birth, beat(1));
    assert_eq!(iceland.life.death, Some(beat(2)));
    assert!(iceland.life.alive);
    assert_eq!(dataset.records_for("iceland").unwrap().len(), 2);
    assert_eq!(dataset.value_at("iceland", beat(0), raw()), None);
    assert_eq!(dataset.value_at("iceland", beat(3), raw()), None);
}

#[test]
fn first_column_values_never_seed_the_delta_baseline() {
    let (_dir, path) = write_fixture(
        "series.tsv",
        "name\t2000\t2001\t2002\nalpha\t10\t12\t15\nbeta\t\t7\t9\n",
    );
    let dataset = load_matrix(&path, SourceFormat::Tsv).unwrap();

    // Column 0 carries a raw value only.
    assert_eq!(dataset.records_for("alpha").unwrap()[&beat(0)].len(), 1);
    assert_eq!(dataset.value_at("alpha", beat(1), delta()), Some(12.0));
    assert_eq!(dataset.value_at("alpha", beat(2), delta()), Some(3.0));

    // A series starting past column 0 opens with delta equal to its raw value.
    assert_eq!(dataset.value_at("beta", beat(1), delta()), Some(7.0));
    assert_eq!(dataset.value_at("beta", beat(2), delta()), Some(2.0));
}

#[test]
fn info_cells_override_derived_lifetimes() {
    let (_dir, path) = write_fixture(
        "reload.tsv",
        "{name, birthId, deathId, status}\t2000\t2001\t2002\n\
         {volcano,0,1,0}\t4\t5\t\n\
         {glacier,1,-1,1}\t\t2\t3\n\
         {bay, north,0,2,1}\t1\t\t2\n",
    );
    let dataset = load_matrix(&path, SourceFormat::Tsv).unwrap();

    let volcano = dataset.entity("volcano").unwrap();
    assert_eq!(volcano.life.death, Some(beat(1)));
    assert!(!volcano.life.alive);

    let glacier = dataset.entity("glacier").unwrap();
    assert_eq!(glacier.life.birth, beat(1));
    assert_eq!(glacier.life.death, None);
    assert!(glacier.life.alive);

    // The three trailing fields split off from the right, so the name keeps
    // its comma.
    let bay = dataset.entity("bay, north").unwrap();
    assert_eq!(bay.life.death, Some(beat(2)));
    assert_eq!(dataset.value_at("bay, north", beat(2), raw()), Some(2.0));
}

#[test]
fn info_cell_rows_may_carry_no_values() {
    let (_dir, path) = write_fixture(
        "silent.tsv",
        "{name, birthId, deathId, status}\t2000\t2001\n{spirit,0,-1,1}\t\t\n",
    );
    let dataset = load_matrix(&path, SourceFormat::Tsv).unwrap();
    assert!(dataset.records_for("spirit").unwrap().is_empty());
}

#[test]
fn quoted_names_with_delimiters_stay_whole() {
    let (_dir, path) = write_fixture("quoted.csv", "country,1990,1991\n\"upper, lower\",1,2\n");
    let dataset = load_matrix(&path, SourceFormat::Csv).unwrap();

    let entity = dataset.entity("upper, lower").unwrap();
    assert_eq!(entity.life.birth, beat(0));
    assert_eq!(entity.life.death, Some(beat(1)));
}

#[test]
fn numeric_grouping_commas_are_tolerated() {
    let (_dir, path) = write_fixture("grouped.tsv", "name\t2000\nbig\t1,234.5\n");
    let dataset = load_matrix(&path, SourceFormat::Tsv).unwrap();
    assert_eq!(dataset.value_at("big", beat(0), raw()), Some(1234.5));
}

#[test]
fn short_rows_tolerate_missing_trailing_columns() {
    let (_dir, path) = write_fixture("short.csv", "country,1990,1991,1992,1993\ncuba,5,6\n");
    let dataset = load_matrix(&path, SourceFormat::Csv).unwrap();

    let cuba = dataset.entity("cuba").unwrap();
    assert_eq!(cuba.life.birth, beat(0));
    assert_eq!(cuba.life.death, Some(beat(1)));
    assert_eq!(dataset.records_for("cuba").unwrap().len(), 2);
}

#[test]
fn bad_cells_fail_loudly() {
    let (_dir, path) = write_fixture("broken.tsv", "name\t2000\t2001\nnoise\t3\tabc\n");
    let err = load_matrix(&path, SourceFormat::Tsv).unwrap_err();
    assert_eq!(err.info().code, "bad-number");
    assert_eq!(err.info().context["line"], "2");
    assert_eq!(err.info().context["column"], "3");
}

#[test]
fn empty_matrices_are_rejected() {
    let (_dir, path) = write_fixture("empty.tsv", "");
    let err = load_matrix(&path, SourceFormat::Tsv).unwrap_err();
    assert_eq!(err.info().code, "empty-matrix");

    let (_dir, path) = write_fixture("corner.tsv", "name\n");
    let err = load_matrix(&path, SourceFormat::Tsv).unwrap_err();
    assert_eq!(err.info().code, "empty-matrix");
}

#[test]
fn entity_rows_without_any_value_are_rejected() {
    let (_dir, path) = write_fixture("ghost.tsv", "name\t2000\t2001\nghost\t\t\n");
    let err = load_matrix(&path, SourceFormat::Tsv).unwrap_err();
    assert_eq!(err.info().code, "empty-entity-row");
}

#[test]
fn malformed_info_cells_are_rejected() {
    let (_dir, path) = write_fixture(
        "badcell.tsv",
        "{name, birthId, deathId, status}\t2000\n{lonely,0}\t1\n",
    );
    let err = load_matrix(&path, SourceFormat::Tsv).unwrap_err();
    assert_eq!(err.info().code, "bad-info-cell");
}

#[test]
fn transition_logs_are_not_matrix_files() {
    let (_dir, path) = write_fixture("folderish.tsv", "name\t2000\nx\t1\n");
    let err = load_matrix(&path, SourceFormat::TransitionLog).unwrap_err();
    assert_eq!(err.info().code, "not-a-matrix");
}
