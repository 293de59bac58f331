use std::fs;

use lifegrid_cluster::{EntityGroup, Phase};
use lifegrid_core::{
    AggregationKind, BeatId, Dataset, GroupId, KindPair, LifeSpan, Measurement, MeasurementKind,
    PhaseId, SourceFormat,
};
use lifegrid_grid::{GridView, MeasurementGrid};
use lifegrid_io::{export_project, import_project, render_grid, verify_project};
use tempfile::tempdir;

fn beat(raw: u32) -> BeatId {
    BeatId::from_raw(raw)
}

fn raw_none() -> KindPair {
    KindPair::new(MeasurementKind::Raw, AggregationKind::None)
}

fn record(value: f64) -> Vec<Measurement> {
    vec![Measurement::new(
        MeasurementKind::Raw,
        AggregationKind::None,
        value,
    )]
}

fn sample_dataset() -> Dataset {
    let mut dataset = Dataset::new("fleet", SourceFormat::Tsv);
    for year in 2000..=2005 {
        dataset.add_beat(year.to_string());
    }
    dataset
        .add_entity("ferry", LifeSpan::new(beat(0), Some(beat(5)), true))
        .unwrap();
    dataset
        .add_entity("tug", LifeSpan::new(beat(1), Some(beat(3)), false))
        .unwrap();
    dataset
        .add_entity("barge", LifeSpan::new(beat(2), None, true))
        .unwrap();
    dataset.add_record("ferry", beat(0), record(2.0)).unwrap();
    dataset.add_record("ferry", beat(1), record(3.0)).unwrap();
    dataset.add_record("ferry", beat(3), record(4.0)).unwrap();
    dataset.add_record("tug", beat(1), record(1.5)).unwrap();
    dataset.add_record("tug", beat(2), record(2.5)).unwrap();
    dataset.add_record("barge", beat(4), record(7.0)).unwrap();
    dataset
}

fn sample_phases() -> Vec<Phase> {
    vec![
        Phase::from_range(PhaseId::from_raw(0), beat(0), beat(1)),
        Phase::from_range(PhaseId::from_raw(1), beat(2), beat(3)),
        Phase::from_range(PhaseId::from_raw(2), beat(4), beat(5)),
    ]
}

fn sample_groups(dataset: &Dataset) -> Vec<EntityGroup> {
    let ferry = dataset.entity("ferry").unwrap().clone();
    let tug = dataset.entity("tug").unwrap().clone();
    let barge = dataset.entity("barge").unwrap().clone();
    vec![
        EntityGroup::from_members(GroupId::from_raw(0), vec![ferry, tug]).unwrap(),
        EntityGroup::from_members(GroupId::from_raw(1), vec![barge]).unwrap(),
    ]
}

fn sample_view(dataset: &Dataset) -> (GridView, Vec<Phase>) {
    let phases = sample_phases();
    let groups = sample_groups(dataset);
    let grid = MeasurementGrid::build(dataset, &phases, &groups).unwrap();
    (GridView::project(&grid, raw_none()), phases)
}

#[test]
fn grid_text_renders_the_expected_lines() {
    let dataset = sample_dataset();
    let (view, phases) = sample_view(&dataset);

    let text = render_grid(&view, &phases);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "{0,0,1}\t{1,2,3}\t{2,4,5}");
    assert_eq!(lines[1], "0\t{ferry,tug}\t{0:6.5,1:6.5}");
    assert_eq!(lines[2], "1\t{barge}\t{2:7}");
}

#[test]
fn exported_projects_reload_identically() {
    let dataset = sample_dataset();
    let (view, phases) = sample_view(&dataset);

    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("fleet-project");
    export_project(&project_dir, &dataset, &view, &phases).unwrap();

    let imported = import_project(&project_dir).unwrap();
    assert_eq!(imported.dataset.name(), "fleet-project");
    assert_eq!(imported.dataset.source(), SourceFormat::Project);

    // Year labels come back as full timestamps but mean the same instant.
    assert_eq!(
        imported.dataset.timeline()[0].timestamp,
        dataset.timeline()[0].timestamp
    );
    assert_eq!(imported.dataset.timeline().len(), 6);

    let ferry = imported.dataset.entity("ferry").unwrap();
    assert_eq!(ferry.life.birth, beat(0));
    assert_eq!(ferry.life.death, Some(beat(5)));
    assert!(ferry.life.alive);
    let tug = imported.dataset.entity("tug").unwrap();
    assert!(!tug.life.alive);
    let barge = imported.dataset.entity("barge").unwrap();
    assert_eq!(barge.life.death, None);
    assert!(barge.life.alive);

    // Record presence and values survive; blanks stay blank.
    assert_eq!(imported.dataset.records_for("ferry").unwrap().len(), 3);
    assert_eq!(imported.dataset.value_at("ferry", beat(3), raw_none()), Some(4.0));
    assert_eq!(imported.dataset.value_at("ferry", beat(2), raw_none()), None);

    assert_eq!(imported.phases.len(), 3);
    assert_eq!(imported.phases[1].first_beat(), beat(2));
    assert_eq!(imported.phases[1].last_beat(), beat(3));

    let members: Vec<&str> = imported.groups[0]
        .members()
        .iter()
        .map(|entity| entity.name.as_str())
        .collect();
    assert_eq!(members, vec!["ferry", "tug"]);
    assert_eq!(imported.groups[1].first_member_name(), "barge");

    verify_project(&imported).unwrap();
}

#[test]
fn verification_catches_tampered_values() {
    let dataset = sample_dataset();
    let (view, phases) = sample_view(&dataset);

    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("tampered");
    export_project(&project_dir, &dataset, &view, &phases).unwrap();

    let grid_path = project_dir.join("gpm.tsv");
    let text = fs::read_to_string(&grid_path).unwrap();
    fs::write(&grid_path, text.replacen("6.5", "9.9", 1)).unwrap();

    let imported = import_project(&project_dir).unwrap();
    let err = verify_project(&imported).unwrap_err();
    assert_eq!(err.info().code, "grid-mismatch");
    assert_eq!(err.info().context["group"], "0");
}

#[test]
fn missing_files_are_reported() {
    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("hollow");
    fs::create_dir_all(&project_dir).unwrap();

    let err = import_project(&project_dir).unwrap_err();
    assert_eq!(err.info().code, "missing-project-file");
    assert_eq!(err.info().context["file"], "tem.tsv");

    fs::write(project_dir.join("tem.tsv"), "").unwrap();
    let err = import_project(&project_dir).unwrap_err();
    assert_eq!(err.info().code, "missing-project-file");
    assert_eq!(err.info().context["file"], "gpm.tsv");
}

#[test]
fn dangling_phase_beats_fail_loudly() {
    let dataset = sample_dataset();
    let (view, phases) = sample_view(&dataset);

    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("dangling");
    export_project(&project_dir, &dataset, &view, &phases).unwrap();
    fs::write(
        project_dir.join("gpm.tsv"),
        "{0,0,99}\n0\t{ferry}\t{}\n",
    )
    .unwrap();

    let err = import_project(&project_dir).unwrap_err();
    assert_eq!(err.info().code, "unknown-beat");
}

#[test]
fn unknown_members_fail_loudly() {
    let dataset = sample_dataset();
    let (view, phases) = sample_view(&dataset);

    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("ghostly");
    export_project(&project_dir, &dataset, &view, &phases).unwrap();
    fs::write(
        project_dir.join("gpm.tsv"),
        "{0,0,1}\n0\t{ghost}\t{}\n",
    )
    .unwrap();

    let err = import_project(&project_dir).unwrap_err();
    assert_eq!(err.info().code, "unknown-entity");
}

#[test]
fn rows_without_cells_round_trip() {
    let mut dataset = Dataset::new("quiet", SourceFormat::Tsv);
    dataset.add_beat("2000");
    dataset.add_beat("2001");
    dataset
        .add_entity("idle", LifeSpan::new(beat(0), Some(beat(0)), false))
        .unwrap();
    let phases = vec![Phase::from_range(PhaseId::from_raw(0), beat(0), beat(1))];
    let idle = dataset.entity("idle").unwrap().clone();
    let groups = vec![EntityGroup::from_members(GroupId::from_raw(0), vec![idle]).unwrap()];
    let grid = MeasurementGrid::build(&dataset, &phases, &groups).unwrap();
    let view = GridView::project(&grid, raw_none());

    assert_eq!(render_grid(&view, &phases).lines().nth(1), Some("0\t{idle}\t{}"));

    let dir = tempdir().unwrap();
    let project_dir = dir.path().join("quiet-project");
    export_project(&project_dir, &dataset, &view, &phases).unwrap();
    let imported = import_project(&project_dir).unwrap();
    assert!(imported.stored.rows[0].values.is_empty());
    verify_project(&imported).unwrap();
}
