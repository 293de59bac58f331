use std::fs;

use lifegrid_core::{
    AggregationKind, AnalysisConfig, BeatId, Dataset, GroupId, GroupSettings, KindPair, LifeSpan,
    Measurement, MeasurementKind, PatternSettings, PhaseId, PhaseSettings, SourceFormat,
};
use lifegrid_grid::RowOrder;
use lifegrid_patterns::PatternKind;
use lifegrid_session::AnalysisSession;
use tempfile::tempdir;

fn beat(raw: u32) -> BeatId {
    BeatId::from_raw(raw)
}

fn raw_none() -> KindPair {
    KindPair::new(MeasurementKind::Raw, AggregationKind::None)
}

fn delta_none() -> KindPair {
    KindPair::new(MeasurementKind::Delta, AggregationKind::None)
}

fn record(value: f64) -> Vec<Measurement> {
    vec![Measurement::new(
        MeasurementKind::Raw,
        AggregationKind::None,
        value,
    )]
}

fn harbor_dataset() -> Dataset {
    let mut dataset = Dataset::new("harbor", SourceFormat::Tsv);
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
        .add_entity("barge", LifeSpan::new(beat(2), Some(beat(5)), true))
        .unwrap();
    dataset
        .add_entity("canoe", LifeSpan::new(beat(0), Some(beat(2)), false))
        .unwrap();
    dataset.add_record("ferry", beat(0), record(2.0)).unwrap();
    dataset.add_record("ferry", beat(1), record(3.0)).unwrap();
    dataset.add_record("ferry", beat(3), record(4.0)).unwrap();
    dataset.add_record("tug", beat(1), record(1.5)).unwrap();
    dataset.add_record("tug", beat(2), record(2.5)).unwrap();
    dataset.add_record("barge", beat(2), record(1.0)).unwrap();
    dataset.add_record("barge", beat(4), record(7.0)).unwrap();
    dataset.add_record("canoe", beat(0), record(5.0)).unwrap();
    dataset.add_record("canoe", beat(2), record(1.0)).unwrap();
    dataset
}

// Counts matching the timeline and population sizes skip every merge,
// so the clustering is singletons in input order and the tests stay
// independent of distance arithmetic.
fn singleton_config() -> AnalysisConfig {
    AnalysisConfig {
        phases: PhaseSettings {
            count: 6,
            ..PhaseSettings::default()
        },
        groups: GroupSettings {
            count: 4,
            ..GroupSettings::default()
        },
        ..AnalysisConfig::default()
    }
}

fn with_threshold(threshold: usize) -> AnalysisConfig {
    AnalysisConfig {
        patterns: PatternSettings {
            threshold,
            ..PatternSettings::default()
        },
        ..singleton_config()
    }
}

fn clustered_session() -> AnalysisSession {
    let mut session = AnalysisSession::new();
    session.attach_dataset(harbor_dataset());
    session.cluster(&singleton_config()).unwrap();
    session
}

#[test]
fn queries_before_load_and_before_clustering_fail() {
    let mut session = AnalysisSession::new();
    assert!(!session.is_loaded());
    assert_eq!(session.beat_count(), 0);
    assert_eq!(session.dataset().unwrap_err().info().code, "no-dataset");
    assert_eq!(
        session
            .cluster(&singleton_config())
            .unwrap_err()
            .info()
            .code,
        "no-dataset"
    );

    session.attach_dataset(harbor_dataset());
    assert!(session.is_loaded());
    assert!(!session.is_clustered());
    assert_eq!(session.current_view().unwrap_err().info().code, "not-clustered");
    assert_eq!(session.phases().unwrap_err().info().code, "not-clustered");
    assert_eq!(
        session.patterns(None).unwrap_err().info().code,
        "not-clustered"
    );
    assert_eq!(
        session
            .sort(RowOrder::BirthAscending)
            .unwrap_err()
            .info()
            .code,
        "not-clustered"
    );
    let dir = tempdir().unwrap();
    assert_eq!(
        session
            .export_project(&dir.path().join("out"))
            .unwrap_err()
            .info()
            .code,
        "not-clustered"
    );
}

#[test]
fn counts_track_the_dataset() {
    let mut session = AnalysisSession::new();
    session.attach_dataset(harbor_dataset());
    assert_eq!(session.beat_count(), 6);
    assert_eq!(session.entity_count(), 4);
    assert_eq!(session.record_count(), 9);
    assert_eq!(session.phase_count(), 0);
    assert_eq!(session.group_count(), 0);
}

#[test]
fn clustering_populates_phases_groups_and_view() {
    let session = clustered_session();
    assert!(session.is_clustered());
    assert_eq!(session.phase_count(), 6);
    assert_eq!(session.group_count(), 4);

    let phases = session.phases().unwrap();
    for (index, phase) in phases.iter().enumerate() {
        assert_eq!(phase.id(), PhaseId::from_raw(index as u32));
        assert_eq!(phase.beats(), &[beat(index as u32)]);
    }

    let groups = session.groups().unwrap();
    let names: Vec<&str> = groups
        .iter()
        .map(|group| group.first_member_name())
        .collect();
    assert_eq!(names, ["ferry", "tug", "barge", "canoe"]);

    let view = session.current_view().unwrap();
    assert_eq!(view.pair(), raw_none());
    assert_eq!(view.rows().len(), 4);
    assert_eq!(view.rows()[0].group().first_member_name(), "ferry");
    assert_eq!(view.rows()[0].activity(), 3);

    let range = session.grid().unwrap().range(raw_none()).unwrap();
    assert_eq!(range.min, 1.0);
    assert_eq!(range.max, 7.0);
}

#[test]
fn default_rules_find_the_birth_ladder() {
    let mut session = clustered_session();
    let patterns = session.patterns(None).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::Ladder);
    let cells: Vec<(&str, u32)> = patterns[0]
        .cells
        .iter()
        .map(|cell| (cell.entity_name.as_str(), cell.phase.as_raw()))
        .collect();
    assert_eq!(
        cells,
        [("ferry", 0), ("canoe", 0), ("tug", 1), ("barge", 2)]
    );
}

#[test]
fn sorting_changes_rows_but_not_mining_results() {
    let mut session = clustered_session();
    let before = session.patterns(None).unwrap().to_vec();

    session.sort(RowOrder::ActivityAscending).unwrap();
    let view = session.current_view().unwrap();
    assert_eq!(view.rows()[0].group().first_member_name(), "tug");
    assert_eq!(view.rows()[3].group().first_member_name(), "ferry");

    let after = session.patterns(None).unwrap().to_vec();
    assert_eq!(before, after);
}

#[test]
fn reclustering_with_a_tighter_threshold_replaces_cached_patterns() {
    let mut session = clustered_session();
    assert_eq!(session.patterns(None).unwrap().len(), 1);

    session.cluster(&with_threshold(1)).unwrap();
    let patterns = session.patterns(None).unwrap();
    assert_eq!(patterns.len(), 2);
    assert_eq!(patterns[0].kind, PatternKind::MultipleBirths);
    assert_eq!(patterns[0].cells.len(), 2);
    assert_eq!(patterns[1].kind, PatternKind::Ladder);

    let births = session.patterns(Some(PatternKind::MultipleBirths)).unwrap();
    assert_eq!(births.len(), 1);
    let cells: Vec<&str> = births[0]
        .cells
        .iter()
        .map(|cell| cell.entity_name.as_str())
        .collect();
    assert_eq!(cells, ["ferry", "canoe"]);
}

#[test]
fn reprojection_resets_row_order_and_recomputes_patterns() {
    let mut session = AnalysisSession::new();
    session.attach_dataset(harbor_dataset());
    session.cluster(&with_threshold(0)).unwrap();

    // Raw cells back four update buckets on top of the lifecycle ones.
    assert_eq!(session.patterns(None).unwrap().len(), 10);

    session.sort(RowOrder::ActivityAscending).unwrap();
    let same_pair = session.view(raw_none()).unwrap();
    assert_eq!(same_pair.rows()[0].group().first_member_name(), "tug");

    // No delta measurements exist, so every update bucket disappears
    // while the lifecycle patterns survive.
    let view = session.view(delta_none()).unwrap();
    assert_eq!(view.pair(), delta_none());
    assert_eq!(view.rows()[0].group().first_member_name(), "ferry");
    assert!(view.rows().iter().all(|row| row.activity() == 0));
    assert_eq!(session.patterns(None).unwrap().len(), 6);
}

#[test]
fn unavailable_aggregations_are_rejected_by_view() {
    let mut session = clustered_session();
    let err = session
        .view(KindPair::new(MeasurementKind::Raw, AggregationKind::SumAll))
        .unwrap_err();
    assert_eq!(err.info().code, "aggregation-unavailable");
}

#[test]
fn breakdowns_split_cells_by_member() {
    let mut session = AnalysisSession::new();
    session.attach_dataset(harbor_dataset());
    let config = AnalysisConfig {
        groups: GroupSettings {
            count: 1,
            ..GroupSettings::default()
        },
        ..singleton_config()
    };
    session.cluster(&config).unwrap();
    assert_eq!(session.group_count(), 1);

    let mut shares = session
        .cell_breakdown(GroupId::from_raw(0), PhaseId::from_raw(2))
        .unwrap();
    shares.sort_by(|a, b| a.entity.cmp(&b.entity));
    let listed: Vec<(&str, f64)> = shares
        .iter()
        .map(|share| (share.entity.as_str(), share.value))
        .collect();
    assert_eq!(listed, [("barge", 1.0), ("canoe", 1.0), ("tug", 2.5)]);

    // Phase 5 exists but nobody recorded anything there.
    let empty = session
        .cell_breakdown(GroupId::from_raw(0), PhaseId::from_raw(5))
        .unwrap();
    assert!(empty.is_empty());

    let err = session
        .cell_breakdown(GroupId::from_raw(9), PhaseId::from_raw(0))
        .unwrap_err();
    assert_eq!(err.info().code, "unknown-group");
    let err = session
        .cell_breakdown(GroupId::from_raw(0), PhaseId::from_raw(9))
        .unwrap_err();
    assert_eq!(err.info().code, "unknown-phase");
}

#[test]
fn projects_round_trip_through_sessions() {
    let dir = tempdir().unwrap();
    let first_dir = dir.path().join("harbor-project");
    let second_dir = dir.path().join("harbor-copy");

    let mut original = clustered_session();
    original.export_project(&first_dir).unwrap();

    let mut restored = AnalysisSession::new();
    restored.import_project(&first_dir).unwrap();
    assert!(restored.is_clustered());
    assert_eq!(restored.beat_count(), 6);
    assert_eq!(restored.entity_count(), 4);
    assert_eq!(restored.group_count(), 4);
    assert_eq!(restored.current_view().unwrap().pair(), raw_none());

    let patterns = restored.patterns(None).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::Ladder);

    restored.export_project(&second_dir).unwrap();
    for file in ["tem.tsv", "gpm.tsv"] {
        let first = fs::read_to_string(first_dir.join(file)).unwrap();
        let second = fs::read_to_string(second_dir.join(file)).unwrap();
        assert_eq!(first, second, "{file} drifted across a round trip");
    }
}

#[test]
fn load_reads_matrix_files_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fleet.tsv");
    fs::write(
        &path,
        "fleet\t2000\t2001\t2002\nalpha\t1\t\t2\nbeta\t\t3\t4\n",
    )
    .unwrap();

    let mut session = AnalysisSession::new();
    session.load(&path, SourceFormat::Tsv).unwrap();
    assert_eq!(session.beat_count(), 3);
    assert_eq!(session.entity_count(), 2);
    assert_eq!(session.record_count(), 4);
    assert_eq!(session.dataset().unwrap().name(), "fleet");

    let config = AnalysisConfig {
        phases: PhaseSettings {
            count: 3,
            ..PhaseSettings::default()
        },
        groups: GroupSettings {
            count: 2,
            ..GroupSettings::default()
        },
        ..AnalysisConfig::default()
    };
    session.cluster(&config).unwrap();
    assert_eq!(session.current_view().unwrap().rows().len(), 2);
}

#[test]
fn attaching_a_dataset_clears_previous_output() {
    let mut session = clustered_session();
    assert!(session.is_clustered());

    session.attach_dataset(harbor_dataset());
    assert!(!session.is_clustered());
    assert_eq!(session.phase_count(), 0);
    assert_eq!(session.current_view().unwrap_err().info().code, "not-clustered");
}
