use lifegrid_cluster::{EntityGroup, Phase};
use lifegrid_core::{
    AggregationKind, BeatId, Dataset, GroupId, KindPair, LifeSpan, Measurement, MeasurementKind,
    PhaseId, SourceFormat,
};
use lifegrid_grid::{GridView, MeasurementGrid};
use lifegrid_patterns::{mine, MiningRules, Pattern, PatternKind};

fn beat(id: u32) -> BeatId {
    BeatId::from_raw(id)
}

fn plain(value: f64) -> Measurement {
    Measurement::new(MeasurementKind::Raw, AggregationKind::None, value)
}

fn phase(id: u32, first: u32, last: u32) -> Phase {
    Phase::from_range(PhaseId::from_raw(id), beat(first), beat(last))
}

fn three_phases() -> Vec<Phase> {
    vec![phase(0, 0, 1), phase(1, 2, 3), phase(2, 4, 5)]
}

fn six_beat_dataset() -> Dataset {
    let mut dataset = Dataset::new("bdu", SourceFormat::Tsv);
    for label in ["2000", "2001", "2002", "2003", "2004", "2005"] {
        dataset.add_beat(label);
    }
    dataset
}

fn build_view(dataset: &Dataset, phases: &[Phase], order: &[&str]) -> GridView {
    let groups: Vec<EntityGroup> = order
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let members = vec![dataset.entity(name).unwrap().clone()];
            EntityGroup::from_members(GroupId::from_raw(id as u32), members).unwrap()
        })
        .collect();
    let grid = MeasurementGrid::build(dataset, phases, &groups).unwrap();
    GridView::project(
        &grid,
        KindPair::new(MeasurementKind::Raw, AggregationKind::None),
    )
}

fn cell_names(pattern: &Pattern) -> Vec<&str> {
    pattern
        .cells
        .iter()
        .map(|cell| cell.entity_name.as_str())
        .collect()
}

fn rules(threshold: usize) -> MiningRules {
    MiningRules {
        threshold,
        ..MiningRules::default()
    }
}

#[test]
fn four_births_in_one_phase_emit_one_pattern() {
    let mut dataset = six_beat_dataset();
    for (name, birth) in [("b0", 0), ("b1", 0), ("b2", 1), ("b3", 1)] {
        dataset
            .add_entity(name, LifeSpan::new(beat(birth), Some(beat(birth)), true))
            .unwrap();
        dataset.add_record(name, beat(birth), vec![plain(1.0)]).unwrap();
    }
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["b0", "b1", "b2", "b3"]);

    let patterns = mine(&view, &phases, None, &rules(3));

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::MultipleBirths);
    assert_eq!(cell_names(&patterns[0]), vec!["b0", "b1", "b2", "b3"]);
    assert!(patterns[0].cells.iter().all(|c| c.phase == PhaseId::from_raw(0)));
}

#[test]
fn three_births_stay_below_the_strict_threshold() {
    let mut dataset = six_beat_dataset();
    for name in ["b0", "b1", "b2"] {
        dataset
            .add_entity(name, LifeSpan::new(beat(0), Some(beat(0)), true))
            .unwrap();
        dataset.add_record(name, beat(0), vec![plain(1.0)]).unwrap();
    }
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["b0", "b1", "b2"]);

    assert!(mine(&view, &phases, None, &rules(3)).is_empty());
}

#[test]
fn updates_require_a_cell_in_the_phase() {
    let mut dataset = six_beat_dataset();
    for name in ["u0", "u1", "quiet"] {
        dataset
            .add_entity(name, LifeSpan::new(beat(0), Some(beat(5)), true))
            .unwrap();
        dataset.add_record(name, beat(0), vec![plain(1.0)]).unwrap();
    }
    dataset.add_record("u0", beat(2), vec![plain(2.0)]).unwrap();
    dataset.add_record("u1", beat(3), vec![plain(2.0)]).unwrap();
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["u0", "u1", "quiet"]);

    let patterns = mine(&view, &phases, Some(PatternKind::MultipleUpdates), &rules(1));

    assert_eq!(patterns.len(), 1);
    assert_eq!(cell_names(&patterns[0]), vec!["u0", "u1"]);
    assert_eq!(patterns[0].cells[0].phase, PhaseId::from_raw(1));
}

#[test]
fn buckets_emit_births_then_updates_then_deaths_per_phase() {
    let mut dataset = six_beat_dataset();
    dataset
        .add_entity("a", LifeSpan::new(beat(0), Some(beat(5)), true))
        .unwrap();
    dataset.add_record("a", beat(0), vec![plain(1.0)]).unwrap();
    dataset.add_record("a", beat(2), vec![plain(1.0)]).unwrap();
    for name in ["d1", "d2"] {
        dataset
            .add_entity(name, LifeSpan::new(beat(0), Some(beat(2)), false))
            .unwrap();
        dataset.add_record(name, beat(0), vec![plain(1.0)]).unwrap();
    }
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["a", "d1", "d2"]);

    let patterns = mine(&view, &phases, None, &rules(0));

    let kinds: Vec<PatternKind> = patterns.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PatternKind::MultipleBirths,
            PatternKind::MultipleUpdates,
            PatternKind::MultipleDeaths,
            PatternKind::Ladder,
        ]
    );
    assert_eq!(cell_names(&patterns[0]), vec!["a", "d1", "d2"]);
    assert_eq!(cell_names(&patterns[1]), vec!["a"]);
    assert_eq!(cell_names(&patterns[2]), vec!["d1", "d2"]);
    // A zero threshold lets the single birth run flush with an empty
    // buffer, which is how the legacy rule behaves.
    assert!(patterns[3].cells.is_empty());
}

#[test]
fn kind_filter_restricts_to_one_bucket() {
    let mut dataset = six_beat_dataset();
    dataset
        .add_entity("a", LifeSpan::new(beat(0), Some(beat(5)), true))
        .unwrap();
    dataset.add_record("a", beat(2), vec![plain(1.0)]).unwrap();
    for name in ["d1", "d2"] {
        dataset
            .add_entity(name, LifeSpan::new(beat(0), Some(beat(2)), false))
            .unwrap();
    }
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["a", "d1", "d2"]);

    let deaths = mine(&view, &phases, Some(PatternKind::MultipleDeaths), &rules(0));
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].kind, PatternKind::MultipleDeaths);
    assert_eq!(cell_names(&deaths[0]), vec!["d1", "d2"]);

    let births = mine(&view, &phases, Some(PatternKind::MultipleBirths), &rules(0));
    assert_eq!(births.len(), 1);
    assert_eq!(births[0].kind, PatternKind::MultipleBirths);
}

#[test]
fn cells_follow_the_current_row_order() {
    let mut dataset = six_beat_dataset();
    for name in ["zeta", "alpha", "mu", "kappa"] {
        dataset
            .add_entity(name, LifeSpan::new(beat(0), Some(beat(0)), true))
            .unwrap();
    }
    let phases = three_phases();
    let view = build_view(&dataset, &phases, &["zeta", "alpha", "mu", "kappa"]);

    let patterns = mine(&view, &phases, Some(PatternKind::MultipleBirths), &rules(3));

    assert_eq!(cell_names(&patterns[0]), vec!["zeta", "alpha", "mu", "kappa"]);
}
