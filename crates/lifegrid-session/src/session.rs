//! One mutable analysis workspace: dataset, clustering output, current
//! view, and the pattern cache.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use lifegrid_cluster::{extract_groups, extract_phases, EntityGroup, Phase};
use lifegrid_core::{
    AnalysisConfig, BeatId, Dataset, ErrorInfo, GroupId, KindPair, LifegridError, PhaseId, Result,
    SourceFormat,
};
use lifegrid_grid::{GridView, MeasurementGrid, RowOrder};
use lifegrid_patterns::{mine, report, MiningRules, Pattern, PatternKind};

/// One member entity's contribution to a single grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberShare {
    /// Member entity name.
    pub entity: String,
    /// Sum of the member's records over the phase, for the view's pair.
    pub value: f64,
}

/// Clustering output plus the view it is currently projected onto.
struct Analysis {
    phases: Vec<Phase>,
    groups: Vec<EntityGroup>,
    grid: MeasurementGrid,
    view: GridView,
    rules: MiningRules,
}

/// One finished mining run, kept until the view contents change.
struct PatternRun {
    kind: Option<PatternKind>,
    generation: u64,
    patterns: Vec<Pattern>,
    seconds: f64,
}

/// A caller's analysis state, from raw dataset to mined patterns.
///
/// The workspace advances in two stages: `load` (or `attach_dataset`)
/// brings in a dataset, and `cluster` produces phases, groups, the
/// grid, and a view of the resolved measurement pair. Grid and pattern
/// queries before `cluster` fail with a `Session` error so callers can
/// tell "not computed yet" from a legitimately empty result.
///
/// Mined patterns are cached per requested kind and recomputed only
/// when the view contents change, meaning a recluster, a projection
/// onto another pair, or a project import. Reordering rows does not
/// invalidate the cache: mining always runs over a birth-sorted copy,
/// so row order never reaches the miner.
pub struct AnalysisSession {
    dataset: Option<Dataset>,
    analysis: Option<Analysis>,
    mined: Option<PatternRun>,
    generation: u64,
}

impl AnalysisSession {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self {
            dataset: None,
            analysis: None,
            mined: None,
            generation: 0,
        }
    }

    /// Loads a dataset from disk, replacing any previous state.
    ///
    /// All source formats dispatch through the same loader; loading a
    /// `Project` source this way reads only its dataset file. Use
    /// [`AnalysisSession::import_project`] to restore the clustering
    /// output alongside it.
    pub fn load(&mut self, path: &Path, format: SourceFormat) -> Result<()> {
        let dataset = lifegrid_io::load_dataset(path, format)?;
        self.attach_dataset(dataset);
        Ok(())
    }

    /// Installs an already-built dataset, replacing any previous state.
    pub fn attach_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.analysis = None;
        self.mined = None;
        self.generation += 1;
    }

    /// The loaded dataset.
    pub fn dataset(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or_else(not_loaded)
    }

    /// Whether a dataset has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    /// Whether clustering output is available.
    pub fn is_clustered(&self) -> bool {
        self.analysis.is_some()
    }

    /// Number of beats in the loaded timeline, zero before any load.
    pub fn beat_count(&self) -> usize {
        self.dataset
            .as_ref()
            .map_or(0, |dataset| dataset.timeline().len())
    }

    /// Number of entities in the loaded population, zero before any load.
    pub fn entity_count(&self) -> usize {
        self.dataset
            .as_ref()
            .map_or(0, |dataset| dataset.population().len())
    }

    /// Number of records in the loaded dataset, zero before any load.
    pub fn record_count(&self) -> usize {
        self.dataset
            .as_ref()
            .map_or(0, |dataset| dataset.record_count())
    }

    /// Number of clustered phases, zero before clustering.
    pub fn phase_count(&self) -> usize {
        self.analysis
            .as_ref()
            .map_or(0, |analysis| analysis.phases.len())
    }

    /// Number of clustered groups, zero before clustering.
    pub fn group_count(&self) -> usize {
        self.analysis
            .as_ref()
            .map_or(0, |analysis| analysis.groups.len())
    }

    /// Runs the full clustering pipeline under `config`.
    ///
    /// The configuration is validated first; the resolved measurement
    /// pair feeds both merge passes, which run on parallel threads, and
    /// becomes the projected pair of the fresh view. Mining rules are
    /// taken from the configuration's pattern section. Any previous
    /// clustering output and pattern cache are replaced.
    pub fn cluster(&mut self, config: &AnalysisConfig) -> Result<()> {
        let dataset = self.dataset.as_ref().ok_or_else(not_loaded)?;
        let pair = config.validate_for(dataset)?;

        let beat_values: Vec<BTreeMap<String, f64>> = dataset
            .timeline()
            .iter()
            .map(|beat| dataset.beat_slice(beat.id, pair))
            .collect();
        let series: Vec<BTreeMap<BeatId, f64>> = dataset
            .population()
            .iter()
            .map(|entity| dataset.entity_series(&entity.name, pair))
            .collect();
        let timeline_len = dataset.timeline().len();

        let (phases, groups) = rayon::join(
            || extract_phases(&beat_values, &config.phases),
            || extract_groups(dataset.population(), &series, timeline_len, &config.groups),
        );

        let grid = MeasurementGrid::build(dataset, &phases, &groups)?;
        let view = GridView::project(&grid, pair);
        self.analysis = Some(Analysis {
            phases,
            groups,
            grid,
            view,
            rules: MiningRules::from_settings(&config.patterns),
        });
        self.mined = None;
        self.generation += 1;
        Ok(())
    }

    /// Clustered phases in timeline order.
    pub fn phases(&self) -> Result<&[Phase]> {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.phases.as_slice())
            .ok_or_else(not_clustered)
    }

    /// Clustered groups in renumbered id order.
    pub fn groups(&self) -> Result<&[EntityGroup]> {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.groups.as_slice())
            .ok_or_else(not_clustered)
    }

    /// The assembled grid.
    pub fn grid(&self) -> Result<&MeasurementGrid> {
        self.analysis
            .as_ref()
            .map(|analysis| &analysis.grid)
            .ok_or_else(not_clustered)
    }

    /// The view as currently projected and ordered.
    pub fn current_view(&self) -> Result<&GridView> {
        self.analysis
            .as_ref()
            .map(|analysis| &analysis.view)
            .ok_or_else(not_clustered)
    }

    /// Projects the grid onto `pair` and returns the resulting view.
    ///
    /// Asking for the pair already projected returns the current view
    /// untouched, row order included. A different pair replaces the
    /// view, which restarts in grid row order and invalidates the
    /// pattern cache.
    pub fn view(&mut self, pair: KindPair) -> Result<&GridView> {
        let dataset = self.dataset.as_ref().ok_or_else(not_loaded)?;
        let analysis = self.analysis.as_mut().ok_or_else(not_clustered)?;
        if analysis.view.pair() != pair {
            ensure_selectable(dataset, pair)?;
            analysis.view = GridView::project(&analysis.grid, pair);
            self.generation += 1;
        }
        Ok(&analysis.view)
    }

    /// Reorders the current view's rows in place.
    pub fn sort(&mut self, order: RowOrder) -> Result<()> {
        let analysis = self.analysis.as_mut().ok_or_else(not_clustered)?;
        analysis.view.sort(order);
        Ok(())
    }

    /// Mines the current view, serving the cache when it still applies.
    ///
    /// `kind` restricts the run to one pattern kind; `None` mines all
    /// four. The miner sees a copy of the view sorted by ascending
    /// birth, so ladder geometry is stable no matter how the caller has
    /// sorted the rows.
    pub fn patterns(&mut self, kind: Option<PatternKind>) -> Result<&[Pattern]> {
        self.refresh_patterns(kind)?;
        Ok(self
            .mined
            .as_ref()
            .map(|run| run.patterns.as_slice())
            .unwrap_or(&[]))
    }

    /// Renders the text report of a mining run over the current view.
    ///
    /// The run is refreshed first under the same caching rules as
    /// [`AnalysisSession::patterns`]; the reported time is the measured
    /// duration of the run that filled the cache.
    pub fn pattern_report(&mut self, kind: Option<PatternKind>) -> Result<String> {
        self.refresh_patterns(kind)?;
        let dataset = self.dataset.as_ref().ok_or_else(not_loaded)?;
        let analysis = self.analysis.as_ref().ok_or_else(not_clustered)?;
        let (patterns, seconds) = match &self.mined {
            Some(run) => (run.patterns.as_slice(), run.seconds),
            None => (&[][..], 0.0),
        };
        Ok(report::render(
            dataset.name(),
            patterns,
            analysis.view.rows().len(),
            analysis.phases.len(),
            seconds,
        ))
    }

    fn refresh_patterns(&mut self, kind: Option<PatternKind>) -> Result<()> {
        let analysis = self.analysis.as_ref().ok_or_else(not_clustered)?;
        if let Some(run) = &self.mined {
            if run.kind == kind && run.generation == self.generation {
                return Ok(());
            }
        }
        let mut mining_view = analysis.view.clone();
        mining_view.sort(RowOrder::BirthAscending);
        let started = Instant::now();
        let patterns = mine(&mining_view, &analysis.phases, kind, &analysis.rules);
        self.mined = Some(PatternRun {
            kind,
            generation: self.generation,
            patterns,
            seconds: started.elapsed().as_secs_f64(),
        });
        Ok(())
    }

    /// Splits one cell into per-member contributions.
    ///
    /// Members appear when they produced at least one record in the
    /// phase; their value is the summed contribution to the view's
    /// pair, which may legitimately be zero. An existing group and
    /// phase with no member records yields an empty list, while unknown
    /// ids fail loudly.
    pub fn cell_breakdown(&self, group: GroupId, phase: PhaseId) -> Result<Vec<MemberShare>> {
        let dataset = self.dataset.as_ref().ok_or_else(not_loaded)?;
        let analysis = self.analysis.as_ref().ok_or_else(not_clustered)?;
        let phase = analysis
            .phases
            .iter()
            .find(|candidate| candidate.id() == phase)
            .ok_or_else(|| unknown_phase(phase))?;
        let row = analysis.grid.row(group).ok_or_else(|| unknown_group(group))?;
        let pair = analysis.view.pair();

        let mut shares = Vec::new();
        for member in row.group().members() {
            let mut total = 0.0;
            let mut recorded = false;
            for beat in phase.beats() {
                if let Some(value) = dataset.value_at(&member.name, *beat, pair) {
                    total += value;
                    recorded = true;
                }
            }
            if recorded {
                shares.push(MemberShare {
                    entity: member.name.clone(),
                    value: total,
                });
            }
        }
        Ok(shares)
    }

    /// Writes the dataset and the current view into a project folder.
    pub fn export_project(&self, dir: &Path) -> Result<()> {
        let dataset = self.dataset.as_ref().ok_or_else(not_loaded)?;
        let analysis = self.analysis.as_ref().ok_or_else(not_clustered)?;
        lifegrid_io::export_project(dir, dataset, &analysis.view, &analysis.phases)
    }

    /// Restores a project folder as this workspace's full state.
    ///
    /// The recomputed grid is verified against the stored one before
    /// anything is replaced, so a failed import leaves the previous
    /// state intact. The restored view projects the source format's
    /// default pair; mining rules reset to their defaults since the
    /// project format does not carry a configuration.
    pub fn import_project(&mut self, dir: &Path) -> Result<()> {
        let imported = lifegrid_io::import_project(dir)?;
        lifegrid_io::verify_project(&imported)?;
        let pair = imported.dataset.source().default_selection();
        let view = GridView::project(&imported.grid, pair);
        self.dataset = Some(imported.dataset);
        self.analysis = Some(Analysis {
            phases: imported.phases,
            groups: imported.groups,
            grid: imported.grid,
            view,
            rules: MiningRules::default(),
        });
        self.mined = None;
        self.generation += 1;
        Ok(())
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_selectable(dataset: &Dataset, pair: KindPair) -> Result<()> {
    let available = dataset.source().available_aggregations();
    if available.contains(&pair.aggregation) {
        return Ok(());
    }
    Err(LifegridError::Config(
        ErrorInfo::new(
            "aggregation-unavailable",
            "aggregation kind not provided by this dataset flavor",
        )
        .with_context("value", format!("{:?}", pair.aggregation))
        .with_context("format", format!("{:?}", dataset.source()))
        .with_hint("matrix datasets only carry NONE; transition logs carry the sums"),
    ))
}

fn not_loaded() -> LifegridError {
    LifegridError::Session(
        ErrorInfo::new("no-dataset", "no dataset loaded in this session")
            .with_hint("load a dataset first"),
    )
}

fn not_clustered() -> LifegridError {
    LifegridError::Session(
        ErrorInfo::new("not-clustered", "clustering has not run in this session")
            .with_hint("run cluster before querying the grid or mining patterns"),
    )
}

fn unknown_group(group: GroupId) -> LifegridError {
    LifegridError::Data(
        ErrorInfo::new(
            "unknown-group",
            format!("no group {} in the clustering", group.as_raw()),
        )
        .with_context("group", group.as_raw().to_string()),
    )
}

fn unknown_phase(phase: PhaseId) -> LifegridError {
    LifegridError::Data(
        ErrorInfo::new(
            "unknown-phase",
            format!("no phase {} in the clustering", phase.as_raw()),
        )
        .with_context("phase", phase.as_raw().to_string()),
    )
}
