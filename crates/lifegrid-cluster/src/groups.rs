//! All-pairs agglomerative clustering of entities into groups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lifegrid_core::{
    BeatId, Entity, ErrorInfo, GroupId, GroupSettings, LifeSpan, LifegridError, Result,
};

use crate::distance;

/// A merged set of entities produced by entity grouping.
///
/// Members keep merge order: the absorbing group's members come first, the
/// absorbed group's are appended. The member list is never empty, and every
/// entity of the population belongs to exactly one final group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    id: GroupId,
    members: Vec<Entity>,
    life: LifeSpan,
}

impl EntityGroup {
    fn singleton(index: usize, entity: &Entity) -> Self {
        Self {
            id: GroupId::from_raw(index as u32),
            members: vec![entity.clone()],
            life: entity.life,
        }
    }

    /// Builds a group from an explicit id and member list, deriving the
    /// composite lifetime. Used when reconstructing clustering output from
    /// exported text.
    pub fn from_members(id: GroupId, members: Vec<Entity>) -> Result<Self> {
        let mut iter = members.iter();
        let first = iter.next().ok_or_else(|| {
            LifegridError::Data(
                ErrorInfo::new("empty-group", "entity group must have at least one member")
                    .with_context("group", id.as_raw().to_string()),
            )
        })?;
        let mut life = first.life;
        for member in iter {
            life.absorb(&member.life);
        }
        Ok(Self { id, members, life })
    }

    /// Group identifier (final ids are the 0-based renumbering).
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Members in merge order.
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Name of the first member, which represents the group in patterns.
    pub fn first_member_name(&self) -> &str {
        &self.members[0].name
    }

    /// Composite lifetime: min birth, max recorded death, alive when any
    /// member is.
    pub fn life(&self) -> &LifeSpan {
        &self.life
    }

    fn absorb(&mut self, other: EntityGroup) {
        self.members.extend(other.members);
        self.life.absorb(&other.life);
    }
}

/// Merges a population into `settings.count` groups.
///
/// `series` holds, per entity in population order, the beat→value map of the
/// selected measurement stream. Every unordered pair is scored each
/// iteration by blending birth, death, and value-change distances with the
/// configured weights; the strictly closest pair merges, lowest
/// (outer, inner) indices winning ties, the outer group absorbing the inner
/// one. Callers validate `1 ≤ settings.count ≤ population.len()` up front.
pub fn extract_groups(
    population: &[Entity],
    series: &[BTreeMap<BeatId, f64>],
    timeline_len: usize,
    settings: &GroupSettings,
) -> Vec<EntityGroup> {
    let mut groups: Vec<EntityGroup> = population
        .iter()
        .enumerate()
        .map(|(index, entity)| EntityGroup::singleton(index, entity))
        .collect();
    let mut values: Vec<BTreeMap<BeatId, f64>> = series.to_vec();

    while groups.len() > settings.count {
        let (outer, inner) = closest_pair(&groups, &values, timeline_len, settings);
        merge_pair(&mut groups, &mut values, outer, inner);
    }

    for (index, group) in groups.iter_mut().enumerate() {
        group.id = GroupId::from_raw(index as u32);
    }
    groups
}

fn closest_pair(
    groups: &[EntityGroup],
    values: &[BTreeMap<BeatId, f64>],
    timeline_len: usize,
    settings: &GroupSettings,
) -> (usize, usize) {
    let mut best = (1usize, 0usize);
    let mut min_distance = f64::MAX;
    for i in 1..groups.len() {
        for j in 0..i {
            let blended = pair_distance(
                &groups[i],
                &groups[j],
                &values[i],
                &values[j],
                timeline_len,
                settings,
            );
            if blended < min_distance {
                min_distance = blended;
                best = (i, j);
            }
        }
    }
    best
}

fn pair_distance(
    a: &EntityGroup,
    b: &EntityGroup,
    values_a: &BTreeMap<BeatId, f64>,
    values_b: &BTreeMap<BeatId, f64>,
    timeline_len: usize,
    settings: &GroupSettings,
) -> f64 {
    let birth = distance::birth_distance(a.life.birth, b.life.birth, timeline_len);
    let death = distance::death_distance(a.life.death, b.life.death, timeline_len);
    let changes = distance::asymmetric_euclidean(values_a, values_b);
    settings.birth_weight * birth + settings.death_weight * death + settings.changes_weight * changes
}

fn merge_pair(
    groups: &mut Vec<EntityGroup>,
    values: &mut Vec<BTreeMap<BeatId, f64>>,
    outer: usize,
    inner: usize,
) {
    let absorbed = groups.remove(inner);
    let absorbed_values = values.remove(inner);
    // inner < outer, so the outer slot shifted down by one.
    let target = outer - 1;
    groups[target].absorb(absorbed);
    let merged = &mut values[target];
    for (beat, value) in absorbed_values {
        *merged.entry(beat).or_insert(0.0) += value;
    }
}
