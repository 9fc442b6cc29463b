//! Practice and sequence detection over an agent's encounter history
//!
//! Temporal practices group encounters by extent and day type, cluster
//! them by time of day within `time_tolerance_hours`, and classify each
//! cluster by how regularly it recurs. Sequences mine ordered place-to-place
//! motifs from consecutive stops separated by at most `max_gap_hours`.

use super::link_once;
use crate::config::{ClassificationThresholds, PracticeConfig, SequenceConfig};
use crate::error::{ChoraError, ChoraResult};
use crate::graph::{EdgeType, Node, NodeId, NodeType, PlatialGraph, Provenance};
use crate::model::{DayType, Encounter, Practice, PracticeType, TimeWindow};
use crate::temporal::{days_between, Validity};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

type EncounterRef<'a> = (&'a NodeId, &'a Encounter);

fn hour_of_day(at: DateTime<Utc>) -> f64 {
    at.num_seconds_from_midnight() as f64 / 3600.0
}

fn time_of_day_label(hour: f64) -> &'static str {
    match hour {
        h if h < 5.0 => "night",
        h if h < 12.0 => "morning",
        h if h < 17.0 => "afternoon",
        h if h < 21.0 => "evening",
        _ => "night",
    }
}

/// Dates in `[first, last]` accepted by `keep`
fn count_days(first: NaiveDate, last: NaiveDate, keep: impl Fn(NaiveDate) -> bool) -> usize {
    first.iter_days().take_while(|d| *d <= last).filter(|d| keep(*d)).count()
}

/// The agent's encounters inside the analysis window, in start order
fn windowed<'a>(
    encounters: &[EncounterRef<'a>],
    agent_id: &NodeId,
    window_days: u32,
) -> Vec<EncounterRef<'a>> {
    let mut mine: Vec<EncounterRef<'a>> = encounters
        .iter()
        .copied()
        .filter(|(_, e)| &e.agent_id == agent_id)
        .collect();
    mine.sort_by(|a, b| a.1.start_time.cmp(&b.1.start_time).then_with(|| a.0.cmp(b.0)));

    let Some(latest) = mine.last().map(|(_, e)| e.start_time) else {
        return mine;
    };
    // A window reaching past the representable range keeps everything
    if let Some(cutoff) = latest.checked_sub_signed(Duration::days(i64::from(window_days))) {
        mine.retain(|(_, e)| e.start_time >= cutoff);
    }
    mine
}

/// Encounters that happen at about the same time of day
struct TimeCluster<'a> {
    members: Vec<EncounterRef<'a>>,
    mean_hour: f64,
}

/// Greedy clustering on time of day. A member joins the current cluster
/// while it lies within `tolerance_hours` of the cluster's running mean.
fn cluster_by_time<'a>(mut members: Vec<EncounterRef<'a>>, tolerance_hours: f64) -> Vec<TimeCluster<'a>> {
    members.sort_by(|a, b| {
        hour_of_day(a.1.start_time)
            .total_cmp(&hour_of_day(b.1.start_time))
            .then_with(|| a.0.cmp(b.0))
    });

    let mut clusters: Vec<TimeCluster<'a>> = Vec::new();
    for member in members {
        let hour = hour_of_day(member.1.start_time);
        match clusters.last_mut() {
            Some(cluster) if (hour - cluster.mean_hour).abs() <= tolerance_hours => {
                let n = cluster.members.len() as f64;
                cluster.mean_hour = (cluster.mean_hour * n + hour) / (n + 1.0);
                cluster.members.push(member);
            }
            _ => clusters.push(TimeCluster {
                members: vec![member],
                mean_hour: hour,
            }),
        }
    }
    clusters
}

/// Recurrence statistics for one time cluster
#[derive(Debug, Clone, Copy)]
struct Recurrence {
    count: u32,
    /// Distinct days seen / days of the same day type in the analysis range
    regularity: f64,
    /// Share of the analysis range between the cluster's first and last day
    coverage: f64,
    /// Regularity over the cluster's own span, counting only its weekdays
    narrow_regularity: f64,
    distinct_weekdays: usize,
    spread_hours: f64,
}

fn recurrence(
    cluster: &TimeCluster<'_>,
    day_type: DayType,
    range: (NaiveDate, NaiveDate),
    window: &TimeWindow,
) -> Recurrence {
    let dates: BTreeSet<NaiveDate> = cluster
        .members
        .iter()
        .map(|(_, e)| e.start_time.date_naive())
        .collect();
    let weekdays: HashSet<Weekday> = dates.iter().map(|d| d.weekday()).collect();
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => (range.0, range.0),
    };

    let opportunities = count_days(range.0, range.1, |d| day_type.matches(d)).max(1);
    let narrow_opportunities = count_days(first, last, |d| weekdays.contains(&d.weekday())).max(1);
    let range_days = ((range.1 - range.0).num_days() + 1) as f64;
    let span_days = ((last - first).num_days() + 1) as f64;

    Recurrence {
        count: cluster.members.len() as u32,
        regularity: (dates.len() as f64 / opportunities as f64).min(1.0),
        coverage: (span_days / range_days).min(1.0),
        narrow_regularity: (dates.len() as f64 / narrow_opportunities as f64).min(1.0),
        distinct_weekdays: weekdays.len(),
        spread_hours: window.spread_hours(),
    }
}

/// Pick a class for a cluster, or `None` if it fits none.
///
/// Below the frequent threshold the most specific class wins
/// (ritual, habit, routine); otherwise routine is preferred.
/// Returns the class and the regularity it was judged on.
fn classify(
    stats: &Recurrence,
    thresholds: &ClassificationThresholds,
    tolerance_hours: f64,
) -> Option<(PracticeType, f64)> {
    let fits = |class: PracticeType| match class {
        PracticeType::Routine => {
            stats.regularity >= thresholds.routine_regularity && stats.coverage >= thresholds.routine_coverage
        }
        PracticeType::Habit => {
            stats.regularity >= thresholds.habit_regularity
                && stats.regularity < thresholds.routine_regularity
                && stats.spread_hours <= 2.0 * tolerance_hours
        }
        PracticeType::Ritual => {
            stats.count < thresholds.frequent_threshold
                && stats.narrow_regularity >= thresholds.ritual_regularity
                && stats.distinct_weekdays <= thresholds.ritual_max_weekdays
        }
        PracticeType::Sequence => false,
    };

    let preference = if stats.count < thresholds.frequent_threshold {
        [PracticeType::Ritual, PracticeType::Habit, PracticeType::Routine]
    } else {
        [PracticeType::Routine, PracticeType::Habit, PracticeType::Ritual]
    };
    preference.into_iter().find(|c| fits(*c)).map(|class| {
        let regularity = match class {
            PracticeType::Ritual => stats.narrow_regularity,
            _ => stats.regularity,
        };
        (class, regularity)
    })
}

/// Most frequent non-empty activity, ties broken alphabetically
fn dominant_activity(members: &[EncounterRef<'_>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, e) in members {
        if !e.activity.is_empty() {
            *counts.entry(e.activity.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(activity, _)| activity.to_string())
}

/// Detect routines, habits and rituals in an agent's encounters.
///
/// Only encounters within `time_window_days` of the agent's latest one are
/// considered. Patterns with fewer than `min_occurrences` encounters or a
/// regularity below `min_regularity` are never returned. The nodes are not
/// written; see [`record_practices`].
pub fn detect_practices(
    encounters: &[EncounterRef<'_>],
    agent_id: &NodeId,
    config: &PracticeConfig,
) -> ChoraResult<Vec<Node>> {
    config.validate()?;
    let mine = windowed(encounters, agent_id, config.time_window_days);
    let (Some((_, first)), Some((_, last))) = (mine.first(), mine.last()) else {
        return Ok(Vec::new());
    };
    let range = (first.start_time.date_naive(), last.start_time.date_naive());
    let analysed_at = last.start_time;

    let mut groups: BTreeMap<(NodeId, DayType), Vec<EncounterRef<'_>>> = BTreeMap::new();
    for member in &mine {
        let key = (member.1.extent_id.clone(), DayType::of(member.1.start_time.date_naive()));
        groups.entry(key).or_default().push(*member);
    }

    let mut practices = Vec::new();
    for ((extent_id, day_type), members) in groups {
        for cluster in cluster_by_time(members, config.time_tolerance_hours) {
            if (cluster.members.len() as u32) < config.min_occurrences {
                continue;
            }
            let times = cluster.members.iter().map(|(_, e)| e.start_time.time());
            let (Some(earliest), Some(latest)) = (times.clone().min(), times.max()) else {
                continue;
            };
            let window = TimeWindow::new(earliest, latest);
            let stats = recurrence(&cluster, day_type, range, &window);

            let Some((practice_type, regularity)) =
                classify(&stats, &config.classification, config.time_tolerance_hours)
            else {
                debug!(extent = %extent_id, %day_type, count = stats.count, "cluster fits no practice class");
                continue;
            };
            if regularity < config.min_regularity {
                continue;
            }

            let activity = dominant_activity(&cluster.members);
            let hour_bucket = cluster.mean_hour.round() as u32;
            let mut labels = vec![
                practice_type.to_string(),
                day_type.to_string(),
                time_of_day_label(cluster.mean_hour).to_string(),
            ];
            labels.extend(activity.clone());
            labels.sort();
            labels.dedup();

            let practice = Practice {
                practice_type,
                name: format!(
                    "{} {} {}",
                    day_type,
                    window.label(),
                    activity.as_deref().unwrap_or("visit")
                ),
                agent_id: agent_id.clone(),
                extent_ids: vec![extent_id.clone()],
                regularity,
                frequency: stats.count as f64 / f64::from(config.time_window_days),
                occurrence_count: stats.count,
                time_window: Some(window),
                day_type: Some(day_type),
                labels,
                encounter_ids: cluster.members.iter().map(|(id, _)| (*id).clone()).collect(),
            };

            let signature = NodeId::from_string(format!("{}@{:02}", day_type, hour_bucket));
            let id = NodeId::derived("practice", &[agent_id, &extent_id, &signature]);
            let since = cluster
                .members
                .iter()
                .map(|(_, e)| e.start_time)
                .min()
                .unwrap_or(analysed_at);
            let provenance = Provenance::new("detect_practices", practice.encounter_ids.clone(), analysed_at);
            practices.push(
                Node::with_id(id, practice)
                    .with_validity(Validity::from(since))
                    .with_provenance(provenance),
            );
        }
    }

    info!(agent = %agent_id, encounters = mine.len(), practices = practices.len(), "practice detection");
    Ok(practices)
}

/// A maximal visit to one extent within a trip
struct Stop<'a> {
    extent_id: &'a NodeId,
    encounter_ids: Vec<&'a NodeId>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Split the agent's encounters into trips of consecutive distinct stops
fn trips<'a>(mine: &[EncounterRef<'a>], max_gap_hours: f64) -> Vec<Vec<Stop<'a>>> {
    let mut trips: Vec<Vec<Stop<'a>>> = Vec::new();
    for &(id, e) in mine {
        let gap_hours = trips
            .last()
            .and_then(|trip| trip.last())
            .map(|stop| days_between(stop.end, e.start_time) * 24.0);

        match (trips.last_mut(), gap_hours) {
            (Some(trip), Some(gap)) if gap <= max_gap_hours => match trip.last_mut() {
                Some(stop) if stop.extent_id == &e.extent_id => {
                    stop.encounter_ids.push(id);
                    stop.end = stop.end.max(e.latest_time());
                }
                _ => trip.push(Stop {
                    extent_id: &e.extent_id,
                    encounter_ids: vec![id],
                    start: e.start_time,
                    end: e.latest_time(),
                }),
            },
            _ => trips.push(vec![Stop {
                extent_id: &e.extent_id,
                encounter_ids: vec![id],
                start: e.start_time,
                end: e.latest_time(),
            }]),
        }
    }
    trips
}

#[derive(Default)]
struct MotifTally<'a> {
    support: u32,
    trips: BTreeSet<usize>,
    encounter_ids: Vec<&'a NodeId>,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

/// Mine ordered place-to-place motifs of 2 to `max_motif_len` stops.
///
/// Support counts every occurrence of a motif; regularity is the share of
/// trips long enough to contain it that do contain it.
pub fn detect_sequences(
    encounters: &[EncounterRef<'_>],
    agent_id: &NodeId,
    config: &SequenceConfig,
) -> ChoraResult<Vec<Node>> {
    config.validate()?;
    let mut mine: Vec<EncounterRef<'_>> = encounters
        .iter()
        .copied()
        .filter(|(_, e)| &e.agent_id == agent_id)
        .collect();
    mine.sort_by(|a, b| a.1.start_time.cmp(&b.1.start_time).then_with(|| a.0.cmp(b.0)));
    let trips = trips(&mine, config.max_gap_hours);

    let mut tallies: BTreeMap<Vec<&NodeId>, MotifTally<'_>> = BTreeMap::new();
    for (trip_index, trip) in trips.iter().enumerate() {
        for len in 2..=config.max_motif_len.min(trip.len()) {
            for window in trip.windows(len) {
                let motif: Vec<&NodeId> = window.iter().map(|s| s.extent_id).collect();
                let tally = tallies.entry(motif).or_default();
                tally.support += 1;
                tally.trips.insert(trip_index);
                tally
                    .encounter_ids
                    .extend(window.iter().flat_map(|s| s.encounter_ids.iter().copied()));
                let (start, end) = (window[0].start, window[len - 1].end);
                tally.first = Some(tally.first.map_or(start, |f| f.min(start)));
                tally.last = Some(tally.last.map_or(end, |l| l.max(end)));
            }
        }
    }

    let mut found: Vec<(Vec<&NodeId>, MotifTally<'_>)> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.support >= config.min_support)
        .collect();
    found.sort_by(|a, b| b.1.support.cmp(&a.1.support).then_with(|| a.0.cmp(&b.0)));

    let mut sequences = Vec::with_capacity(found.len());
    for (motif, tally) in found {
        let eligible = trips.iter().filter(|t| t.len() >= motif.len()).count().max(1);
        let (Some(first), Some(last)) = (tally.first, tally.last) else {
            continue;
        };
        let span_days = days_between(first, last).max(1.0);

        let mut seen = HashSet::new();
        let encounter_ids: Vec<NodeId> = tally
            .encounter_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        let extent_ids: Vec<NodeId> = motif.into_iter().cloned().collect();
        let stops = extent_ids.len();
        let practice = Practice {
            practice_type: PracticeType::Sequence,
            name: extent_ids
                .iter()
                .map(NodeId::as_str)
                .collect::<Vec<_>>()
                .join(" -> "),
            agent_id: agent_id.clone(),
            extent_ids,
            regularity: tally.trips.len() as f64 / eligible as f64,
            frequency: f64::from(tally.support) / span_days,
            occurrence_count: tally.support,
            time_window: None,
            day_type: None,
            labels: vec![
                PracticeType::Sequence.to_string(),
                format!("stops-{}", stops),
            ],
            encounter_ids,
        };

        let mut parts: Vec<&NodeId> = vec![agent_id];
        parts.extend(practice.extent_ids.iter());
        let id = NodeId::derived("sequence", &parts);
        let provenance = Provenance::new("detect_sequences", practice.encounter_ids.clone(), last);
        sequences.push(
            Node::with_id(id, practice)
                .with_validity(Validity::from(first))
                .with_provenance(provenance),
        );
    }

    info!(agent = %agent_id, trips = trips.len(), sequences = sequences.len(), "sequence detection");
    Ok(sequences)
}

/// Write detected practices and link their encounters with BELONGS_TO.
///
/// Practices are upserted by their deterministic id. Any of the agent's
/// still-active practices that were not re-detected are soft-deleted by
/// closing their validity at `at`.
pub fn record_practices(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    practices: Vec<Node>,
    at: DateTime<Utc>,
) -> ChoraResult<Vec<NodeId>> {
    let mut recorded = Vec::with_capacity(practices.len());
    for node in practices {
        let Some(practice) = node.as_practice() else {
            return Err(ChoraError::KindMismatch {
                id: node.id.clone(),
                expected: NodeType::Practice,
                found: node.node_type(),
            });
        };
        let members = practice.encounter_ids.clone();
        let weight = practice.regularity;
        let id = graph.upsert_node(node)?;
        for encounter_id in members.iter().filter(|e| graph.has_node(e)).cloned().collect::<Vec<_>>() {
            link_once(graph, &encounter_id, &id, EdgeType::BelongsTo, weight)?;
        }
        recorded.push(id);
    }

    let current: HashSet<&NodeId> = recorded.iter().collect();
    let stale: Vec<(NodeId, DateTime<Utc>)> = graph
        .nodes(Some(NodeType::Practice), None)
        .filter(|n| !current.contains(&n.id))
        .filter(|n| n.as_practice().is_some_and(|p| &p.agent_id == agent_id))
        .filter(|n| n.validity.map_or(true, |v| v.is_active()))
        .map(|n| (n.id.clone(), n.validity.map_or(at, |v| v.start.max(at))))
        .collect();
    for (id, end) in &stale {
        debug!(practice = %id, "practice no longer detected, closing");
        graph.close_validity(id, *end)?;
    }

    info!(agent = %agent_id, recorded = recorded.len(), retired = stale.len(), "practices recorded");
    Ok(recorded)
}

/// Run both detectors over the agent's stored encounters and record the result
pub fn derive_practices(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    practice_config: &PracticeConfig,
    sequence_config: &SequenceConfig,
) -> ChoraResult<Vec<NodeId>> {
    let (detected, at) = {
        let encounters = graph.encounters_for(agent_id, None);
        let Some(at) = encounters.iter().map(|(_, e)| e.latest_time()).max() else {
            return Ok(Vec::new());
        };
        let mut detected = detect_practices(&encounters, agent_id, practice_config)?;
        detected.extend(detect_sequences(&encounters, agent_id, sequence_config)?);
        (detected, at)
    };
    record_practices(graph, agent_id, detected, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, SpatialExtent};
    use chrono::TimeZone;

    // June 2024: the 3rd is a Monday
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    fn seeded(extents: &[&str]) -> (PlatialGraph, NodeId) {
        let mut g = PlatialGraph::new("practices");
        let alice = g
            .add_node(Node::with_id("alice".into(), Agent::individual("Alice")))
            .unwrap();
        for name in extents {
            g.add_node(Node::with_id((*name).into(), SpatialExtent::named(*name)))
                .unwrap();
        }
        (g, alice)
    }

    fn visit(g: &mut PlatialGraph, agent: &NodeId, extent: &str, start: DateTime<Utc>, minutes: i64) -> NodeId {
        let enc = Encounter::new(agent.clone(), extent.into(), start)
            .lasting(Duration::minutes(minutes))
            .unwrap();
        g.add_node(Node::new(enc)).unwrap()
    }

    fn stats(count: u32, regularity: f64, narrow: f64, weekdays: usize) -> Recurrence {
        Recurrence {
            count,
            regularity,
            coverage: 1.0,
            narrow_regularity: narrow,
            distinct_weekdays: weekdays,
            spread_hours: 0.5,
        }
    }

    #[test]
    fn infrequent_patterns_prefer_the_more_specific_class() {
        let t = ClassificationThresholds::default();
        // Valid as ritual and as habit
        let (class, regularity) = classify(&stats(3, 0.6, 1.0, 1), &t, 1.0).unwrap();
        assert_eq!(class, PracticeType::Ritual);
        assert_eq!(regularity, 1.0);
        // Valid as ritual and as routine
        assert_eq!(classify(&stats(4, 0.9, 0.9, 1), &t, 1.0).unwrap().0, PracticeType::Ritual);
    }

    #[test]
    fn frequent_patterns_prefer_routine() {
        let t = ClassificationThresholds::default();
        assert_eq!(classify(&stats(10, 0.9, 0.9, 1), &t, 1.0).unwrap().0, PracticeType::Routine);
        assert_eq!(classify(&stats(10, 0.5, 0.5, 5), &t, 1.0).unwrap().0, PracticeType::Habit);
        assert!(classify(&stats(10, 0.1, 0.1, 5), &t, 1.0).is_none());
    }

    #[test]
    fn clustering_follows_the_running_mean() {
        let (mut g, alice) = seeded(&["gym"]);
        for (day, hour) in [(3, 7), (4, 8), (5, 18)] {
            visit(&mut g, &alice, "gym", at(day, hour, 0), 30);
        }
        let encounters = g.encounters_for(&alice, None);
        let clusters = cluster_by_time(encounters, 1.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members.len(), 2);
        assert!((clusters[0].mean_hour - 7.5).abs() < 1e-12);
    }

    #[test]
    fn five_weekday_mornings_are_a_routine() {
        let (mut g, alice) = seeded(&["office"]);
        for day in 3..=7 {
            visit(&mut g, &alice, "office", at(day, 8, 0), 480);
        }
        let config = PracticeConfig {
            time_tolerance_hours: 2.0,
            ..PracticeConfig::default()
        };
        let found = detect_practices(&g.encounters_for(&alice, None), &alice, &config).unwrap();
        assert_eq!(found.len(), 1);
        let practice = found[0].as_practice().unwrap();
        assert_eq!(practice.practice_type, PracticeType::Routine);
        assert_eq!(practice.occurrence_count, 5);
        assert_eq!(practice.regularity, 1.0);
        assert_eq!(practice.day_type, Some(DayType::Weekday));
        assert!(practice.labels.contains(&"morning".to_string()));
    }

    #[test]
    fn unbounded_window_keeps_the_whole_history() {
        let (mut g, alice) = seeded(&["office"]);
        for day in 3..=7 {
            visit(&mut g, &alice, "office", at(day, 8, 0), 480);
        }
        let config = PracticeConfig {
            time_window_days: u32::MAX,
            time_tolerance_hours: 2.0,
            ..PracticeConfig::default()
        };
        let found = detect_practices(&g.encounters_for(&alice, None), &alice, &config).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_practice().unwrap().occurrence_count, 5);
    }

    #[test]
    fn too_few_occurrences_are_never_reported() {
        let (mut g, alice) = seeded(&["office"]);
        for day in 3..=4 {
            visit(&mut g, &alice, "office", at(day, 8, 0), 60);
        }
        let found = detect_practices(&g.encounters_for(&alice, None), &alice, &PracticeConfig::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn sequences_count_support_per_motif() {
        let (mut g, alice) = seeded(&["home", "cafe", "office"]);
        for day in 3..=5 {
            visit(&mut g, &alice, "home", at(day, 7, 0), 30);
            visit(&mut g, &alice, "cafe", at(day, 7, 45), 20);
            visit(&mut g, &alice, "office", at(day, 8, 30), 480);
        }
        let found = detect_sequences(&g.encounters_for(&alice, None), &alice, &SequenceConfig::default()).unwrap();

        let motifs: Vec<(String, u32)> = found
            .iter()
            .map(|n| {
                let p = n.as_practice().unwrap();
                (p.name.clone(), p.occurrence_count)
            })
            .collect();
        assert!(motifs.contains(&("home -> cafe".to_string(), 3)));
        assert!(motifs.contains(&("cafe -> office".to_string(), 3)));
        assert!(motifs.contains(&("home -> cafe -> office".to_string(), 3)));
        assert!(found
            .iter()
            .all(|n| n.as_practice().unwrap().practice_type == PracticeType::Sequence));
        assert!(found.iter().all(|n| n.as_practice().unwrap().regularity == 1.0));
    }

    #[test]
    fn repeated_stops_collapse_and_long_gaps_split_trips() {
        let (mut g, alice) = seeded(&["home", "park"]);
        visit(&mut g, &alice, "home", at(3, 7, 0), 30);
        visit(&mut g, &alice, "home", at(3, 7, 40), 10);
        visit(&mut g, &alice, "park", at(3, 8, 0), 30);
        // Next day: far beyond the gap
        visit(&mut g, &alice, "park", at(4, 12, 0), 30);

        let encounters = g.encounters_for(&alice, None);
        let trips = trips(&encounters, 3.0);
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].len(), 2);
        assert_eq!(trips[0][0].encounter_ids.len(), 2);
    }

    #[test]
    fn rederiving_is_stable_and_links_members() {
        let (mut g, alice) = seeded(&["office"]);
        for day in 3..=7 {
            visit(&mut g, &alice, "office", at(day, 8, 0), 480);
        }
        let pc = PracticeConfig::default();
        let sc = SequenceConfig::default();
        let first = derive_practices(&mut g, &alice, &pc, &sc).unwrap();
        let second = derive_practices(&mut g, &alice, &pc, &sc).unwrap();
        assert_eq!(first, second);
        assert_eq!(g.count(NodeType::Practice), 1);
        assert_eq!(g.incoming(&first[0], Some(EdgeType::BelongsTo)).count(), 5);
    }
}
