//! Population summaries computed from recorded rows.
//!
//! Only frames on the sampling interval (normally the ecosystem timestep)
//! are considered. Between the first and last sampled frame every interval
//! gets an entry, and every kind seen anywhere in the run gets a count in
//! every entry, zero when absent.

use std::collections::{BTreeMap, BTreeSet};

use habitat_types::{AgentKind, Season, SnapshotRow};
use serde::Serialize;
use tracing::info;

use crate::clock::seconds_at;

/// Head counts on one sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameCounts {
    /// The frame (tick).
    pub frame: u64,
    /// Simulated seconds at this frame.
    pub seconds: f64,
    /// Season active on this frame, for seasonal runs.
    pub season: Option<Season>,
    /// Agents per kind.
    pub counts: BTreeMap<AgentKind, u32>,
}

/// Mean population of one kind over the sampled frames of one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonMean {
    /// The kind.
    pub kind: AgentKind,
    /// The season.
    pub season: Season,
    /// Mean head count.
    pub mean: f64,
    /// Number of frames averaged.
    pub frames: u32,
}

/// Population over time plus per-season means.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationReport {
    /// Sampled frames in ascending order.
    pub frames: Vec<FrameCounts>,
    /// Means per `(kind, season)`, ordered by kind then season.
    pub season_means: Vec<SeasonMean>,
}

impl PopulationReport {
    /// Summarize `rows` on frames divisible by `sample_interval` (0 is
    /// treated as 1).
    pub fn from_rows(rows: &[SnapshotRow], sample_interval: u64, frames_per_second: u32) -> Self {
        let interval = sample_interval.max(1);
        let sampled = rows
            .iter()
            .filter(|row| matches!(row.frame.checked_rem(interval), Some(0)));

        let mut kinds = BTreeSet::new();
        let mut by_frame: BTreeMap<u64, (Option<Season>, BTreeMap<AgentKind, u32>)> =
            BTreeMap::new();
        for row in sampled {
            kinds.insert(row.kind);
            let (season, counts) = by_frame.entry(row.frame).or_default();
            if season.is_none() {
                *season = row.season;
            }
            let count = counts.entry(row.kind).or_insert(0);
            *count = count.saturating_add(1);
        }

        let (Some(&first), Some(&last)) = (by_frame.keys().next(), by_frame.keys().next_back())
        else {
            return Self::default();
        };

        let mut frames = Vec::new();
        let mut frame = first;
        while frame <= last {
            let (season, observed) = by_frame.remove(&frame).unwrap_or_default();
            let counts = kinds
                .iter()
                .map(|kind| (*kind, observed.get(kind).copied().unwrap_or(0)))
                .collect();
            frames.push(FrameCounts {
                frame,
                seconds: seconds_at(frame, frames_per_second),
                season,
                counts,
            });
            let Some(next) = frame.checked_add(interval) else {
                break;
            };
            frame = next;
        }

        let season_means = season_means(&frames, &kinds);
        Self {
            frames,
            season_means,
        }
    }

    /// Counts on the last sampled frame.
    pub fn final_counts(&self) -> Option<&BTreeMap<AgentKind, u32>> {
        self.frames.last().map(|f| &f.counts)
    }

    /// The frame and size of the largest sampled population of `kind`.
    pub fn peak(&self, kind: AgentKind) -> Option<(u64, u32)> {
        self.frames
            .iter()
            .filter_map(|f| f.counts.get(&kind).map(|c| (f.frame, *c)))
            .max_by_key(|(frame, count)| (*count, core::cmp::Reverse(*frame)))
    }

    /// Log the final counts, peaks and season means at `info`.
    pub fn log(&self) {
        if let Some(counts) = self.final_counts() {
            for (kind, count) in counts {
                let peak = self.peak(*kind);
                info!(
                    kind = %kind,
                    final_count = count,
                    peak = peak.map(|(_, c)| c),
                    peak_frame = peak.map(|(f, _)| f),
                    "Population summary"
                );
            }
        }
        for mean in &self.season_means {
            info!(
                kind = %mean.kind,
                season = %mean.season,
                mean = mean.mean,
                frames = mean.frames,
                "Mean population per season"
            );
        }
    }
}

fn season_means(frames: &[FrameCounts], kinds: &BTreeSet<AgentKind>) -> Vec<SeasonMean> {
    let mut sums: BTreeMap<(AgentKind, Season), (f64, u32)> = BTreeMap::new();
    for frame in frames {
        let Some(season) = frame.season else {
            continue;
        };
        for kind in kinds {
            let count = frame.counts.get(kind).copied().unwrap_or(0);
            let (sum, n) = sums.entry((*kind, season)).or_insert((0.0, 0));
            *sum += f64::from(count);
            *n = n.saturating_add(1);
        }
    }
    sums.into_iter()
        .map(|((kind, season), (sum, n))| SeasonMean {
            kind,
            season,
            mean: sum / f64::from(n.max(1)),
            frames: n,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use habitat_types::AgentId;

    use super::*;

    fn row(frame: u64, id: u64, kind: AgentKind, season: Option<Season>) -> SnapshotRow {
        SnapshotRow {
            frame,
            id: AgentId::new(id),
            x: 0.0,
            y: 0.0,
            kind,
            state: "alive".to_owned(),
            season,
            on_site_id: None,
        }
    }

    #[test]
    fn off_interval_frames_are_ignored_and_gaps_padded() {
        let summer = Some(Season::Summer);
        let rows = vec![
            row(6, 1, AgentKind::Prey, summer),
            row(6, 2, AgentKind::Prey, summer),
            row(6, 3, AgentKind::Predator, summer),
            row(7, 1, AgentKind::Prey, summer),
            row(18, 1, AgentKind::Prey, summer),
        ];
        let report = PopulationReport::from_rows(&rows, 6, 60);
        let frames: Vec<u64> = report.frames.iter().map(|f| f.frame).collect();
        assert_eq!(frames, vec![6, 12, 18]);

        let at_6 = &report.frames[0].counts;
        assert_eq!(at_6.get(&AgentKind::Prey), Some(&2));
        assert_eq!(at_6.get(&AgentKind::Predator), Some(&1));

        let at_12 = &report.frames[1].counts;
        assert_eq!(at_12.get(&AgentKind::Prey), Some(&0));
        assert_eq!(report.frames[1].season, None);

        let last = report.final_counts().unwrap();
        assert_eq!(last.get(&AgentKind::Predator), Some(&0));
        assert!((report.frames[2].seconds - 0.3).abs() < 1e-12);
    }

    #[test]
    fn season_means_average_sampled_frames() {
        let rows = vec![
            row(6, 1, AgentKind::Grass, Some(Season::Summer)),
            row(6, 2, AgentKind::Grass, Some(Season::Summer)),
            row(12, 1, AgentKind::Grass, Some(Season::Summer)),
            row(18, 1, AgentKind::Grass, Some(Season::Winter)),
        ];
        let report = PopulationReport::from_rows(&rows, 6, 60);
        assert_eq!(report.season_means.len(), 2);
        let summer = &report.season_means[0];
        assert_eq!(summer.season, Season::Summer);
        assert_eq!(summer.mean, 1.5);
        assert_eq!(summer.frames, 2);
        assert_eq!(report.season_means[1].mean, 1.0);
    }

    #[test]
    fn peak_prefers_earliest_maximum() {
        let rows = vec![
            row(1, 1, AgentKind::Prey, None),
            row(2, 1, AgentKind::Prey, None),
            row(2, 2, AgentKind::Prey, None),
            row(3, 1, AgentKind::Prey, None),
            row(3, 2, AgentKind::Prey, None),
        ];
        let report = PopulationReport::from_rows(&rows, 1, 60);
        assert_eq!(report.peak(AgentKind::Prey), Some((2, 2)));
        assert_eq!(report.peak(AgentKind::Grass), None);
        assert!(report.season_means.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_report() {
        let report = PopulationReport::from_rows(&[], 6, 60);
        assert!(report.frames.is_empty());
        assert!(report.final_counts().is_none());
    }
}
