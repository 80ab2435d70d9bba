use std::cell::Cell;

use tracing::debug;

use crate::config::{AssociationPolicy, MatchConfig};
use crate::corner_extractor::CornerPoint;
use crate::error::{Result, StitchError};
use crate::photo::Photo;

/// A confirmed correspondence: corner `index_a` of the first photo and corner `index_b`
/// of the second photo selected each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    pub index_a: usize,
    pub index_b: usize,
}

impl Match {
    pub fn new(index_a: usize, index_b: usize) -> Self {
        Match { index_a, index_b }
    }

    /// The same correspondence seen from the other photo.
    pub fn swapped(&self) -> Match {
        Match::new(self.index_b, self.index_a)
    }
}

/// A correspondence across a chain of photos: `indices[i]` is a corner of photo `i`, and
/// every consecutive pair of photos agrees on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub indices: Vec<usize>,
}

/// For every corner of a source photo, the target corner it chose (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationTable {
    targets: Vec<Option<usize>>,
}

impl AssociationTable {
    fn new(len: usize) -> Self {
        AssociationTable {
            targets: vec![None; len],
        }
    }

    pub fn get(&self, source: usize) -> Option<usize> {
        self.targets.get(source).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// `true` when `source` chose `target`.
    pub fn agrees(&self, source: usize, target: usize) -> bool {
        self.get(source) == Some(target)
    }
}

/// Matches corners between photos by comparing square pixel patches around them.
///
/// Two corners are associated when the sum of squared differences (SSD) of their patches,
/// over all channels, is below `ssd_threshold`. A pair is only confirmed when the
/// association holds in both directions.
pub struct FeatureMatcher {
    config: MatchConfig,
    /// Number of patch comparisons performed so far.
    total_comparisons: Cell<usize>,
}

impl FeatureMatcher {
    pub fn new(config: MatchConfig) -> Self {
        FeatureMatcher {
            config,
            total_comparisons: Cell::new(0),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Returns the total number of patch comparisons performed by this matcher.
    pub fn get_total_comparisons(&self) -> usize {
        self.total_comparisons.get()
    }

    /// A corner takes part in matching only if it lies at least `window_size + 2` pixels
    /// away from every edge of its photo.
    pub fn is_eligible(&self, photo: &Photo, corner: &CornerPoint) -> bool {
        let margin = self.config.edge_margin();
        corner.x >= margin
            && corner.x < photo.width.saturating_sub(margin)
            && corner.y >= margin
            && corner.y < photo.height.saturating_sub(margin)
    }

    /// Sum of squared differences between the `(2 * window_size + 1)` square patches centred
    /// on `corner_a` and `corner_b`, across all channels.
    ///
    /// Returns `None` when either corner is not eligible in its photo or when the photos have
    /// different channel counts.
    pub fn patch_ssd(
        &self,
        photo_a: &Photo,
        corner_a: &CornerPoint,
        photo_b: &Photo,
        corner_b: &CornerPoint,
    ) -> Option<u64> {
        if photo_a.channels != photo_b.channels
            || !self.is_eligible(photo_a, corner_a)
            || !self.is_eligible(photo_b, corner_b)
        {
            return None;
        }
        self.total_comparisons.set(self.total_comparisons.get() + 1);

        let w = self.config.window_size;
        let channels = photo_a.channels;
        let span = (2 * w + 1) * channels;
        let start_a = (corner_a.x - w) * channels;
        let start_b = (corner_b.x - w) * channels;

        let mut sum = 0u64;
        for dy in 0..=2 * w {
            let row_a = &photo_a.row(corner_a.y - w + dy)[start_a..start_a + span];
            let row_b = &photo_b.row(corner_b.y - w + dy)[start_b..start_b + span];
            for (&va, &vb) in row_a.iter().zip(row_b) {
                let d = va.abs_diff(vb) as u64;
                sum += d * d;
            }
        }
        Some(sum)
    }

    /// Builds the association table from `source` corners to `target` corners.
    ///
    /// Every eligible source corner is compared against every eligible target corner.
    /// Candidates below the SSD threshold are kept according to the configured
    /// [AssociationPolicy].
    pub fn associate(
        &self,
        source: &Photo,
        source_corners: &[CornerPoint],
        target: &Photo,
        target_corners: &[CornerPoint],
    ) -> AssociationTable {
        let mut table = AssociationTable::new(source_corners.len());
        let eligible_targets: Vec<(usize, &CornerPoint)> = target_corners
            .iter()
            .enumerate()
            .filter(|(_, c)| self.is_eligible(target, c))
            .collect();

        for (j, corner) in source_corners.iter().enumerate() {
            if !self.is_eligible(source, corner) {
                continue;
            }

            let mut best: Option<(usize, u64)> = None;
            for &(k, candidate) in &eligible_targets {
                let ssd = match self.patch_ssd(source, corner, target, candidate) {
                    Some(ssd) if (ssd as f64) < self.config.ssd_threshold => ssd,
                    _ => continue,
                };
                best = match (self.config.policy, best) {
                    (AssociationPolicy::MinimumBelowThreshold, Some((_, best_ssd)))
                        if best_ssd <= ssd =>
                    {
                        best
                    }
                    _ => Some((k, ssd)),
                };
            }
            table.targets[j] = best.map(|(k, _)| k);
        }

        debug!(
            "associated {} of {} corners against {} eligible candidates",
            table.targets.iter().filter(|t| t.is_some()).count(),
            source_corners.len(),
            eligible_targets.len()
        );
        table
    }

    /// Finds mutually agreeing corner pairs between two photos.
    ///
    /// Matches are returned in increasing order of `index_a`.
    pub fn match_pair(
        &self,
        photos: [&Photo; 2],
        corners: [&[CornerPoint]; 2],
    ) -> Result<Vec<Match>> {
        let tracks = self.match_chain(&photos, &corners)?;
        Ok(tracks
            .into_iter()
            .map(|track| Match::new(track.indices[0], track.indices[1]))
            .collect())
    }

    /// Generalizes [FeatureMatcher::match_pair] to a chain of photos.
    ///
    /// Association tables are built in both directions for every consecutive pair of photos,
    /// and a [Track] is produced only when every consecutive pair mutually agrees along it.
    /// Tracks are returned in increasing order of their first index.
    pub fn match_chain(
        &self,
        photos: &[&Photo],
        corners: &[&[CornerPoint]],
    ) -> Result<Vec<Track>> {
        if photos.len() < 2 {
            return Err(StitchError::InvalidInput(format!(
                "matching needs at least two photos, got {}",
                photos.len()
            )));
        }
        if photos.len() != corners.len() {
            return Err(StitchError::InvalidInput(format!(
                "{} photos but {} corner lists",
                photos.len(),
                corners.len()
            )));
        }
        let channels = photos[0].channels;
        if let Some(other) = photos.iter().find(|p| p.channels != channels) {
            return Err(StitchError::ChannelMismatch {
                left: channels,
                right: other.channels,
            });
        }

        let links: Vec<(AssociationTable, AssociationTable)> = photos
            .windows(2)
            .zip(corners.windows(2))
            .map(|(p, c)| {
                let forward = self.associate(p[0], c[0], p[1], c[1]);
                let backward = self.associate(p[1], c[1], p[0], c[0]);
                (forward, backward)
            })
            .collect();

        let tracks: Vec<Track> = (0..corners[0].len())
            .filter_map(|start| {
                let mut indices = Vec::with_capacity(photos.len());
                indices.push(start);
                let mut current = start;
                for (forward, backward) in &links {
                    let next = forward.get(current)?;
                    if !backward.agrees(next, current) {
                        return None;
                    }
                    indices.push(next);
                    current = next;
                }
                Some(Track { indices })
            })
            .collect();

        debug!(
            "{} tracks confirmed across {} photos after {} patch comparisons",
            tracks.len(),
            photos.len(),
            self.get_total_comparisons()
        );
        Ok(tracks)
    }
}
