//! Tiered nearest-match search over a [`Catalog`]
//!
//! Tiers, first non-empty one wins:
//!
//! 0. exact match
//! 1. same width, height and depth, nearest refresh rate
//! 2. same width and height, nearest depth
//! 3. same aspect ratio, nearest pixel count
//! 4. nearest aspect ratio, then nearest pixel count
//!
//! Every "nearest" step uses [`nearest_by_key`], where a tie goes to the
//! candidate above the target.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::catalog::Catalog;
use super::mode::{AspectRatio, DisplayMode, RatioDistance, RefreshRate};
use super::query::{HidpiPolicy, Query};

/// A value the matcher can measure distances on
pub trait NearestKey: Ord + Copy {
    type Distance: Ord;

    fn distance(self, target: Self) -> Self::Distance;
}

impl NearestKey for u32 {
    type Distance = u32;

    fn distance(self, target: Self) -> u32 {
        self.abs_diff(target)
    }
}

impl NearestKey for u64 {
    type Distance = u64;

    fn distance(self, target: Self) -> u64 {
        self.abs_diff(target)
    }
}

impl NearestKey for RefreshRate {
    type Distance = u32;

    fn distance(self, target: Self) -> u32 {
        self.millihertz().abs_diff(target.millihertz())
    }
}

impl NearestKey for AspectRatio {
    type Distance = RatioDistance;

    fn distance(self, target: Self) -> RatioDistance {
        AspectRatio::distance(self, target)
    }
}

/// Pick the candidate whose key is nearest `target`.
///
/// Candidates are walked in descending key order. `upper` is the last one
/// seen above the target, `lower` the first at or below it. The lower one
/// wins only when strictly closer, so ties go to `upper`. Among equal keys
/// the input order decides.
pub fn nearest_by_key<T, K, F>(
    candidates: impl IntoIterator<Item = T>,
    key: F,
    target: K,
) -> Option<T>
where
    K: NearestKey,
    F: Fn(&T) -> K,
{
    let mut sorted: Vec<T> = candidates.into_iter().collect();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));

    let mut upper = None;
    let mut lower = None;
    for item in sorted {
        if key(&item) > target {
            upper = Some(item);
        } else {
            lower = Some(item);
            break;
        }
    }

    match (lower, upper) {
        (Some(lower), Some(upper)) => {
            if key(&lower).distance(target) < key(&upper).distance(target) {
                Some(lower)
            } else {
                Some(upper)
            }
        }
        (lower, upper) => lower.or(upper),
    }
}

/// Search stage that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Exact,
    NearestRefresh,
    NearestDepth,
    SameRatio,
    NearestRatio,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchTier::Exact => "exact match",
            MatchTier::NearestRefresh => "same resolution and depth, nearest refresh rate",
            MatchTier::NearestDepth => "same resolution, nearest depth",
            MatchTier::SameRatio => "same aspect ratio, nearest pixel count",
            MatchTier::NearestRatio => "nearest aspect ratio and pixel count",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeMatch<'a> {
    pub mode: &'a DisplayMode,
    pub tier: MatchTier,
}

/// Exact lookup on width, height, depth and refresh. The policy decides
/// whether scaled modes take part; a mode with the query's own scale wins
/// over one that differs only in scale.
pub fn find_exact<'a>(catalog: &'a Catalog, query: &Query) -> Option<&'a DisplayMode> {
    let admitted = || catalog.iter().filter(|mode| query.policy().admits(mode));
    admitted()
        .find(|mode| query.is_exactly(mode))
        .or_else(|| admitted().find(|mode| query.same_setting(mode)))
}

/// Find the closest supported mode to `query`. `None` only when no mode is
/// admitted by the query's HiDPI policy.
pub fn find_match<'a>(catalog: &'a Catalog, query: &Query) -> Option<ModeMatch<'a>> {
    let admitted: Vec<&DisplayMode> = catalog
        .iter()
        .filter(|mode| query.policy().admits(mode))
        .collect();

    if let Some(mode) = admitted.iter().copied().find(|mode| query.is_exactly(mode)) {
        return Some(ModeMatch {
            mode,
            tier: MatchTier::Exact,
        });
    }

    let same_size =
        |mode: &&DisplayMode| mode.width == query.width() && mode.height == query.height();

    let same_depth: Vec<&DisplayMode> = admitted
        .iter()
        .copied()
        .filter(same_size)
        .filter(|mode| mode.bit_depth.bits() == query.depth())
        .collect();
    if !same_depth.is_empty() {
        return nearest_by_key(same_depth, |mode| mode.refresh, query.refresh()).map(|mode| {
            ModeMatch {
                mode,
                tier: MatchTier::NearestRefresh,
            }
        });
    }

    let resolution: Vec<&DisplayMode> = admitted.iter().copied().filter(same_size).collect();
    if !resolution.is_empty() {
        return nearest_by_key(resolution, |mode| mode.bit_depth.bits(), query.depth()).map(
            |mode| ModeMatch {
                mode,
                tier: MatchTier::NearestDepth,
            },
        );
    }

    let ratio = query.ratio();
    let same_ratio: Vec<&DisplayMode> = admitted
        .iter()
        .copied()
        .filter(|mode| mode.ratio() == ratio)
        .collect();
    if !same_ratio.is_empty() {
        return nearest_by_key(same_ratio, |mode| mode.pixel_count(), query.pixel_count()).map(
            |mode| ModeMatch {
                mode,
                tier: MatchTier::SameRatio,
            },
        );
    }

    let ratios: BTreeSet<AspectRatio> = admitted.iter().map(|mode| mode.ratio()).collect();
    let ideal = nearest_by_key(ratios, |r| *r, ratio)?;
    let closest_ratio: Vec<&DisplayMode> = admitted
        .iter()
        .copied()
        .filter(|mode| mode.ratio() == ideal)
        .collect();

    nearest_by_key(closest_ratio, |mode| mode.pixel_count(), query.pixel_count()).map(|mode| {
        ModeMatch {
            mode,
            tier: MatchTier::NearestRatio,
        }
    })
}

/// Highest mode admitted by `policy`; the catalog's canonical order already
/// puts it first.
pub fn find_highest(catalog: &Catalog, policy: HidpiPolicy) -> Option<&DisplayMode> {
    catalog.iter().find(|mode| policy.admits(mode))
}
