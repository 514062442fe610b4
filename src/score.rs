use crate::config::{ScoreWeights, TextThresholds};
use crate::time::{Status, TimeInterval};
use crate::timeline::MemberTimeline;
use core::fmt;
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coarse bucket of an availability score, rendered in the client's language.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AvailabilityLevel {
    Full,
    Mostly,
    Partial,
    Difficult,
}

impl AvailabilityLevel {
    /// Buckets `score` using the lower bounds in `thresholds`
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::config::TextThresholds;
    /// use schedly_libs::score::AvailabilityLevel;
    ///
    /// let thresholds = TextThresholds::default();
    ///
    /// assert_eq!(AvailabilityLevel::from_score(0.9, &thresholds), AvailabilityLevel::Full);
    /// assert_eq!(AvailabilityLevel::from_score(0.75, &thresholds), AvailabilityLevel::Mostly);
    /// assert_eq!(AvailabilityLevel::from_score(0.3, &thresholds), AvailabilityLevel::Partial);
    /// assert_eq!(AvailabilityLevel::from_score(0.29, &thresholds), AvailabilityLevel::Difficult);
    /// ```
    pub fn from_score(score: f64, thresholds: &TextThresholds) -> AvailabilityLevel {
        if score >= thresholds.full {
            AvailabilityLevel::Full
        } else if score >= thresholds.mostly {
            AvailabilityLevel::Mostly
        } else if score >= thresholds.partial {
            AvailabilityLevel::Partial
        } else {
            AvailabilityLevel::Difficult
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityLevel::Full => "모두 가능",
            AvailabilityLevel::Mostly => "대부분 가능",
            AvailabilityLevel::Partial => "일부 가능",
            AvailabilityLevel::Difficult => "어려움",
        }
    }
}

impl fmt::Display for AvailabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotScore {
    pub slot: TimeInterval,
    pub availability_score: f64,
    /// Dominant status per member, in membership order.
    pub member_labels: Vec<(String, Status)>,
    /// Members whose dominant status is anything but BUSY.
    pub available_members: usize,
    pub level: AvailabilityLevel,
}

impl SlotScore {
    pub fn availability_text(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn status_of(&self, member_id: &str) -> Option<Status> {
        self.member_labels
            .iter()
            .find(|(id, _)| id == member_id)
            .map(|&(_, status)| status)
    }
}

/// How many members hold each dominant status in a slot.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct StatusTally {
    pub busy: usize,
    pub unspecified: usize,
    pub available: usize,
    pub preferred: usize,
}

impl StatusTally {
    pub fn from_statuses<I>(statuses: I) -> StatusTally
    where
        I: IntoIterator<Item = Status>,
    {
        statuses
            .into_iter()
            .fold(StatusTally::default(), |mut tally, status| {
                match status {
                    Status::Busy => tally.busy += 1,
                    Status::Unspecified => tally.unspecified += 1,
                    Status::Available => tally.available += 1,
                    Status::Preferred => tally.preferred += 1,
                }
                tally
            })
    }

    pub fn members(&self) -> usize {
        self.busy + self.unspecified + self.available + self.preferred
    }

    /// Mean member weight, summed per status in a fixed order so the result
    /// only depends on the counts, never on the order of the members.
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::config::ScoreWeights;
    /// use schedly_libs::score::StatusTally;
    /// use schedly_libs::time::Status::{Available, Preferred};
    ///
    /// let weights = ScoreWeights::default();
    /// let a = StatusTally::from_statuses(vec![Preferred, Preferred, Available, Available]);
    /// let b = StatusTally::from_statuses(vec![Available, Preferred, Available, Preferred]);
    ///
    /// assert_eq!(a, b);
    /// assert_eq!(a.mean(&weights), 0.9);
    /// ```
    pub fn mean(&self, weights: &ScoreWeights) -> f64 {
        let members = self.members();
        if members == 0 {
            return 0.0;
        }

        let total = self.busy as f64 * weights.busy
            + self.unspecified as f64 * weights.unspecified
            + self.available as f64 * weights.available
            + self.preferred as f64 * weights.preferred;

        (total / members as f64).clamp(0.0, 1.0)
    }
}

/// Scores `slot` against every member timeline.
///
/// The score is the mean of each member's weight for their dominant status
/// in the slot. Members without any entries still count, as UNSPECIFIED.
/// Returns `None` for an empty group since the mean is undefined.
pub fn score_slot(
    slot: TimeInterval,
    timelines: &[MemberTimeline],
    weights: &ScoreWeights,
    thresholds: &TextThresholds,
) -> Option<SlotScore> {
    if timelines.is_empty() {
        return None;
    }

    let member_labels = timelines
        .iter()
        .map(|timeline| {
            (
                timeline.member_id().to_string(),
                timeline.dominant_status(slot),
            )
        })
        .collect::<Vec<_>>();

    let tally = StatusTally::from_statuses(member_labels.iter().map(|&(_, status)| status));
    let availability_score = tally.mean(weights);
    let available_members = tally.members() - tally.busy;

    trace!(
        start = slot.start(), end = slot.end(), score = availability_score;
        "Scored candidate slot"
    );

    Some(SlotScore {
        slot,
        availability_score,
        member_labels,
        available_members,
        level: AvailabilityLevel::from_score(availability_score, thresholds),
    })
}
