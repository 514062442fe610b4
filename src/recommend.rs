use crate::config::{ConfigError, EngineConfig};
use crate::participant::GroupSnapshot;
use crate::score::{score_slot, SlotScore};
use crate::time::{ClockTime, InvalidInterval, TimeInterval, Windowed};
use crate::timeline::MemberTimeline;
use chrono::NaiveDate;
use core::cmp::Ordering;
use itertools::Itertools;
use log::{debug, info};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendationError {
    #[error("Invalid preferred time window: {0}")]
    InvalidInterval(#[from] InvalidInterval),
    #[error("Meeting duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i32),
    #[error("Candidate granularity must be a positive number of minutes")]
    InvalidGranularity,
    #[error("Cannot recommend a time for a group without members")]
    NoMembers,
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// What the caller is looking for.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    #[cfg_attr(feature = "serde", serde(rename = "targetDate"))]
    pub target_date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(rename = "durationMinutes"))]
    pub duration_minutes: i32,
    #[cfg_attr(feature = "serde", serde(rename = "preferredStartTime"))]
    pub preferred_start: u16,
    #[cfg_attr(feature = "serde", serde(rename = "preferredEndTime"))]
    pub preferred_end: u16,
}

impl RecommendationRequest {
    /// A one hour meeting between 09:00 and 18:00 on `target_date`.
    pub fn new(target_date: NaiveDate) -> RecommendationRequest {
        RecommendationRequest {
            target_date,
            duration_minutes: 60,
            preferred_start: 9 * 60,
            preferred_end: 18 * 60,
        }
    }

    pub fn with_duration(mut self, duration_minutes: i32) -> RecommendationRequest {
        self.duration_minutes = duration_minutes;
        self
    }

    pub fn with_window(mut self, preferred_start: u16, preferred_end: u16) -> RecommendationRequest {
        self.preferred_start = preferred_start;
        self.preferred_end = preferred_end;
        self
    }

    fn window(&self) -> Result<TimeInterval, InvalidInterval> {
        TimeInterval::new(self.preferred_start, self.preferred_end)
    }

    fn duration(&self) -> Result<u16, RecommendationError> {
        if self.duration_minutes <= 0 {
            return Err(RecommendationError::InvalidDuration(self.duration_minutes));
        }

        // Anything longer than a day can never fit, so saturate instead of failing
        Ok(u16::try_from(self.duration_minutes).unwrap_or(u16::MAX))
    }
}

/// One ranked slot, shaped the way the presentation layer consumes it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    #[cfg_attr(feature = "serde", serde(rename = "formattedTimeRange"))]
    pub formatted_time_range: String,
    #[cfg_attr(feature = "serde", serde(rename = "availabilityScore"))]
    pub availability_score: f64,
    #[cfg_attr(feature = "serde", serde(rename = "availabilityText"))]
    pub availability_text: String,
    #[cfg_attr(feature = "serde", serde(rename = "startTime"))]
    pub start: u16,
    #[cfg_attr(feature = "serde", serde(rename = "endTime"))]
    pub end: u16,
    #[cfg_attr(feature = "serde", serde(rename = "availableMembers"))]
    pub available_members: usize,
    #[cfg_attr(feature = "serde", serde(rename = "totalMembers"))]
    pub total_members: usize,
}

impl Recommendation {
    fn new(score: &SlotScore, total_members: usize) -> Recommendation {
        Recommendation {
            formatted_time_range: score.slot.to_string(),
            availability_score: score.availability_score,
            availability_text: score.availability_text().to_string(),
            start: score.slot.start(),
            end: score.slot.end(),
            available_members: score.available_members,
            total_members,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisMetadata {
    #[cfg_attr(feature = "serde", serde(rename = "requestedDurationMinutes"))]
    pub requested_duration_minutes: i32,
    #[cfg_attr(feature = "serde", serde(rename = "searchStartTime"))]
    pub search_start: String,
    #[cfg_attr(feature = "serde", serde(rename = "searchEndTime"))]
    pub search_end: String,
    #[cfg_attr(feature = "serde", serde(rename = "granularityMinutes"))]
    pub granularity_minutes: u16,
    #[cfg_attr(feature = "serde", serde(rename = "candidateCount"))]
    pub candidate_count: usize,
    #[cfg_attr(feature = "serde", serde(rename = "droppedEntries"))]
    pub dropped_entries: usize,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    #[cfg_attr(feature = "serde", serde(rename = "groupId"))]
    pub group_id: u64,
    #[cfg_attr(feature = "serde", serde(rename = "groupName"))]
    pub group_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "targetDate"))]
    pub target_date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(rename = "totalMembers"))]
    pub total_members: usize,
    pub recommendations: Vec<Recommendation>,
    pub metadata: AnalysisMetadata,
}

/// Best first: higher score, then earlier start.
pub fn rank(a: &SlotScore, b: &SlotScore) -> Ordering {
    b.availability_score
        .total_cmp(&a.availability_score)
        .then_with(|| a.slot.cmp(&b.slot))
}

/// Stateless group availability recommender. Every call to
/// [`Recommender::recommend`] is an independent computation.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    config: EngineConfig,
}

impl Recommender {
    pub fn new(config: EngineConfig) -> Recommender {
        Recommender { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn timelines(&self, group: &GroupSnapshot, date: NaiveDate) -> Vec<MemberTimeline> {
        #[cfg(feature = "rayon")]
        let members = group.members.par_iter();
        #[cfg(not(feature = "rayon"))]
        let members = group.members.iter();

        members
            .map(|member| MemberTimeline::build(member, date))
            .collect()
    }

    /// Every candidate slot in `window`, scored and ranked best first.
    /// Nothing is truncated here.
    pub fn score_candidates(
        &self,
        timelines: &[MemberTimeline],
        window: TimeInterval,
        duration: u16,
    ) -> Vec<SlotScore> {
        let candidates = window
            .windowed(duration, self.config.granularity_minutes)
            .collect_vec();

        #[cfg(feature = "rayon")]
        let candidates = candidates.into_par_iter();
        #[cfg(not(feature = "rayon"))]
        let candidates = candidates.into_iter();

        let weights = &self.config.weights;
        let thresholds = &self.config.thresholds;
        let mut scores: Vec<SlotScore> = candidates
            .filter_map(|slot| score_slot(slot, timelines, weights, thresholds))
            .collect();

        scores.sort_by(rank);
        scores
    }

    /// Recommends meeting slots for `group` on the requested date.
    ///
    /// # Errors
    /// Malformed requests fail with a typed error: a non-positive duration
    /// gives `InvalidDuration`, a malformed preferred window gives
    /// `InvalidInterval` and an empty group gives `NoMembers`. Bad entries
    /// inside a member's schedule never fail the request; they are dropped
    /// and counted in the metadata. A window too short for the duration is
    /// not an error either and yields no recommendations.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use schedly_libs::participant::{GroupSnapshot, Participant, ScheduleEntry};
    /// use schedly_libs::recommend::{RecommendationRequest, Recommender};
    /// use schedly_libs::time::Label;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    /// let group = GroupSnapshot::new(
    ///     1,
    ///     "study",
    ///     vec![
    ///         Participant::new("ana", vec![ScheduleEntry::new(date, 540, 600, Label::Busy)]),
    ///         Participant::new("ben", vec![ScheduleEntry::new(date, 600, 720, Label::Preferred)]),
    ///     ],
    /// );
    /// let request = RecommendationRequest::new(date)
    ///     .with_duration(60)
    ///     .with_window(540, 720);
    ///
    /// let result = Recommender::default().recommend(&group, &request).unwrap();
    ///
    /// assert_eq!(result.total_members, 2);
    /// assert_eq!(result.recommendations[0].formatted_time_range, "09:45 - 10:45");
    /// assert_eq!(result.recommendations[0].availability_score, 0.75);
    /// assert_eq!(result.recommendations[0].availability_text, "대부분 가능");
    /// ```
    pub fn recommend(
        &self,
        group: &GroupSnapshot,
        request: &RecommendationRequest,
    ) -> Result<AnalysisResult, RecommendationError> {
        self.config.validate()?;
        if self.config.granularity_minutes == 0 {
            return Err(RecommendationError::InvalidGranularity);
        }

        let duration = request.duration()?;
        let window = request.window()?;

        if group.members.is_empty() {
            return Err(RecommendationError::NoMembers);
        }

        let timelines = self.timelines(group, request.target_date);
        let dropped_entries: usize = timelines.iter().map(MemberTimeline::dropped_entries).sum();

        let scores = self.score_candidates(&timelines, window, duration);
        let candidate_count = scores.len();
        let total_members = group.members.len();

        let recommendations = scores
            .iter()
            .take(self.config.top_k.unwrap_or(usize::MAX))
            .map(|score| Recommendation::new(score, total_members))
            .collect_vec();

        if recommendations.is_empty() {
            info!(
                group = group.group_id, duration = duration;
                "No candidate slot fits the window {}", window
            );
        }

        debug!(
            group = group.group_id, members = total_members, candidates = candidate_count,
            recommended = recommendations.len(), dropped = dropped_entries;
            "Analyzed group availability for {}", request.target_date
        );

        Ok(AnalysisResult {
            group_id: group.group_id,
            group_name: group.group_name.clone(),
            target_date: request.target_date,
            total_members,
            recommendations,
            metadata: AnalysisMetadata {
                requested_duration_minutes: request.duration_minutes,
                search_start: ClockTime(window.start()).to_string(),
                search_end: ClockTime(window.end()).to_string(),
                granularity_minutes: self.config.granularity_minutes,
                candidate_count,
                dropped_entries,
            },
        })
    }
}

/// Recommends with the default [`EngineConfig`].
pub fn recommend(
    group: &GroupSnapshot,
    request: &RecommendationRequest,
) -> Result<AnalysisResult, RecommendationError> {
    Recommender::default().recommend(group, request)
}
