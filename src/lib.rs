pub mod config;
pub mod participant;
pub mod recommend;
pub mod score;
pub mod time;
pub mod timeline;

pub use config::EngineConfig;
pub use participant::{GroupSnapshot, Participant, ScheduleEntry};
pub use recommend::{
    recommend, AnalysisResult, Recommendation, RecommendationError, RecommendationRequest,
    Recommender,
};
pub use time::{Label, Status, TimeInterval};

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::participant::{GroupSnapshot, Participant, ScheduleEntry};
    use crate::recommend::{rank, recommend, RecommendationError, RecommendationRequest, Recommender};
    use crate::time::{Label, TimeInterval, MINUTES_PER_DAY};
    use crate::timeline::MemberTimeline;
    use chrono::NaiveDate;
    use itertools::Itertools;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 12).unwrap()
    }

    fn recommender(granularity_minutes: u16) -> Recommender {
        Recommender::new(EngineConfig {
            granularity_minutes,
            top_k: None,
            ..EngineConfig::default()
        })
    }

    fn busy_morning_group() -> GroupSnapshot {
        GroupSnapshot::new(
            1,
            "morning",
            vec![Participant::new(
                "1",
                vec![ScheduleEntry::new(date(), 540, 600, Label::Busy)],
            )],
        )
    }

    fn mixed_group() -> GroupSnapshot {
        GroupSnapshot::new(
            2,
            "mixed",
            vec![
                Participant::new(
                    "1",
                    vec![
                        ScheduleEntry::new(date(), 480, 720, Label::Available),
                        ScheduleEntry::new(date(), 600, 660, Label::Busy),
                    ],
                ),
                Participant::new(
                    "2",
                    vec![
                        ScheduleEntry::new(date(), 540, 900, Label::Preferred),
                        ScheduleEntry::new(date(), 780, 840, Label::Busy).with_title("lunch"),
                    ],
                ),
                Participant::new("3", vec![ScheduleEntry::new(date(), 0, 1440, Label::Available)]),
                Participant::new("4", vec![]),
                Participant::new(
                    "5",
                    vec![
                        ScheduleEntry::new(date(), 700, 650, Label::Busy),
                        ScheduleEntry::new(date(), 660, 780, Label::Preferred),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn busy_hour_ranks_last() {
        let request = RecommendationRequest::new(date())
            .with_duration(30)
            .with_window(540, 660);
        let result = recommender(30)
            .recommend(&busy_morning_group(), &request)
            .unwrap();

        assert_eq!(
            result
                .recommendations
                .iter()
                .map(|r| (r.formatted_time_range.as_str(), r.availability_score))
                .collect_vec(),
            vec![
                ("10:00 - 10:30", 0.5),
                ("10:30 - 11:00", 0.5),
                ("09:00 - 09:30", 0.0),
                ("09:30 - 10:00", 0.0),
            ]
        );
        assert_eq!(result.recommendations[0].availability_text, "일부 가능");
        assert_eq!(result.recommendations[3].availability_text, "어려움");
    }

    #[test]
    fn preferred_and_silent_members_average() {
        let group = GroupSnapshot::new(
            3,
            "pair",
            vec![
                Participant::new("1", vec![ScheduleEntry::new(date(), 0, 1440, Label::Preferred)]),
                Participant::new("2", vec![]),
            ],
        );
        let result = recommend(&group, &RecommendationRequest::new(date())).unwrap();

        assert!(!result.recommendations.is_empty());
        assert!(result.recommendations.iter().all(|r| {
            r.availability_score == 0.75 && r.availability_text == "대부분 가능"
        }));
        assert_eq!(result.total_members, 2);
    }

    #[test]
    fn window_shorter_than_duration_is_empty() {
        let request = RecommendationRequest::new(date())
            .with_duration(90)
            .with_window(540, 600);
        let result = recommend(&busy_morning_group(), &request).unwrap();

        assert!(result.recommendations.is_empty());
        assert_eq!(result.total_members, 1);
        assert_eq!(result.group_name, "morning");
    }

    #[test]
    fn empty_group_fails() {
        let group = GroupSnapshot::new(4, "empty", vec![]);

        assert_eq!(
            recommend(&group, &RecommendationRequest::new(date())),
            Err(RecommendationError::NoMembers)
        );
    }

    #[test]
    fn timelines_cover_the_whole_day() {
        for member in mixed_group().members.iter() {
            let timeline = MemberTimeline::build(member, date());
            let spans = timeline.spans();

            assert_eq!(spans[0].interval.start(), 0);
            assert_eq!(spans[spans.len() - 1].interval.end(), MINUTES_PER_DAY);
            for (prev, next) in spans.iter().tuple_windows() {
                assert_eq!(prev.interval.end(), next.interval.start());
                assert_ne!(prev.status, next.status);
            }
        }
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let group = mixed_group();
        let timelines = group
            .members
            .iter()
            .map(|m| MemberTimeline::build(m, date()))
            .collect_vec();

        let scores = recommender(5).score_candidates(&timelines, TimeInterval::DAY, 45);

        assert_eq!(scores.len(), (1440 - 45) / 5 + 1);
        assert!(scores
            .iter()
            .all(|s| (0.0..=1.0).contains(&s.availability_score)));
    }

    #[test]
    fn ranking_is_ordered() {
        let request = RecommendationRequest::new(date())
            .with_duration(45)
            .with_window(420, 1080);
        let result = recommender(15).recommend(&mixed_group(), &request).unwrap();

        for (a, b) in result.recommendations.iter().tuple_windows() {
            assert!(a.availability_score >= b.availability_score);
            if a.availability_score == b.availability_score {
                assert!(a.start <= b.start);
            }
        }

        let group = mixed_group();
        let timelines = group
            .members
            .iter()
            .map(|m| MemberTimeline::build(m, date()))
            .collect_vec();
        let scores = recommender(15).score_candidates(
            &timelines,
            TimeInterval::new(420, 1080).unwrap(),
            45,
        );
        assert!(scores
            .iter()
            .tuple_windows()
            .all(|(a, b)| rank(a, b) != std::cmp::Ordering::Greater));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let request = RecommendationRequest::new(date()).with_window(0, 1440);
        let first = recommend(&mixed_group(), &request).unwrap();
        let second = recommend(&mixed_group(), &request).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first
                .recommendations
                .iter()
                .map(|r| r.availability_score.to_bits())
                .collect_vec(),
            second
                .recommendations
                .iter()
                .map(|r| r.availability_score.to_bits())
                .collect_vec()
        );
    }

    #[test]
    fn bad_entry_does_not_deny_the_group() {
        let request = RecommendationRequest::new(date())
            .with_duration(60)
            .with_window(660, 720);
        let result = recommender(60).recommend(&mixed_group(), &request).unwrap();

        // 1: AVAILABLE, 2: PREFERRED, 3: AVAILABLE, 4: silent, 5: PREFERRED
        let expected = (0.8 + 1.0 + 0.8 + 0.5 + 1.0) / 5.0;
        assert_eq!(result.recommendations.len(), 1);
        assert!((result.recommendations[0].availability_score - expected).abs() < 1e-12);
        assert_eq!(result.recommendations[0].available_members, 5);
        assert_eq!(result.recommendations[0].availability_text, "대부분 가능");
        assert_eq!(result.metadata.dropped_entries, 1);
    }

    fn all_day(id: &str, label: Label) -> Participant {
        Participant::new(id, vec![ScheduleEntry::new(date(), 0, 1440, label)])
    }

    fn half_hour_at_nine(members: Vec<Participant>) -> crate::recommend::AnalysisResult {
        let request = RecommendationRequest::new(date())
            .with_duration(30)
            .with_window(540, 570);

        recommend(&GroupSnapshot::new(5, "bucket", members), &request).unwrap()
    }

    #[test]
    fn two_preferred_two_available_is_fully_available() {
        let result = half_hour_at_nine(vec![
            all_day("1", Label::Preferred),
            all_day("2", Label::Preferred),
            all_day("3", Label::Available),
            all_day("4", Label::Available),
        ]);

        assert_eq!(result.recommendations[0].availability_score, 0.9);
        assert_eq!(result.recommendations[0].availability_text, "모두 가능");
    }

    #[test]
    fn mirrored_slots_rank_by_start() {
        let first_preferred = vec![
            ScheduleEntry::new(date(), 540, 570, Label::Preferred),
            ScheduleEntry::new(date(), 570, 600, Label::Available),
        ];
        let first_available = vec![
            ScheduleEntry::new(date(), 540, 570, Label::Available),
            ScheduleEntry::new(date(), 570, 600, Label::Preferred),
        ];
        let group = GroupSnapshot::new(
            6,
            "mirror",
            vec![
                Participant::new("1", first_preferred.clone()),
                Participant::new("2", first_preferred),
                Participant::new("3", first_available.clone()),
                Participant::new("4", first_available),
            ],
        );
        let request = RecommendationRequest::new(date())
            .with_duration(30)
            .with_window(540, 600);
        let result = recommender(30).recommend(&group, &request).unwrap();

        assert_eq!(
            result
                .recommendations
                .iter()
                .map(|r| (r.start, r.availability_score, r.availability_text.as_str()))
                .collect_vec(),
            vec![(540, 0.9, "모두 가능"), (570, 0.9, "모두 가능")]
        );
    }

    #[test]
    fn member_order_does_not_change_recommendations() {
        let request = RecommendationRequest::new(date())
            .with_duration(30)
            .with_window(420, 1080);
        let members = mixed_group().members;
        let expected = recommender(15)
            .recommend(&GroupSnapshot::new(2, "mixed", members.clone()), &request)
            .unwrap();

        for order in members.iter().cloned().permutations(members.len()) {
            let result = recommender(15)
                .recommend(&GroupSnapshot::new(2, "mixed", order), &request)
                .unwrap();

            assert_eq!(
                result
                    .recommendations
                    .iter()
                    .map(|r| (r.start, r.availability_score.to_bits(), r.availability_text.clone()))
                    .collect_vec(),
                expected
                    .recommendations
                    .iter()
                    .map(|r| (r.start, r.availability_score.to_bits(), r.availability_text.clone()))
                    .collect_vec()
            );
        }
    }

    #[test]
    fn scores_on_a_threshold_take_the_higher_bucket() {
        let preferred_and_busy = |preferred: usize, busy: usize| {
            (0..preferred)
                .map(|i| all_day(&format!("p{}", i), Label::Preferred))
                .chain((0..busy).map(|i| all_day(&format!("b{}", i), Label::Busy)))
                .collect_vec()
        };

        for &(preferred, busy, score, text) in &[
            (9, 1, 0.9, "모두 가능"),
            (3, 2, 0.6, "대부분 가능"),
            (3, 7, 0.3, "일부 가능"),
            (1, 4, 0.2, "어려움"),
        ] {
            let result = half_hour_at_nine(preferred_and_busy(preferred, busy));

            assert_eq!(result.recommendations[0].availability_score, score);
            assert_eq!(result.recommendations[0].availability_text, text);
        }
    }

    #[test]
    fn recommendations_stay_inside_the_window() {
        let window = TimeInterval::new(420, 1080).unwrap();
        let request = RecommendationRequest::new(date())
            .with_duration(45)
            .with_window(window.start(), window.end());
        let result = recommender(10).recommend(&mixed_group(), &request).unwrap();

        assert!(result.recommendations.iter().all(|r| {
            TimeInterval::new(r.start, r.end)
                .map(|slot| window.contains(slot) && slot.covers_minutes() == 45)
                .unwrap_or(false)
        }));
    }
}
