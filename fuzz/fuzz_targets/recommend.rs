#![no_main]
use chrono::NaiveDate;
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;
use schedly_libs::config::EngineConfig;
use schedly_libs::participant::GroupSnapshot;
use schedly_libs::recommend::{RecommendationError, RecommendationRequest, Recommender};
use schedly_libs::time::TimeInterval;
use std::cmp::Ordering;

fuzz_target!(|data: (GroupSnapshot, i16, u16, u16, u8)| {
    let (group, duration, start, end, granularity) = data;

    #[cfg(feature = "log")]
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let request = RecommendationRequest::new(date)
        .with_duration(i32::from(duration))
        .with_window(start, end);
    let recommender = Recommender::new(EngineConfig {
        granularity_minutes: u16::from(granularity),
        top_k: None,
        ..EngineConfig::default()
    });

    match recommender.recommend(&group, &request) {
        Ok(result) => {
            assert_eq!(result.total_members, group.members.len());
            assert!(result
                .recommendations
                .iter()
                .all(|r| (0.0..=1.0).contains(&r.availability_score)));
            let window = TimeInterval::new(start, end).unwrap();
            assert!(result.recommendations.iter().all(|r| {
                let slot = TimeInterval::new(r.start, r.end).unwrap();
                window.contains(slot) && i32::from(slot.covers_minutes()) == i32::from(duration)
            }));
            assert!(
                result.recommendations.iter().tuple_windows().all(|(a, b)| {
                    match b.availability_score.total_cmp(&a.availability_score) {
                        Ordering::Less => true,
                        Ordering::Equal => a.start < b.start,
                        Ordering::Greater => false,
                    }
                }),
                "Recommendations out of order"
            );

            let mut reversed = group.clone();
            reversed.members.reverse();
            assert_eq!(
                recommender.recommend(&reversed, &request).ok(),
                Some(result.clone()),
                "Member order changed the recommendations"
            );

            let again = recommender.recommend(&group, &request);
            assert_eq!(again.as_ref().ok(), Some(&result));
        }
        Err(RecommendationError::NoMembers) => assert!(group.members.is_empty()),
        Err(RecommendationError::InvalidDuration(d)) => assert!(d <= 0),
        Err(RecommendationError::InvalidGranularity) => assert_eq!(granularity, 0),
        Err(RecommendationError::InvalidInterval(e)) => assert!(e.start >= e.end || e.end > 1440),
        Err(e) => panic!("Unexpected error: {}", e),
    }
});
