#![no_main]
use chrono::NaiveDate;
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;
use schedly_libs::participant::Participant;
use schedly_libs::time::{Status, TimeInterval, MINUTES_PER_DAY};
use schedly_libs::timeline::MemberTimeline;

fuzz_target!(|data: (Participant, u16, u16)| {
    let (participant, start, length) = data;
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let timeline = MemberTimeline::build(&participant, date);
    let spans = timeline.spans();

    assert_eq!(spans.first().map(|s| s.interval.start()), Some(0));
    assert_eq!(spans.last().map(|s| s.interval.end()), Some(MINUTES_PER_DAY));
    assert!(
        spans.iter().tuple_windows().all(|(a, b)| {
            a.interval.end() == b.interval.start() && a.status != b.status
        }),
        "Spans must be contiguous with alternating statuses: {:?}",
        spans
    );

    let usable = participant
        .entries
        .iter()
        .filter(|e| e.date == date && e.interval().is_ok())
        .count();
    assert_eq!(timeline.dropped_entries(), participant.entries.len() - usable);

    // Any minute claimed BUSY must resolve to BUSY
    for entry in participant.entries.iter().filter(|e| e.date == date) {
        if let Ok(interval) = entry.interval() {
            if Status::from(entry.label) == Status::Busy {
                assert!(timeline
                    .clipped(interval)
                    .all(|span| span.status == Status::Busy));
            }
        }
    }

    if let Ok(slot) = TimeInterval::new(start, start.saturating_add(length)) {
        let covered: u32 = timeline
            .clipped(slot)
            .map(|s| u32::from(s.interval.covers_minutes()))
            .sum();
        assert_eq!(covered, u32::from(slot.covers_minutes()));
    }
});
