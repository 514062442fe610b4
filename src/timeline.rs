use crate::participant::Participant;
use crate::time::{Status, TimeInterval, MINUTES_PER_DAY};
use chrono::NaiveDate;
use itertools::Itertools;
use log::{trace, warn};

/// A maximal run of minutes sharing one status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub interval: TimeInterval,
    pub status: Status,
}

impl Span {
    pub fn new(interval: TimeInterval, status: Status) -> Span {
        Span { interval, status }
    }
}

/// One member's day, resolved into ordered, gap-free spans covering
/// `[00:00, 24:00)`. No two neighbouring spans share a status.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberTimeline {
    member_id: String,
    spans: Vec<Span>,
    dropped_entries: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Edge {
    Open(u16, Status),
    Close(u16, Status),
}

impl Edge {
    fn minute(&self) -> u16 {
        match *self {
            Edge::Open(m, _) | Edge::Close(m, _) => m,
        }
    }
}

/// Number of open claims per status, indexed by precedence.
#[derive(Default)]
struct OpenClaims([u32; 4]);

impl OpenClaims {
    fn apply(&mut self, edge: &Edge) {
        match *edge {
            Edge::Open(_, status) => self.0[usize::from(status.precedence())] += 1,
            Edge::Close(_, status) => self.0[usize::from(status.precedence())] -= 1,
        }
    }

    fn winner(&self) -> Status {
        if self.0[3] > 0 {
            Status::Busy
        } else if self.0[2] > 0 {
            Status::Preferred
        } else if self.0[1] > 0 {
            Status::Available
        } else {
            Status::Unspecified
        }
    }
}

pub trait TimeMerge {
    fn time_merge(self) -> Vec<Span>;
}

impl<T> TimeMerge for T
where
    T: Iterator<Item = Span>,
{
    /// Combines touching spans that carry the same status
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::time::{Status, TimeInterval};
    /// use schedly_libs::timeline::{Span, TimeMerge};
    ///
    /// let spans = vec![
    ///     Span::new(TimeInterval::new(0, 10).unwrap(), Status::Busy),
    ///     Span::new(TimeInterval::new(10, 20).unwrap(), Status::Busy),
    ///     Span::new(TimeInterval::new(20, 30).unwrap(), Status::Available),
    /// ];
    ///
    /// assert_eq!(
    ///     spans.into_iter().time_merge(),
    ///     vec![
    ///         Span::new(TimeInterval::new(0, 20).unwrap(), Status::Busy),
    ///         Span::new(TimeInterval::new(20, 30).unwrap(), Status::Available),
    ///     ]
    /// );
    /// ```
    fn time_merge(self) -> Vec<Span> {
        self.coalesce(|prev, curr| {
            if prev.status == curr.status && prev.interval.end() == curr.interval.start() {
                match TimeInterval::new(prev.interval.start(), curr.interval.end()) {
                    Ok(interval) => Ok(Span::new(interval, prev.status)),
                    Err(_) => Err((prev, curr)),
                }
            } else {
                Err((prev, curr))
            }
        })
        .collect_vec()
    }
}

impl MemberTimeline {
    /// Resolves `participant`'s entries for `date` into a full-day timeline.
    ///
    /// Entries recorded for another date are skipped, and entries with an
    /// invalid interval are dropped. Both are logged and counted in
    /// [`MemberTimeline::dropped_entries`]. Where entries overlap the status
    /// with the highest precedence wins, so BUSY always beats a free claim.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use schedly_libs::participant::{Participant, ScheduleEntry};
    /// use schedly_libs::time::{Label, Status, TimeInterval};
    /// use schedly_libs::timeline::MemberTimeline;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    /// let member = Participant::new(
    ///     "ana",
    ///     vec![
    ///         ScheduleEntry::new(date, 540, 660, Label::Preferred),
    ///         ScheduleEntry::new(date, 600, 630, Label::Busy),
    ///     ],
    /// );
    ///
    /// let timeline = MemberTimeline::build(&member, date);
    /// let statuses = timeline.spans().iter().map(|s| s.status).collect::<Vec<_>>();
    ///
    /// assert_eq!(
    ///     statuses,
    ///     vec![
    ///         Status::Unspecified,
    ///         Status::Preferred,
    ///         Status::Busy,
    ///         Status::Preferred,
    ///         Status::Unspecified,
    ///     ]
    /// );
    /// ```
    pub fn build(participant: &Participant, date: NaiveDate) -> MemberTimeline {
        let mut dropped_entries = 0;

        let edges = participant
            .entries
            .iter()
            .filter_map(|entry| {
                if entry.date != date {
                    warn!(
                        member = participant.id.as_str(), start = entry.start, end = entry.end;
                        "Skipping schedule entry recorded for {} while resolving {}",
                        entry.date,
                        date
                    );
                    dropped_entries += 1;
                    return None;
                }

                match entry.interval() {
                    Ok(interval) => Some((interval, Status::from(entry.label))),
                    Err(e) => {
                        warn!(member = participant.id.as_str(); "Dropping schedule entry: {}", e);
                        dropped_entries += 1;
                        None
                    }
                }
            })
            .flat_map(|(interval, status)| {
                vec![
                    Edge::Open(interval.start(), status),
                    Edge::Close(interval.end(), status),
                ]
            })
            .sorted_by_key(Edge::minute)
            .collect_vec();

        let mut claims = OpenClaims::default();
        let mut cursor: u16 = 0;
        let mut spans = Vec::with_capacity(edges.len() + 1);

        for (minute, group) in &edges.iter().group_by(|edge| edge.minute()) {
            if minute > cursor {
                if let Ok(interval) = TimeInterval::new(cursor, minute) {
                    spans.push(Span::new(interval, claims.winner()));
                }
                cursor = minute;
            }

            group.for_each(|edge| claims.apply(edge));
        }

        if cursor < MINUTES_PER_DAY {
            if let Ok(interval) = TimeInterval::new(cursor, MINUTES_PER_DAY) {
                spans.push(Span::new(interval, claims.winner()));
            }
        }

        let spans = spans.into_iter().time_merge();

        trace!(
            member = participant.id.as_str(), spans = spans.len(), dropped = dropped_entries;
            "Resolved member timeline"
        );

        MemberTimeline {
            member_id: participant.id.clone(),
            spans,
            dropped_entries,
        }
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// How many of the member's entries could not be used.
    pub fn dropped_entries(&self) -> usize {
        self.dropped_entries
    }

    /// True when the member recorded nothing usable for the day.
    pub fn is_unspecified(&self) -> bool {
        self.spans.iter().all(|s| s.status == Status::Unspecified)
    }

    /// The spans overlapping `slot`, each clipped to the slot.
    pub fn clipped(&self, slot: TimeInterval) -> impl Iterator<Item = Span> + '_ {
        let first = self
            .spans
            .partition_point(|span| span.interval.end() <= slot.start());

        self.spans[first..]
            .iter()
            .take_while(move |span| span.interval.start() < slot.end())
            .filter_map(move |span| {
                span.interval
                    .intersect(slot)
                    .map(|interval| Span::new(interval, span.status))
            })
    }

    /// The status covering the most minutes of `slot`. Ties go to the status
    /// with the higher precedence, so a half busy slot counts as busy.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use schedly_libs::participant::{Participant, ScheduleEntry};
    /// use schedly_libs::time::{Label, Status, TimeInterval};
    /// use schedly_libs::timeline::MemberTimeline;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    /// let member = Participant::new(
    ///     "ana",
    ///     vec![
    ///         ScheduleEntry::new(date, 540, 570, Label::Busy),
    ///         ScheduleEntry::new(date, 570, 600, Label::Preferred),
    ///     ],
    /// );
    /// let timeline = MemberTimeline::build(&member, date);
    ///
    /// let slot = TimeInterval::new(540, 600).unwrap();
    /// assert_eq!(timeline.dominant_status(slot), Status::Busy);
    ///
    /// let slot = TimeInterval::new(550, 600).unwrap();
    /// assert_eq!(timeline.dominant_status(slot), Status::Preferred);
    /// ```
    pub fn dominant_status(&self, slot: TimeInterval) -> Status {
        let mut covered = [0u16; 4];
        for span in self.clipped(slot) {
            covered[usize::from(span.status.precedence())] += span.interval.covers_minutes();
        }

        [
            Status::Unspecified,
            Status::Available,
            Status::Preferred,
            Status::Busy,
        ]
        .iter()
        .copied()
        .max_by_key(|status| {
            (
                covered[usize::from(status.precedence())],
                status.precedence(),
            )
        })
        .unwrap_or(Status::Unspecified)
    }
}
