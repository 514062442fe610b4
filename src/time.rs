use chrono::{NaiveTime, Timelike};
use core::fmt;
use core::iter::FusedIterator;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of minutes in the shared calendar day every interval lives in.
pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[error("Invalid TimeInterval [{start}, {end}). Expected start < end within [0, 1440]")]
pub struct InvalidInterval {
    pub start: u16,
    pub end: u16,
}

/// Half-open `[start, end)` interval of minutes within one day.
///
/// `start` lies in `[0, 1440)` and `end` in `(0, 1440]`, so the interval
/// `[0, 1440)` covers the whole day.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeInterval {
    start: u16,
    end: u16,
}

impl TimeInterval {
    /// The whole day, `[00:00, 24:00)`.
    pub const DAY: TimeInterval = TimeInterval {
        start: 0,
        end: MINUTES_PER_DAY,
    };

    /// Construct a new validated TimeInterval
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::time::TimeInterval;
    ///
    /// let morning = TimeInterval::new(540, 600).unwrap();
    /// assert_eq!(morning.start(), 540);
    /// assert_eq!(morning.end(), 600);
    ///
    /// assert!(TimeInterval::new(600, 600).is_err());
    /// assert!(TimeInterval::new(1430, 1441).is_err());
    /// ```
    pub fn new(start: u16, end: u16) -> Result<TimeInterval, InvalidInterval> {
        if start >= end || end > MINUTES_PER_DAY {
            Err(InvalidInterval { start, end })
        } else {
            Ok(TimeInterval { start, end })
        }
    }

    /// Builds an interval from two wall clock times of the same day.
    /// Seconds are truncated.
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Result<TimeInterval, InvalidInterval> {
        TimeInterval::new(minute_of_day(start), minute_of_day(end))
    }

    pub fn start(self) -> u16 {
        self.start
    }

    pub fn end(self) -> u16 {
        self.end
    }

    /// Length of the interval in minutes
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::time::TimeInterval;
    ///
    /// assert_eq!(TimeInterval::new(540, 600).unwrap().covers_minutes(), 60);
    /// assert_eq!(TimeInterval::DAY.covers_minutes(), 1440);
    /// ```
    pub fn covers_minutes(self) -> u16 {
        self.end - self.start
    }

    /// The overlapping part of `self` and `other`.
    /// Touching intervals such as `[0, 10)` and `[10, 20)` do not overlap.
    ///
    /// # Examples
    /// ```
    /// use schedly_libs::time::TimeInterval;
    ///
    /// let a = TimeInterval::new(0, 30).unwrap();
    /// let b = TimeInterval::new(15, 45).unwrap();
    /// let c = TimeInterval::new(30, 60).unwrap();
    ///
    /// assert_eq!(a.intersect(b), Some(TimeInterval::new(15, 30).unwrap()));
    /// assert_eq!(a.intersect(c), None);
    /// ```
    pub fn intersect(self, other: TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);

        if start < end {
            Some(TimeInterval { start, end })
        } else {
            None
        }
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(self, other: TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeInterval {
    /// Renders as `HH:MM - HH:MM`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            ClockTime(self.start),
            ClockTime(self.end)
        )
    }
}

/// Minute-of-day rendered as a zero padded `HH:MM`. `1440` renders as `24:00`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockTime(pub u16);

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Converts a wall clock time into minutes since midnight.
///
/// # Examples
/// ```
/// use chrono::NaiveTime;
/// use schedly_libs::time::minute_of_day;
///
/// let nine_thirty = NaiveTime::from_hms_opt(9, 30, 59).unwrap();
/// assert_eq!(minute_of_day(nine_thirty), 570);
/// ```
pub fn minute_of_day(time: NaiveTime) -> u16 {
    // hour < 24 and minute < 60, so this always fits
    (time.hour() * 60 + time.minute()) as u16
}

/// What a member declared about an interval of their day.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Busy,
    Available,
    Preferred,
}

/// The resolved state of one span of a member's timeline.
/// `Unspecified` covers every minute the member said nothing about.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Busy,
    Unspecified,
    Available,
    Preferred,
}

impl Status {
    /// Which status wins when two claims cover the same minute.
    /// BUSY > PREFERRED > AVAILABLE > UNSPECIFIED
    pub fn precedence(self) -> u8 {
        match self {
            Status::Busy => 3,
            Status::Preferred => 2,
            Status::Available => 1,
            Status::Unspecified => 0,
        }
    }
}

impl From<Label> for Status {
    fn from(label: Label) -> Self {
        match label {
            Label::Busy => Status::Busy,
            Label::Available => Status::Available,
            Label::Preferred => Status::Preferred,
        }
    }
}

pub trait Windowed {
    fn windowed(self, duration: u16, step: u16) -> CandidateSlots;
}

impl Windowed for TimeInterval {
    /// Splits a `TimeInterval` into `duration` long windows whose starts are
    /// `step` minutes apart. Windows never extend past the end of `self`.
    /// A zero `duration` or `step` yields no windows.
    ///
    /// # Example
    /// ```
    /// use schedly_libs::time::{TimeInterval, Windowed};
    ///
    /// let window = TimeInterval::new(540, 660).unwrap();
    /// let slots = window.windowed(60, 30).collect::<Vec<_>>();
    ///
    /// assert_eq!(
    ///     slots,
    ///     vec![
    ///         TimeInterval::new(540, 600).unwrap(),
    ///         TimeInterval::new(570, 630).unwrap(),
    ///         TimeInterval::new(600, 660).unwrap(),
    ///     ]
    /// );
    ///
    /// assert_eq!(window.windowed(121, 15).count(), 0);
    /// ```
    fn windowed(self, duration: u16, step: u16) -> CandidateSlots {
        CandidateSlots::new(self, duration, step)
    }
}

/// Lazy sequence of candidate slots. Cloning restarts from the current position.
#[derive(Debug, Clone)]
pub struct CandidateSlots {
    next: u16,
    last_start: u16,
    duration: u16,
    step: u16,
    done: bool,
}

impl CandidateSlots {
    fn new(window: TimeInterval, duration: u16, step: u16) -> CandidateSlots {
        let done = duration == 0 || step == 0 || window.covers_minutes() < duration;

        CandidateSlots {
            next: window.start,
            last_start: window.end.saturating_sub(duration),
            duration,
            step,
            done,
        }
    }
}

impl Iterator for CandidateSlots {
    type Item = TimeInterval;

    fn next(&mut self) -> Option<TimeInterval> {
        if self.done || self.next > self.last_start {
            self.done = true;
            return None;
        }

        let slot = TimeInterval {
            start: self.next,
            end: self.next + self.duration,
        };

        match self.next.checked_add(self.step) {
            Some(next) => self.next = next,
            None => self.done = true,
        }

        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done || self.next > self.last_start {
            (0, Some(0))
        } else {
            let remaining = usize::from((self.last_start - self.next) / self.step) + 1;
            (remaining, Some(remaining))
        }
    }
}

impl ExactSizeIterator for CandidateSlots {}

impl FusedIterator for CandidateSlots {}
