use crate::time::{minute_of_day, InvalidInterval, Label, TimeInterval};
use chrono::{NaiveDate, NaiveTime};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single labeled interval a member recorded for one date.
///
/// Bounds are stored as given; they are only validated when the entry is
/// resolved into a timeline, so one malformed entry cannot reject a snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(rename = "startTime"))]
    pub start: u16,
    #[cfg_attr(feature = "serde", serde(rename = "endTime"))]
    pub end: u16,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub label: Label,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
}

impl ScheduleEntry {
    pub fn new(date: NaiveDate, start: u16, end: u16, label: Label) -> ScheduleEntry {
        ScheduleEntry {
            date,
            start,
            end,
            label,
            title: None,
        }
    }

    /// Constructs an entry from wall clock times.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use schedly_libs::participant::ScheduleEntry;
    /// use schedly_libs::time::Label;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    /// let entry = ScheduleEntry::from_times(
    ///     date,
    ///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
    ///     Label::Busy,
    /// );
    ///
    /// assert_eq!((entry.start, entry.end), (540, 630));
    /// ```
    pub fn from_times(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        label: Label,
    ) -> ScheduleEntry {
        ScheduleEntry::new(date, minute_of_day(start), minute_of_day(end), label)
    }

    pub fn with_title(mut self, title: &str) -> ScheduleEntry {
        self.title = Some(title.to_string());
        self
    }

    /// The validated interval this entry covers.
    pub fn interval(&self) -> Result<TimeInterval, InvalidInterval> {
        TimeInterval::new(self.start, self.end)
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for ScheduleEntry {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        // Keep dates clustered so most entries land on the fuzzed target date
        let offset = u.int_in_range(0..=2)?;
        let date = NaiveDate::from_ymd_opt(2024, 1, 1 + offset)
            .ok_or(arbitrary::Error::IncorrectFormat)?;
        let start = u.int_in_range(0..=1450)?;
        let end = u.int_in_range(0..=1450)?;

        Ok(ScheduleEntry::new(date, start, end, u.arbitrary()?))
    }
}

/// A group member and the entries they recorded.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Participant {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub entries: Vec<ScheduleEntry>,
}

impl Participant {
    /// Constructs a new Participant with the entries they recorded.
    /// An empty list means the member said nothing about the day.
    pub fn new(id: &str, entries: Vec<ScheduleEntry>) -> Participant {
        Participant {
            id: id.to_string(),
            entries,
        }
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Participant {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let id = u.arbitrary::<uuid::Uuid>()?;
        let entries = u.arbitrary::<Vec<ScheduleEntry>>()?;

        Ok(Participant::new(&id.to_string(), entries))
    }
}

/// Read-only snapshot of a group supplied by the storage layer.
/// Membership is assumed to be authorization-checked already.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Clone, Debug)]
pub struct GroupSnapshot {
    #[cfg_attr(feature = "serde", serde(rename = "groupId"))]
    pub group_id: u64,
    #[cfg_attr(feature = "serde", serde(rename = "groupName"))]
    pub group_name: String,
    pub members: Vec<Participant>,
}

impl GroupSnapshot {
    pub fn new(group_id: u64, group_name: &str, members: Vec<Participant>) -> GroupSnapshot {
        GroupSnapshot {
            group_id,
            group_name: group_name.to_string(),
            members,
        }
    }
}
