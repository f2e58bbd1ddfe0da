use crate::color::{ParseColorError, Rgb};
use crate::project::Project;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::{macros::format_description, Date, OffsetDateTime, PrimitiveDateTime};

/// Parse a stored `YYYY-MM-DD` date into a calendar date.
///
/// Only the year, month, and day are read; there is no time of day and no
/// offset, so the result is the same whatever timezone the host is in.  The
/// date may be followed by a `T…` time of day (as left behind by some
/// exports), which must itself be well-formed but is otherwise ignored.
/// Signed years and surrounding whitespace are rejected.
pub(crate) fn parse_ymd(s: &str) -> Result<Date, ParseDateError> {
    let err = || ParseDateError(s.to_owned());
    let (Some(ymd), Some(rest)) = (s.get(..10), s.get(10..)) else {
        return Err(err());
    };
    if !ymd.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(err());
    }
    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(ymd, format).map_err(|_| err())?;
    if rest.is_empty() || (rest.starts_with('T') && is_timestamp(s)) {
        Ok(date)
    } else {
        Err(err())
    }
}

fn is_timestamp(s: &str) -> bool {
    OffsetDateTime::parse(s, &Rfc3339).is_ok()
        || PrimitiveDateTime::parse(
            s,
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
            ),
        )
        .is_ok()
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid date {0:?}; expected YYYY-MM-DD")]
pub(crate) struct ParseDateError(String);

/// An inclusive range of calendar dates
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct DateSpan {
    start: Date,
    end: Date,
}

impl DateSpan {
    pub(crate) fn new(start: Date, end: Date) -> Result<DateSpan, RangeError> {
        if end < start {
            Err(RangeError::Inverted { start, end })
        } else {
            Ok(DateSpan { start, end })
        }
    }

    pub(crate) fn start(&self) -> Date {
        self.start
    }

    pub(crate) fn end(&self) -> Date {
        self.end
    }

    pub(crate) fn covers(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Why a project was left off the calendar
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum RangeError {
    #[error("malformed {field} {value:?}")]
    MalformedDate { field: &'static str, value: String },
    #[error("end date {end} is before start date {start}")]
    Inverted { start: Date, end: Date },
}

/// A project that covers some date, together with its parsed color.  The
/// color is `None` when the stored value cannot be read; the project still
/// covers its dates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Occupant<'a> {
    pub(crate) project: &'a Project,
    pub(crate) color: Option<Rgb>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Entry<'a> {
    project: &'a Project,
    span: Result<DateSpan, RangeError>,
    color: Result<Rgb, ParseColorError>,
}

impl<'a> Entry<'a> {
    fn new(project: &'a Project) -> Entry<'a> {
        Entry {
            project,
            span: span_of_project(project),
            color: project.color.parse::<Rgb>(),
        }
    }
}

fn span_of_project(project: &Project) -> Result<DateSpan, RangeError> {
    let start = parse_ymd(&project.start_date).map_err(|_| RangeError::MalformedDate {
        field: "start date",
        value: project.start_date.clone(),
    })?;
    let end = parse_ymd(&project.end_date).map_err(|_| RangeError::MalformedDate {
        field: "end date",
        value: project.end_date.clone(),
    })?;
    DateSpan::new(start, end)
}

/// Answers which projects in a snapshot cover a given day.
///
/// Each project is resolved once when the index is built.  Coverage depends
/// on the dates alone: a project whose dates cannot be read, or whose range
/// ends before it starts, covers no days at all, while one with an
/// unreadable color still covers its range but is drawn unfilled.  Either
/// way the rest of the snapshot is unaffected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DateRangeIndex<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> DateRangeIndex<'a> {
    pub(crate) fn new(projects: &'a [Project]) -> DateRangeIndex<'a> {
        DateRangeIndex {
            entries: projects.iter().map(Entry::new).collect(),
        }
    }

    /// Returns the projects whose range includes `date`, in snapshot order
    pub(crate) fn covering(&self, date: Date) -> Vec<Occupant<'a>> {
        self.entries
            .iter()
            .filter(|e| e.span.as_ref().is_ok_and(|span| span.covers(date)))
            .map(|e| Occupant {
                project: e.project,
                color: e.color.as_ref().ok().copied(),
            })
            .collect()
    }

    /// Returns the span of `project` if its dates were read successfully
    pub(crate) fn span_of(&self, project: &Project) -> Option<DateSpan> {
        self.entries
            .iter()
            .find(|e| std::ptr::eq(e.project, project))
            .and_then(|e| e.span.as_ref().ok().copied())
    }

    /// Projects that cover no days because their dates could not be resolved
    pub(crate) fn rejected(&self) -> impl Iterator<Item = (&'a Project, &RangeError)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.span.as_ref().err().map(|err| (e.project, err)))
    }

    /// Projects that are on the calendar but whose color cannot be read
    pub(crate) fn unpainted(&self) -> impl Iterator<Item = (&'a Project, &ParseColorError)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.color.as_ref().err().map(|err| (e.project, err)))
    }
}
