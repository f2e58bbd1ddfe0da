use super::index::{DateRangeIndex, Occupant};
use super::util::{days_of_month, WeekdayExt, DAYS_IN_WEEK};
use crate::color::Rgb;
use std::fmt::Write;
use thiserror::Error;
use time::{Date, Month};

/// One month laid out as calendar cells, Sunday first.
///
/// The cells are the leading blanks before the 1st followed by one cell per
/// day.  Nothing is emitted after the last day: the final week may be short,
/// and it is up to the drawing code to leave the rest of that row empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CalendarMonth<'a> {
    year: i32,
    month: Month,
    cells: Vec<Cell<'a>>,
}

impl<'a> CalendarMonth<'a> {
    /// Lay out month `month_index` (0 = January … 11 = December) of `year`.
    ///
    /// Each day is marked with the projects in `index` that cover it, and the
    /// day equal to `today` is flagged.  Years before 1 and month indices
    /// past 11 are rejected.
    pub(crate) fn render(
        index: &DateRangeIndex<'a>,
        year: i32,
        month_index: u8,
        today: Date,
    ) -> Result<CalendarMonth<'a>, InvalidMonthRequest> {
        if year <= 0 {
            return Err(InvalidMonthRequest::Year(year));
        }
        let month = month_index
            .checked_add(1)
            .and_then(|m| Month::try_from(m).ok())
            .ok_or(InvalidMonthRequest::MonthIndex(month_index))?;
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|_| InvalidMonthRequest::Year(year))?;
        let leading = usize::from(first.weekday().index0());
        let mut cells = vec![Cell::Blank; leading];
        cells.extend(days_of_month(first).map(|date| {
            let occupants = index.covering(date);
            Cell::Day(DayCell {
                date,
                visual: Visual::for_occupants(&occupants),
                occupants,
                is_today: date == today,
            })
        }));
        Ok(CalendarMonth { year, month, cells })
    }

    pub(crate) fn year(&self) -> i32 {
        self.year
    }

    pub(crate) fn month(&self) -> Month {
        self.month
    }

    pub(crate) fn cells(&self) -> &[Cell<'a>] {
        &self.cells
    }

    /// The cells split into week rows; only the last row can be shorter than
    /// seven cells
    pub(crate) fn weeks(&self) -> std::slice::Chunks<'_, Cell<'a>> {
        self.cells.chunks(DAYS_IN_WEEK)
    }

    pub(crate) fn day(&self, day: u8) -> Option<&DayCell<'a>> {
        self.cells().iter().find_map(|c| match c {
            Cell::Day(dc) if dc.day() == day => Some(dc),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Cell<'a> {
    Blank,
    Day(DayCell<'a>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DayCell<'a> {
    pub(crate) date: Date,
    /// Projects covering `date`, in snapshot order
    pub(crate) occupants: Vec<Occupant<'a>>,
    pub(crate) visual: Visual,
    pub(crate) is_today: bool,
}

impl DayCell<'_> {
    pub(crate) fn day(&self) -> u8 {
        self.date.day()
    }

    /// Names of the covering projects, comma-separated
    pub(crate) fn tooltip(&self) -> String {
        self.occupants
            .iter()
            .map(|o| o.project.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// How a day cell should be filled.  A project whose color cannot be read
/// still occupies its share of the cell, but that share is left unfilled
/// and drawn in the base style.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Visual {
    Unmarked,
    Solid {
        fill: Option<Rgb>,
        text: Option<Rgb>,
    },
    /// Equal-width bands, one per project; the text color follows the first
    /// band
    Segmented {
        bands: Vec<Band>,
        text: Option<Rgb>,
    },
}

impl Visual {
    pub(crate) fn for_occupants(occupants: &[Occupant<'_>]) -> Visual {
        match occupants {
            [] => Visual::Unmarked,
            [only] => Visual::Solid {
                fill: only.color,
                text: only.color.map(Rgb::contrast),
            },
            [first, ..] => {
                let count = u32::try_from(occupants.len()).unwrap_or(u32::MAX);
                let bands = std::iter::zip(0.., occupants)
                    .map(|(index, o)| Band {
                        color: o.color,
                        index,
                        count,
                    })
                    .collect();
                Visual::Segmented {
                    bands,
                    text: first.color.map(Rgb::contrast),
                }
            }
        }
    }

    pub(crate) fn text_color(&self) -> Option<Rgb> {
        match self {
            Visual::Unmarked => None,
            Visual::Solid { text, .. } | Visual::Segmented { text, .. } => *text,
        }
    }

    /// Fill color at column `col` of a cell `width` columns wide.  Each
    /// column takes the band under its midpoint.
    pub(crate) fn fill_at(&self, col: u16, width: u16) -> Option<Rgb> {
        match self {
            Visual::Unmarked => None,
            Visual::Solid { fill, .. } => *fill,
            Visual::Segmented { bands, .. } => {
                let count = bands.len();
                let width = usize::from(width.max(1));
                let i = (2 * usize::from(col) + 1) * count / (2 * width);
                bands.get(i.min(count.saturating_sub(1)))?.color
            }
        }
    }

    /// CSS background for the fill, as used by the web view: a hard-stop
    /// `linear-gradient` for several projects, a plain color for one.  Bands
    /// without a color are `transparent`.
    pub(crate) fn css_background(&self) -> Option<String> {
        match self {
            Visual::Unmarked => None,
            Visual::Solid { fill, .. } => fill.as_ref().map(ToString::to_string),
            Visual::Segmented { bands, .. } => {
                let mut s = String::from("linear-gradient(to bottom");
                for b in bands {
                    let c = b
                        .color
                        .as_ref()
                        .map_or_else(|| String::from("transparent"), ToString::to_string);
                    let _ = write!(
                        s,
                        ", {c} {}%, {c} {}%",
                        css_percent(b.start_percent()),
                        css_percent(b.end_percent()),
                    );
                }
                s.push(')');
                Some(s)
            }
        }
    }
}

/// Format a percentage with at most two decimal places and no trailing zeros
fn css_percent(p: f64) -> String {
    let s = format!("{p:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Band `index` of `count` equal bands; covers `[100·index/count,
/// 100·(index+1)/count)` percent of the cell
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Band {
    pub(crate) color: Option<Rgb>,
    pub(crate) index: u32,
    pub(crate) count: u32,
}

impl Band {
    pub(crate) fn start_percent(&self) -> f64 {
        100.0 * f64::from(self.index) / f64::from(self.count)
    }

    pub(crate) fn end_percent(&self) -> f64 {
        100.0 * (f64::from(self.index) + 1.0) / f64::from(self.count)
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum InvalidMonthRequest {
    #[error("month index {0} is out of range; expected 0 through 11")]
    MonthIndex(u8),
    #[error("year {0} cannot be shown on the calendar")]
    Year(i32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{project, Project};
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 11);

    fn render<'a>(index: &DateRangeIndex<'a>, year: i32, month_index: u8) -> CalendarMonth<'a> {
        CalendarMonth::render(index, year, month_index, TODAY)
            .unwrap()
    }

    fn leading_blanks(month: &CalendarMonth<'_>) -> usize {
        month
            .cells()
            .iter()
            .take_while(|c| matches!(c, Cell::Blank))
            .count()
    }

    fn day_cells<'b, 'a>(month: &'b CalendarMonth<'a>) -> Vec<&'b DayCell<'a>> {
        month
            .cells()
            .iter()
            .filter_map(|c| match c {
                Cell::Day(dc) => Some(dc),
                Cell::Blank => None,
            })
            .collect()
    }

    fn sample() -> Vec<Project> {
        vec![
            project("Henderson Deck", "#ffca3a", "2024-03-10", "2024-03-12"),
            project("Okafor Kitchen", "#1982c4", "2024-03-12", "2024-03-20"),
            project("Broken", "#6a4c93", "2024-03-xx", "2024-03-20"),
        ]
    }

    #[test]
    fn test_leading_blanks() {
        let index = DateRangeIndex::new(&[]);
        // January 2024 starts on a Monday
        assert_eq!(leading_blanks(&render(&index, 2024, 0)), 1);
        // September 2024 starts on a Sunday
        assert_eq!(leading_blanks(&render(&index, 2024, 8)), 0);
        // June 2024 starts on a Saturday
        assert_eq!(leading_blanks(&render(&index, 2024, 5)), 6);
    }

    #[test]
    fn test_days_in_month() {
        let index = DateRangeIndex::new(&[]);
        assert_eq!(day_cells(&render(&index, 2024, 1)).len(), 29);
        assert_eq!(day_cells(&render(&index, 2023, 1)).len(), 28);
        assert_eq!(day_cells(&render(&index, 1900, 1)).len(), 28);
        assert_eq!(day_cells(&render(&index, 2000, 1)).len(), 29);
        assert_eq!(day_cells(&render(&index, 2024, 3)).len(), 30);
        assert_eq!(day_cells(&render(&index, 2024, 11)).len(), 31);
    }

    #[test]
    fn test_cells_in_order() {
        let index = DateRangeIndex::new(&[]);
        let month = render(&index, 2024, 2);
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), Month::March);
        let days = day_cells(&month);
        assert_eq!(days[0].date, date!(2024 - 03 - 01));
        assert_eq!(days[30].date, date!(2024 - 03 - 31));
        assert!(days.iter().zip(1..).all(|(dc, d)| dc.day() == d));
    }

    #[test]
    fn test_weeks() {
        let index = DateRangeIndex::new(&[]);
        // March 2024: 5 blanks + 31 days = 36 cells
        let month = render(&index, 2024, 2);
        let lens = month.weeks().map(<[Cell<'_>]>::len).collect::<Vec<_>>();
        assert_eq!(lens, [7, 7, 7, 7, 7, 1]);
        // February 2015 fills exactly four rows
        let month = render(&index, 2015, 1);
        let lens = month.weeks().map(<[Cell<'_>]>::len).collect::<Vec<_>>();
        assert_eq!(lens, [7, 7, 7, 7]);
    }

    #[test]
    fn test_today() {
        let index = DateRangeIndex::new(&[]);
        let month = render(&index, 2024, 2);
        let todays = day_cells(&month)
            .into_iter()
            .filter(|dc| dc.is_today)
            .map(|dc| dc.date)
            .collect::<Vec<_>>();
        assert_eq!(todays, [TODAY]);
        let month = render(&index, 2025, 2);
        assert!(day_cells(&month).iter().all(|dc| !dc.is_today));
    }

    #[test]
    fn test_occupancy() {
        let projects = sample();
        let index = DateRangeIndex::new(&projects);
        let month = render(&index, 2024, 2);
        let booked = day_cells(&month)
            .into_iter()
            .filter(|dc| !dc.occupants.is_empty())
            .map(|dc| (dc.day(), dc.occupants.len()))
            .collect::<Vec<_>>();
        assert_eq!(
            booked,
            [
                (10, 1),
                (11, 1),
                (12, 2),
                (13, 1),
                (14, 1),
                (15, 1),
                (16, 1),
                (17, 1),
                (18, 1),
                (19, 1),
                (20, 1)
            ]
        );
        assert_eq!(month.day(9).unwrap().visual, Visual::Unmarked);
        assert_eq!(month.day(9).unwrap().tooltip(), "");
    }

    #[test]
    fn test_solid_fill() {
        let projects = sample();
        let index = DateRangeIndex::new(&projects);
        let month = render(&index, 2024, 2);
        let dc = month.day(10).unwrap();
        assert_eq!(
            dc.visual,
            Visual::Solid {
                fill: Some(Rgb::new(0xFF, 0xCA, 0x3A)),
                text: Some(Rgb::BLACK)
            }
        );
        assert_eq!(dc.tooltip(), "Henderson Deck");
        let dc = month.day(13).unwrap();
        assert_eq!(
            dc.visual,
            Visual::Solid {
                fill: Some(Rgb::new(0x19, 0x82, 0xC4)),
                text: Some(Rgb::WHITE)
            }
        );
    }

    #[test]
    fn test_segmented_fill() {
        let projects = sample();
        let index = DateRangeIndex::new(&projects);
        let month = render(&index, 2024, 2);
        let dc = month.day(12).unwrap();
        assert_eq!(dc.tooltip(), "Henderson Deck, Okafor Kitchen");
        let Visual::Segmented { bands, text } = &dc.visual else {
            panic!("expected a segmented fill, got {:?}", dc.visual);
        };
        assert_eq!(*text, Some(Rgb::BLACK));
        assert_eq!(
            bands,
            &[
                Band {
                    color: Some(Rgb::new(0xFF, 0xCA, 0x3A)),
                    index: 0,
                    count: 2
                },
                Band {
                    color: Some(Rgb::new(0x19, 0x82, 0xC4)),
                    index: 1,
                    count: 2
                },
            ]
        );
        assert_eq!(
            dc.visual.css_background().unwrap(),
            "linear-gradient(to bottom, #FFCA3A 0%, #FFCA3A 50%, #1982C4 50%, #1982C4 100%)"
        );
    }

    #[test]
    fn test_band_percentages() {
        let band = |index| Band {
            color: Some(Rgb::BLACK),
            index,
            count: 4,
        };
        let spans = (0..4)
            .map(|i| format!("{}-{}", band(i).start_percent(), band(i).end_percent()))
            .collect::<Vec<_>>();
        assert_eq!(spans, ["0-25", "25-50", "50-75", "75-100"]);
    }

    #[test]
    fn test_fill_at() {
        let a = Rgb::new(1, 1, 1);
        let b = Rgb::new(2, 2, 2);
        let c = Rgb::new(3, 3, 3);
        let band = |color, index, count| Band {
            color: Some(color),
            index,
            count,
        };
        let two = Visual::Segmented {
            bands: vec![band(a, 0, 2), band(b, 1, 2)],
            text: Some(Rgb::WHITE),
        };
        assert_eq!(
            (0..4).map(|col| two.fill_at(col, 4)).collect::<Vec<_>>(),
            [Some(a), Some(a), Some(b), Some(b)]
        );
        let three = Visual::Segmented {
            bands: vec![band(a, 0, 3), band(b, 1, 3), band(c, 2, 3)],
            text: Some(Rgb::WHITE),
        };
        assert_eq!(
            (0..3).map(|col| three.fill_at(col, 3)).collect::<Vec<_>>(),
            [Some(a), Some(b), Some(c)]
        );
        assert_eq!(Visual::Unmarked.fill_at(0, 3), None);
        let solid = Visual::Solid {
            fill: Some(c),
            text: Some(Rgb::WHITE),
        };
        assert_eq!(solid.fill_at(2, 3), Some(c));
    }

    #[test]
    fn test_uncolored_project_is_unfilled() {
        let projects = vec![
            project("Roof", "red", "2024-03-10", "2024-03-12"),
            project("Okafor Kitchen", "#1982c4", "2024-03-12", "2024-03-20"),
        ];
        let index = DateRangeIndex::new(&projects);
        let month = render(&index, 2024, 2);
        let dc = month.day(11).unwrap();
        assert_eq!(dc.tooltip(), "Roof");
        assert_eq!(
            dc.visual,
            Visual::Solid {
                fill: None,
                text: None
            }
        );
        assert_eq!(dc.visual.fill_at(0, 3), None);
        assert_eq!(dc.visual.text_color(), None);
        assert_eq!(dc.visual.css_background(), None);
        let dc = month.day(12).unwrap();
        assert_eq!(dc.tooltip(), "Roof, Okafor Kitchen");
        assert_eq!(dc.visual.text_color(), None);
        let kitchen = Some(Rgb::new(0x19, 0x82, 0xC4));
        assert_eq!(
            (0..4).map(|col| dc.visual.fill_at(col, 4)).collect::<Vec<_>>(),
            [None, None, kitchen, kitchen]
        );
        assert_eq!(
            dc.visual.css_background().unwrap(),
            "linear-gradient(to bottom, transparent 0%, transparent 50%, \
             #1982C4 50%, #1982C4 100%)"
        );
    }

    #[test]
    fn test_css_three_bands() {
        let band = |color, index| Band {
            color: Some(color),
            index,
            count: 3,
        };
        let visual = Visual::Segmented {
            bands: vec![
                band(Rgb::new(0x11, 0x11, 0x11), 0),
                band(Rgb::new(0x22, 0x22, 0x22), 1),
                band(Rgb::new(0x33, 0x33, 0x33), 2),
            ],
            text: Some(Rgb::WHITE),
        };
        assert_eq!(
            visual.css_background().unwrap(),
            "linear-gradient(to bottom, #111111 0%, #111111 33.33%, #222222 33.33%, \
             #222222 66.67%, #333333 66.67%, #333333 100%)"
        );
    }

    #[test]
    fn test_idempotent() {
        let projects = sample();
        let index = DateRangeIndex::new(&projects);
        let first = render(&index, 2024, 2);
        let second = render(&index, 2024, 2);
        assert_eq!(first, second);
        let rebuilt = DateRangeIndex::new(&projects);
        assert_eq!(first, render(&rebuilt, 2024, 2));
    }

    #[test]
    fn test_invalid_requests() {
        let index = DateRangeIndex::new(&[]);
        assert_eq!(
            CalendarMonth::render(&index, 2024, 12, TODAY),
            Err(InvalidMonthRequest::MonthIndex(12))
        );
        assert_eq!(
            CalendarMonth::render(&index, 2024, u8::MAX, TODAY),
            Err(InvalidMonthRequest::MonthIndex(u8::MAX))
        );
        assert_eq!(
            CalendarMonth::render(&index, 0, 0, TODAY),
            Err(InvalidMonthRequest::Year(0))
        );
        assert_eq!(
            CalendarMonth::render(&index, -44, 2, TODAY),
            Err(InvalidMonthRequest::Year(-44))
        );
        assert_eq!(
            CalendarMonth::render(&index, 100_000, 2, TODAY),
            Err(InvalidMonthRequest::Year(100_000))
        );
    }
}
