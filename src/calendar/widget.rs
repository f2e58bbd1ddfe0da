use super::index::DateRangeIndex;
use super::month::{CalendarMonth, Cell};
use super::window::MonthWindow;
use crate::theme::{BASE_STYLE, MONTH_STYLE, SELECTED_MODIFIER, TODAY_MODIFIER, WEEKDAY_STYLE};
use ratatui::prelude::*;
use std::num::NonZeroUsize;
use time::Date;

static HEADER: &str = "Su Mo Tu We Th Fr Sa";

/// Number of columns per day of week
const DAY_WIDTH: u16 = 3;

/// Number of columns spanned by the digits of a day; the remaining column of
/// the cell is padding
const DIGITS_WIDTH: u16 = 2;

/// Width of one month in columns
const MONTH_WIDTH: u16 = DAY_WIDTH * 7;

/// Title, weekday header, and at most six weeks
const MONTH_HEIGHT: u16 = 8;

/// Columns between months placed side by side
const MONTH_GUTTER: u16 = 3;

/// Lines between rows of months
const ROW_GAP: u16 = 1;

/// Never show more than a year at once
const MAX_MONTHS: usize = 12;

/// Draws as many months of a `MonthWindow` as fit, left to right and then
/// top to bottom
#[derive(Clone, Copy, Debug)]
pub(crate) struct CalendarGrid<'a, 'b> {
    index: &'b DateRangeIndex<'a>,
}

impl<'a, 'b> CalendarGrid<'a, 'b> {
    pub(crate) fn new(index: &'b DateRangeIndex<'a>) -> Self {
        CalendarGrid { index }
    }

    fn columns_for_width(width: u16) -> u16 {
        let cols = width.saturating_add(MONTH_GUTTER) / (MONTH_WIDTH + MONTH_GUTTER);
        cols.max(1)
    }

    fn rows_for_height(height: u16) -> u16 {
        let rows = height.saturating_add(ROW_GAP) / (MONTH_HEIGHT + ROW_GAP);
        rows.max(1)
    }
}

impl StatefulWidget for CalendarGrid<'_, '_> {
    type State = MonthWindow;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let cols = Self::columns_for_width(area.width);
        let rows = Self::rows_for_height(area.height);
        let qty = (usize::from(cols) * usize::from(rows)).min(MAX_MONTHS);
        let Some(qty) = NonZeroUsize::new(qty) else {
            return;
        };
        let months = state.ensure_months(qty);
        let used_cols = u16::try_from(months.len())
            .unwrap_or(u16::MAX)
            .min(cols);
        let total_width = used_cols * MONTH_WIDTH + used_cols.saturating_sub(1) * MONTH_GUTTER;
        let left = area.width.saturating_sub(total_width) / 2;
        let (today, selected) = (state.today(), state.selected());
        for (i, ym) in std::iter::zip(0u16.., months) {
            let (row, col) = (i / cols, i % cols);
            let rect = Rect {
                x: area
                    .x
                    .saturating_add(left)
                    .saturating_add(col * (MONTH_WIDTH + MONTH_GUTTER)),
                y: area.y.saturating_add(row * (MONTH_HEIGHT + ROW_GAP)),
                width: MONTH_WIDTH,
                height: MONTH_HEIGHT,
            }
            .intersection(area);
            match CalendarMonth::render(self.index, ym.year, ym.index0(), today) {
                Ok(month) => MonthView::new(&month, selected).render(rect, buf),
                Err(e) => log::debug!("Not drawing {ym}: {e}"),
            }
        }
    }
}

/// A single month: title, weekday header, and the day cells filled with the
/// colors of the projects booked on them
#[derive(Clone, Copy, Debug)]
pub(crate) struct MonthView<'a, 'b> {
    month: &'b CalendarMonth<'a>,
    selected: Date,
}

impl<'a, 'b> MonthView<'a, 'b> {
    pub(crate) fn new(month: &'b CalendarMonth<'a>, selected: Date) -> Self {
        MonthView { month, selected }
    }
}

impl Widget for MonthView<'_, '_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = BufferCanvas::new(area, buf);
        let title = format!("{} {}", self.month.month(), self.month.year());
        let title_width = u16::try_from(title.len()).unwrap_or(u16::MAX);
        let title_x = MONTH_WIDTH.saturating_sub(title_width) / 2;
        canvas.mvprint(0, title_x, &title, MONTH_STYLE);
        canvas.mvprint(1, 0, HEADER, WEEKDAY_STYLE);
        for (week_no, week) in std::iter::zip(0u16.., self.month.weeks()) {
            let y = week_no + 2;
            for (wd, cell) in std::iter::zip(0u16.., week) {
                let Cell::Day(dc) = cell else {
                    continue;
                };
                let text = format!("{:>2} ", dc.day());
                let text_style = dc
                    .visual
                    .text_color()
                    .map_or(BASE_STYLE, |c| BASE_STYLE.fg(c.into()));
                for (i, ch) in std::iter::zip(0u16.., text.chars()) {
                    let mut style = match dc.visual.fill_at(i, DAY_WIDTH) {
                        Some(fill) => text_style.bg(fill.into()),
                        None => text_style,
                    };
                    if dc.is_today && i < DIGITS_WIDTH {
                        style = style.add_modifier(TODAY_MODIFIER);
                    }
                    if dc.date == self.selected {
                        style = style.add_modifier(SELECTED_MODIFIER);
                    }
                    canvas.mvaddch(y, wd * DAY_WIDTH + i, ch, style);
                }
            }
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvaddch(&mut self, y: u16, x: u16, ch: char, style: Style) {
        if y < self.area.height && x < self.area.width {
            if let Some(cell) = self.buf.cell_mut((x + self.area.x, y + self.area.y)) {
                cell.set_char(ch).set_style(style);
            }
        }
    }

    fn mvprint(&mut self, y: u16, x: u16, s: &str, style: Style) {
        if y < self.area.height && x < self.area.width {
            let _ = self.buf.set_stringn(
                x + self.area.x,
                y + self.area.y,
                s,
                usize::from(self.area.width - x),
                style,
            );
        }
    }
}
