use super::util::{shift_days, YearMonth};
use std::num::NonZeroUsize;
use thiserror::Error;
use time::Date;

/// Number of months shown before the widget has measured the screen
const DEFAULT_PAGE: NonZeroUsize = match NonZeroUsize::new(12) {
    Some(n) => n,
    None => unreachable!(),
};

/// Which months are on screen and which day is selected.
///
/// The window starts at `start` and covers `page_len` consecutive months;
/// the selected day is always kept inside it.  "Today" is never read from a
/// clock here; it is handed in by whoever owns the window.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthWindow {
    today: Date,
    start: YearMonth,
    selected: Date,
    page_len: NonZeroUsize,
}

impl MonthWindow {
    pub(crate) fn new(today: Date) -> Self {
        MonthWindow {
            today,
            start: YearMonth::of(today),
            selected: today,
            page_len: DEFAULT_PAGE,
        }
    }

    /// Open the window on `date` instead of today
    pub(crate) fn start_date(mut self, date: Date) -> Self {
        self.jump_to_date(date);
        self
    }

    pub(crate) fn today(&self) -> Date {
        self.today
    }

    pub(crate) fn selected(&self) -> Date {
        self.selected
    }

    pub(crate) fn first_month(&self) -> YearMonth {
        self.start
    }

    /// Resize the window to `qty` months and return the months in it.  The
    /// list comes up short when the window runs into the end of the
    /// calendar.
    pub(crate) fn ensure_months(&mut self, qty: NonZeroUsize) -> Vec<YearMonth> {
        self.page_len = qty;
        self.reveal_selected();
        self.months()
    }

    pub(crate) fn months(&self) -> Vec<YearMonth> {
        std::iter::successors(Some(self.start), |ym| ym.next())
            .take(self.page_len.get())
            .collect()
    }

    /// Adopt a new "today", as after midnight.  A window that was showing the
    /// current month moves along with it, as does a selection that was on
    /// the old today.
    pub(crate) fn set_today(&mut self, today: Date) {
        let old = std::mem::replace(&mut self.today, today);
        if old == today {
            return;
        }
        if self.start.contains(old) {
            self.start = YearMonth::of(today);
        }
        if self.selected == old {
            self.selected = today;
        }
        self.reveal_selected();
    }

    pub(crate) fn jump_to_today(&mut self) {
        self.start = YearMonth::of(self.today);
        self.selected = self.today;
    }

    pub(crate) fn jump_to_date(&mut self, date: Date) {
        self.start = YearMonth::of(date);
        self.selected = date;
    }

    /// Move the selection by `days` days, scrolling as needed
    pub(crate) fn move_selection(&mut self, days: i64) -> Result<(), OutOfTimeError> {
        self.selected = shift_days(self.selected, days).ok_or(OutOfTimeError)?;
        self.reveal_selected();
        Ok(())
    }

    pub(crate) fn one_month_forwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(1)
    }

    pub(crate) fn one_month_backwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(-1)
    }

    pub(crate) fn one_page_forwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(self.page_len_i64())
    }

    pub(crate) fn one_page_backwards(&mut self) -> Result<(), OutOfTimeError> {
        self.scroll(-self.page_len_i64())
    }

    fn page_len_i64(&self) -> i64 {
        i64::try_from(self.page_len.get()).unwrap_or(i64::MAX)
    }

    fn last_month(&self) -> YearMonth {
        self.start
            .step(self.page_len_i64() - 1)
            .unwrap_or(self.start)
    }

    fn scroll(&mut self, months: i64) -> Result<(), OutOfTimeError> {
        let start = self.start.step(months).ok_or(OutOfTimeError)?;
        if months > 0 && self.last_month().next().is_none() {
            // The last month of the calendar is already on screen
            return Err(OutOfTimeError);
        }
        self.start = start;
        // Drag the selection along if it scrolled off screen
        let first = self.start;
        let last = self.last_month();
        let sel = YearMonth::of(self.selected);
        if sel.ordinal() < first.ordinal() {
            self.selected = first.first_day().unwrap_or(self.selected);
        } else if sel.ordinal() > last.ordinal() {
            self.selected = last.first_day().unwrap_or(self.selected);
        }
        Ok(())
    }

    fn reveal_selected(&mut self) {
        let sel = YearMonth::of(self.selected);
        if sel.ordinal() < self.start.ordinal() {
            self.start = sel;
        } else if sel.ordinal() > self.last_month().ordinal() {
            self.start = sel.step(1 - self.page_len_i64()).unwrap_or(sel);
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;
