use crate::calendar::{CalendarGrid, CalendarMonth, DateRangeIndex, DayCell, MonthWindow};
use crate::clock::{Clock, ClockError};
use crate::help::Help;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::project::{Project, ProjectSource};
use crate::projlist::{ProjectList, ProjectListState};
use crate::theme::{BASE_STYLE, NOTICE_STYLE, STATUS_STYLE};
use anyhow::Context;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{StatefulWidget, Widget},
    DefaultTerminal,
};
use std::io::{self, Write};
use std::time::Duration;
use time::Date;

/// How long to wait for input when the time until midnight is unknown
const FALLBACK_TICK: Duration = Duration::from_secs(60 * 60);

/// Lines scrolled by a page key in the project list
const LIST_PAGE: usize = 10;

#[derive(Debug)]
pub(crate) struct App<C, P> {
    clock: C,
    source: P,
    projects: Vec<Project>,
    /// Records skipped by the source plus projects the calendar cannot show
    ignored: usize,
    load_error: Option<String>,
    window: MonthWindow,
    state: AppState,
}

impl<C: Clock, P: ProjectSource> App<C, P> {
    pub(crate) fn new(clock: C, source: P, start: Option<Date>) -> Result<Self, ClockError> {
        let mut window = MonthWindow::new(clock.today()?);
        if let Some(date) = start {
            window = window.start_date(date);
        }
        let mut app = App {
            clock,
            source,
            projects: Vec::new(),
            ignored: 0,
            load_error: None,
            window,
            state: AppState::Calendar,
        };
        app.reload();
        Ok(app)
    }

    pub(crate) fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        while !self.quitting() {
            self.draw(&mut terminal)?;
            let timeout = match self.clock.until_midnight() {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Cannot tell when the date will change: {e}");
                    FALLBACK_TICK
                }
            };
            if poll(timeout).context("failed to poll for terminal events")? {
                let event = read().context("failed to read terminal event")?;
                self.handle_event(event)
                    .context("failed to write to terminal")?;
            } else {
                self.refresh_today()?;
            }
        }
        Ok(())
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        terminal
            .draw(|frame| frame.render_widget(self, frame.area()))
            .context("failed to draw calendar")?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = event.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => match key {
                KeyCode::Char('h') | KeyCode::Left => self.window.move_selection(-1).is_ok(),
                KeyCode::Char('l') | KeyCode::Right => self.window.move_selection(1).is_ok(),
                KeyCode::Char('k') | KeyCode::Up => self.window.move_selection(-7).is_ok(),
                KeyCode::Char('j') | KeyCode::Down => self.window.move_selection(7).is_ok(),
                KeyCode::Char('[') => self.window.one_month_backwards().is_ok(),
                KeyCode::Char(']') => self.window.one_month_forwards().is_ok(),
                KeyCode::Char('w') | KeyCode::PageUp => self.window.one_page_backwards().is_ok(),
                KeyCode::Char('z') | KeyCode::PageDown => self.window.one_page_forwards().is_ok(),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.window.jump_to_today();
                    true
                }
                KeyCode::Char('g') => {
                    self.state = AppState::Jumping(JumpToState::new());
                    true
                }
                KeyCode::Char('p') => {
                    self.state = AppState::Listing(ProjectListState::new());
                    true
                }
                KeyCode::Char('r') => {
                    self.reload();
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Jumping(state) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    let output = match key {
                        KeyCode::Char(c) => match c.to_digit(10).and_then(|d| u8::try_from(d).ok())
                        {
                            Some(d) => state.handle_input(JumpToInput::Digit(d)),
                            None => JumpToOutput::Invalid,
                        },
                        KeyCode::Backspace | KeyCode::Delete => {
                            state.handle_input(JumpToInput::Backspace)
                        }
                        KeyCode::Enter => state.handle_input(JumpToInput::Enter),
                        _ => JumpToOutput::Invalid,
                    };
                    match output {
                        JumpToOutput::Ok => true,
                        JumpToOutput::Invalid => false,
                        JumpToOutput::Jump(date) => {
                            self.state = AppState::Calendar;
                            self.window.jump_to_date(date);
                            true
                        }
                    }
                }
            }
            AppState::Listing(state) => match key {
                KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
                KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
                KeyCode::Char('z') | KeyCode::PageDown => state.scroll_down(LIST_PAGE),
                KeyCode::Char('w') | KeyCode::PageUp => state.scroll_up(LIST_PAGE),
                KeyCode::Char('p' | 'q') | KeyCode::Esc => {
                    self.state = AppState::Calendar;
                    true
                }
                _ => false,
            },
            AppState::Quitting => false,
        }
    }

    /// Replace the projects with a fresh load from the source.  If the load
    /// fails, the projects from the last good load stay on screen and the
    /// failure is shown in the status line.
    fn reload(&mut self) {
        match self.source.load() {
            Ok(snapshot) => {
                self.projects = snapshot.projects;
                self.load_error = None;
                let index = DateRangeIndex::new(&self.projects);
                let mut rejected = 0;
                for (p, e) in index.rejected() {
                    log::warn!("Not showing project {:?} ({}): {e}", p.name, p.id);
                    rejected += 1;
                }
                for (p, e) in index.unpainted() {
                    log::warn!("Project {:?} ({}) has no usable color: {e}", p.name, p.id);
                }
                self.ignored = snapshot.skipped + rejected;
            }
            Err(e) => {
                let e = anyhow::Error::from(e);
                log::error!("Failed to load projects: {e:#}");
                self.load_error = Some(format!("{e:#}"));
            }
        }
    }

    /// Pick up a change of date, as when the loop wakes at midnight
    fn refresh_today(&mut self) -> anyhow::Result<()> {
        let today = self
            .clock
            .today()
            .context("failed to determine local date")?;
        if today != self.window.today() {
            self.window.set_today(today);
            log::info!(
                "Date changed to {today}; calendar starts at {}",
                self.window.first_month()
            );
        }
        Ok(())
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }
}

impl<C, P> App<C, P> {
    fn status_text(&self, index: &DateRangeIndex<'_>) -> String {
        let selected = self.window.selected();
        let tooltip = CalendarMonth::render(
            index,
            selected.year(),
            u8::from(selected.month()) - 1,
            self.window.today(),
        )
        .ok()
        .and_then(|month| month.day(selected.day()).map(DayCell::tooltip))
        .unwrap_or_default();
        if tooltip.is_empty() {
            format!(" {} {selected}", selected.weekday())
        } else {
            format!(" {} {selected}: {tooltip}", selected.weekday())
        }
    }

    fn notice(&self) -> Option<String> {
        match (&self.load_error, self.ignored) {
            (Some(e), _) => Some(format!("{e} ")),
            (None, 0) => None,
            (None, 1) => Some(String::from("1 project not shown ")),
            (None, n) => Some(format!("{n} projects not shown ")),
        }
    }
}

impl<C, P> Widget for &mut App<C, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let layout = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]);
        let [cal_area, status_area] = layout.areas(area);
        let index = DateRangeIndex::new(&self.projects);
        let grid = CalendarGrid::new(&index);
        grid.render(cal_area, buf, &mut self.window);
        buf.set_style(status_area, STATUS_STYLE);
        let status = Line::styled(self.status_text(&index), STATUS_STYLE);
        status.render(status_area, buf);
        if let Some(notice) = self.notice() {
            Line::from(Span::styled(notice, NOTICE_STYLE))
                .right_aligned()
                .render(status_area, buf);
        }
        match &mut self.state {
            AppState::Helping => Help(BASE_STYLE).render(cal_area, buf),
            AppState::Jumping(state) => JumpTo.render(cal_area, buf, state),
            AppState::Listing(state) => {
                let list = ProjectList::new(&self.projects, &index);
                list.render(cal_area, buf, state);
            }
            AppState::Calendar | AppState::Quitting => (),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Jumping(JumpToState),
    Listing(ProjectListState),
    Quitting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::FixedClock;
    use crate::project::{project, LoadError, Snapshot};
    use std::cell::RefCell;
    use time::macros::{date, datetime};

    /// A source serving whatever snapshot the test last put in it, or a
    /// "file not found" error when it holds none
    #[derive(Debug, Default)]
    struct Stub(RefCell<Option<Snapshot>>);

    impl Stub {
        fn new(projects: Vec<Project>, skipped: usize) -> Stub {
            Stub(RefCell::new(Some(Snapshot { projects, skipped })))
        }
    }

    impl ProjectSource for Stub {
        fn load(&self) -> Result<Snapshot, LoadError> {
            self.0.borrow().clone().ok_or_else(|| LoadError::Read {
                path: "projects.json".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }

    fn sample() -> Vec<Project> {
        vec![
            project("Henderson Deck", "#ffca3a", "2024-03-10", "2024-03-12"),
            project("Okafor Kitchen", "#1982c4", "2024-03-12", "2024-03-20"),
        ]
    }

    fn app(now: time::OffsetDateTime, source: Stub) -> App<FixedClock, Stub> {
        App::new(FixedClock::new(now), source, None).unwrap()
    }

    fn draw(app: &mut App<FixedClock, Stub>) -> Buffer {
        let area = Rect::new(0, 0, 80, 18);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn test_status_line() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(sample(), 0));
        let buffer = draw(&mut app);
        assert_eq!(
            row_text(&buffer, 17).trim_end(),
            " Monday 2024-03-11: Henderson Deck"
        );
        assert_eq!(buffer[(0, 17)].bg, STATUS_STYLE.bg.unwrap());
        assert!(app.handle_key(KeyCode::Char('l')));
        let buffer = draw(&mut app);
        assert_eq!(
            row_text(&buffer, 17).trim_end(),
            " Tuesday 2024-03-12: Henderson Deck, Okafor Kitchen"
        );
        assert!(app.handle_key(KeyCode::Char('j')));
        assert!(app.handle_key(KeyCode::Char('j')));
        let buffer = draw(&mut app);
        assert_eq!(row_text(&buffer, 17).trim_end(), " Tuesday 2024-03-26");
    }

    #[test]
    fn test_ignored_notice() {
        let mut projects = sample();
        projects.push(project("Bad Color", "teal", "2024-03-01", "2024-03-02"));
        projects.push(project("Backwards", "#6a4c93", "2024-03-09", "2024-03-01"));
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(projects, 1));
        let buffer = draw(&mut app);
        let status = row_text(&buffer, 17);
        assert!(status.ends_with(" 2 projects not shown "), "{status:?}");
        assert_eq!(buffer[(79, 17)].fg, NOTICE_STYLE.fg.unwrap());
        // The project with an unreadable color is still on the calendar
        app.window.jump_to_date(date!(2024 - 03 - 02));
        let index = DateRangeIndex::new(&app.projects);
        assert_eq!(app.status_text(&index), " Saturday 2024-03-02: Bad Color");
    }

    #[test]
    fn test_failed_reload_keeps_projects() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(sample(), 0));
        assert_eq!(app.notice(), None);
        *app.source.0.borrow_mut() = None;
        assert!(app.handle_key(KeyCode::Char('r')));
        assert_eq!(app.projects, sample());
        let notice = app.notice().unwrap();
        assert!(notice.starts_with("failed to read projects.json: "), "{notice:?}");
        *app.source.0.borrow_mut() = Some(Snapshot::from_json(serde_json::json!([])).unwrap());
        assert!(app.handle_key(KeyCode::Char('r')));
        assert!(app.projects.is_empty());
        assert_eq!(app.notice(), None);
    }

    #[test]
    fn test_load_failure_on_start() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::default());
        assert!(app.projects.is_empty());
        let buffer = draw(&mut app);
        assert!(row_text(&buffer, 17).contains("failed to read projects.json"));
    }

    #[test]
    fn test_midnight_refresh() {
        let mut app = app(datetime!(2024-03-31 23:59 -4), Stub::new(sample(), 0));
        assert_eq!(app.window.today(), date!(2024 - 03 - 31));
        app.refresh_today().unwrap();
        assert_eq!(app.window.today(), date!(2024 - 03 - 31));
        app.clock.set(datetime!(2024-04-01 00:00:01 -4));
        app.refresh_today().unwrap();
        assert_eq!(app.window.today(), date!(2024 - 04 - 01));
        assert_eq!(app.window.selected(), date!(2024 - 04 - 01));
        assert_eq!(app.window.first_month().to_string(), "April 2024");
    }

    #[test]
    fn test_start_date() {
        let app = App::new(
            FixedClock::new(datetime!(2024-03-11 09:00 UTC)),
            Stub::new(sample(), 0),
            Some(date!(2025 - 07 - 04)),
        )
        .unwrap();
        assert_eq!(app.window.selected(), date!(2025 - 07 - 04));
        assert_eq!(app.window.today(), date!(2024 - 03 - 11));
    }

    #[test]
    fn test_jump_to_date() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(sample(), 0));
        assert!(app.handle_key(KeyCode::Char('g')));
        for c in "2024122".chars() {
            assert!(app.handle_key(KeyCode::Char(c)));
        }
        assert!(!app.handle_key(KeyCode::Enter));
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Char('5')));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Calendar);
        assert_eq!(app.window.selected(), date!(2024 - 12 - 25));
        assert!(app.handle_key(KeyCode::Home));
        assert_eq!(app.window.selected(), date!(2024 - 03 - 11));
    }

    #[test]
    fn test_overlays() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(sample(), 0));
        assert!(app.handle_key(KeyCode::Char('?')));
        assert_eq!(app.state, AppState::Helping);
        let buffer = draw(&mut app);
        assert!((0..17).any(|y| row_text(&buffer, y).contains(" Commands ")));
        assert!(app.handle_key(KeyCode::Char('x')));
        assert_eq!(app.state, AppState::Calendar);
        assert!(app.handle_key(KeyCode::Char('p')));
        let buffer = draw(&mut app);
        assert!((0..17).any(|y| row_text(&buffer, y).contains(" Projects (2) ")));
        assert!(!app.handle_key(KeyCode::Down));
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Calendar);
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.quitting());
    }

    #[test]
    fn test_scroll_keys() {
        let mut app = app(datetime!(2024-03-11 09:00 UTC), Stub::new(sample(), 0));
        // Fit the window to the 3x2 grid of an 80x18 screen
        draw(&mut app);
        assert!(app.handle_key(KeyCode::Char(']')));
        assert_eq!(app.window.first_month().to_string(), "April 2024");
        assert_eq!(app.window.selected(), date!(2024 - 04 - 01));
        assert!(app.handle_key(KeyCode::PageDown));
        assert_eq!(app.window.first_month().to_string(), "October 2024");
        assert!(app.handle_key(KeyCode::Char('w')));
        assert!(app.handle_key(KeyCode::Char('[')));
        assert_eq!(app.window.first_month().to_string(), "March 2024");
    }
}
