use crate::calendar::{parse_ymd, DateRangeIndex, DateSpan};
use crate::color::Rgb;
use crate::project::Project;
use crate::theme::{BASE_STYLE, HIDDEN_PROJECT_STYLE, MONTH_STYLE};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Clear, StatefulWidget, Widget},
};

/// Widest the overlay gets: swatch, a comfortable name column, and both dates
const LIST_WIDTH: u16 = 64;

/// Columns taken up by `YYYY-MM-DD to YYYY-MM-DD`
const DATES_WIDTH: u16 = 24;

/// Columns taken up by the swatch and the spaces around the name
const SWATCH_WIDTH: u16 = 2;

/// Every project in the snapshot ordered by start date.  The sort is stable,
/// and projects whose start date cannot be read go last in their original
/// order.
pub(crate) fn sorted_by_start(projects: &[Project]) -> Vec<&Project> {
    let mut sorted = projects.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|p| {
        let start = parse_ymd(&p.start_date).ok();
        (start.is_none(), start)
    });
    sorted
}

/// Scrollable overlay listing every project with its color and dates.
/// Projects that the calendar cannot show are dimmed and listed with their
/// dates exactly as stored.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProjectList<'a, 'b> {
    projects: &'a [Project],
    index: &'b DateRangeIndex<'a>,
}

impl<'a, 'b> ProjectList<'a, 'b> {
    pub(crate) fn new(projects: &'a [Project], index: &'b DateRangeIndex<'a>) -> Self {
        ProjectList { projects, index }
    }
}

impl StatefulWidget for ProjectList<'_, '_> {
    type State = ProjectListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let rows = sorted_by_start(self.projects);
        let width = LIST_WIDTH.min(area.width);
        let height = u16::try_from(rows.len().max(1))
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.height);
        let [list_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [list_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(list_area);
        Clear.render(list_area, buf);
        let block = Block::bordered()
            .title(format!(" Projects ({}) ", rows.len()))
            .title_alignment(Alignment::Center)
            .style(BASE_STYLE);
        let inner = block.inner(list_area);
        block.render(list_area, buf);
        state.fit(rows.len(), usize::from(inner.height));
        if rows.is_empty() {
            Line::styled("No projects", BASE_STYLE)
                .centered()
                .render(inner, buf);
            return;
        }
        for (y, p) in std::iter::zip(
            inner.top()..inner.bottom(),
            rows.into_iter().skip(state.offset),
        ) {
            project_line(p, self.index.span_of(p), inner.width)
                .render(Rect::new(inner.x, y, inner.width, 1), buf);
        }
    }
}

fn project_line(p: &Project, span: Option<DateSpan>, width: u16) -> Line<'static> {
    let swatch = match p.color.parse::<Rgb>() {
        Ok(rgb) => Span::styled("  ", BASE_STYLE.bg(rgb.into())),
        Err(_) => Span::styled("??", BASE_STYLE),
    };
    let name_width = usize::from(width.saturating_sub(SWATCH_WIDTH + DATES_WIDTH + 2));
    let name = p.name.chars().take(name_width).collect::<String>();
    let name = format!(" {name:<name_width$} ");
    match span {
        Some(span) => Line::from_iter([
            swatch,
            Span::styled(name, MONTH_STYLE),
            Span::styled(format!("{} to {}", span.start(), span.end()), BASE_STYLE),
        ]),
        None => Line::from_iter([
            swatch,
            Span::styled(name, HIDDEN_PROJECT_STYLE),
            Span::styled(
                format!("{:>10} to {:>10}", p.start_date, p.end_date),
                HIDDEN_PROJECT_STYLE,
            ),
        ]),
    }
}

/// How far the project list has been scrolled
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct ProjectListState {
    offset: usize,
    /// Largest offset that still fills the list area, as of the last render
    max_offset: usize,
}

impl ProjectListState {
    pub(crate) fn new() -> ProjectListState {
        ProjectListState::default()
    }

    fn fit(&mut self, rows: usize, visible: usize) {
        self.max_offset = rows.saturating_sub(visible);
        self.offset = self.offset.min(self.max_offset);
    }

    /// Returns `false` if already at the bottom
    pub(crate) fn scroll_down(&mut self, lines: usize) -> bool {
        if self.offset < self.max_offset {
            self.offset = self.offset.saturating_add(lines).min(self.max_offset);
            true
        } else {
            false
        }
    }

    /// Returns `false` if already at the top
    pub(crate) fn scroll_up(&mut self, lines: usize) -> bool {
        if self.offset > 0 {
            self.offset = self.offset.saturating_sub(lines);
            true
        } else {
            false
        }
    }
}
