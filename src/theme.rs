use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const MONTH_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.fg(Color::Gray);

/// Added on top of a day's fill to mark today's date
pub(crate) const TODAY_MODIFIER: Modifier = Modifier::BOLD.union(Modifier::UNDERLINED);

/// Added on top of a day's fill to mark the selected date
pub(crate) const SELECTED_MODIFIER: Modifier = Modifier::REVERSED;

/// Projects in the project list that are missing from the calendar
pub(crate) const HIDDEN_PROJECT_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const STATUS_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Gray);

pub(crate) const NOTICE_STYLE: Style = STATUS_STYLE.fg(Color::Red);

pub(crate) mod jumpto {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
