use crate::theme::{
    jumpto::{READY_ENTER_STYLE, UNFILLED_CELL_STYLE},
    BASE_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Clear, StatefulWidget, Widget},
};
use time::{Date, Month};

const OUTER_WIDTH: u16 = 16;
const OUTER_HEIGHT: u16 = 8;

/// Number of digits in a `YYYY-MM-DD` date
const DIGITS: usize = 8;

/// Placeholder shown for each digit that has not been typed yet
static TEMPLATE: &[u8; DIGITS] = b"YYYYMMDD";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct JumpTo;

impl StatefulWidget for JumpTo {
    type State = JumpToState;

    /*
     * ................
     * .┌─ Jump To… ─┐.
     * .│            │.
     * .│ YYYY-MM-DD │.
     * .│            │.
     * .│  [ENTER]   │.
     * .└────────────┘.
     * ................
     */

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [outer_area] = Layout::horizontal([OUTER_WIDTH])
            .flex(Flex::Center)
            .areas(area);
        let [outer_area] = Layout::vertical([OUTER_HEIGHT])
            .flex(Flex::Center)
            .areas(outer_area);
        Clear.render(outer_area, buf);
        Block::new().style(BASE_STYLE).render(outer_area, buf);
        let block_area = outer_area.inner(Margin::new(1, 1));
        Block::bordered()
            .title(" Jump To… ")
            .title_alignment(Alignment::Center)
            .render(block_area, buf);
        let text_area = block_area.inner(Margin::new(1, 1));
        state.to_text().render(text_area, buf);
    }
}

/// The digits typed so far into the jump-to-date prompt
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct JumpToState {
    digits: [u8; DIGITS],
    len: usize,
}

impl JumpToState {
    pub(crate) fn new() -> JumpToState {
        JumpToState::default()
    }

    fn is_complete(&self) -> bool {
        self.len == DIGITS
    }

    fn to_text(self) -> Text<'static> {
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            self.to_line(),
            Line::styled("", BASE_STYLE),
            // Style a span and convert it to a line rather than creating a
            // styled line directly so that only the "[ENTER]" text and not any
            // of its centering padding will be underlined:
            Line::from(Span::styled(
                "[ENTER]",
                if self.is_complete() {
                    READY_ENTER_STYLE
                } else {
                    BASE_STYLE
                },
            )),
        ])
        .centered()
    }

    fn to_line(self) -> Line<'static> {
        let mut spans = Vec::with_capacity(DIGITS + 2);
        for (i, placeholder) in TEMPLATE.iter().enumerate() {
            if i == 4 || i == 6 {
                spans.push(Span::styled("-", BASE_STYLE));
            }
            spans.push(if i < self.len {
                Span::styled(char::from(b'0' + self.digits[i]).to_string(), BASE_STYLE)
            } else {
                Span::styled(char::from(*placeholder).to_string(), UNFILLED_CELL_STYLE)
            });
        }
        Line::from_iter(spans)
    }

    fn number(&self, range: std::ops::Range<usize>) -> u16 {
        self.digits[range]
            .iter()
            .fold(0, |acc, &d| acc * 10 + u16::from(d))
    }

    fn to_date(self) -> Option<Date> {
        let year = i32::from(self.number(0..4));
        let month = Month::try_from(u8::try_from(self.number(4..6)).ok()?).ok()?;
        let day = u8::try_from(self.number(6..8)).ok()?;
        Date::from_calendar_date(year, month, day)
            .ok()
            .filter(|_| year > 0)
    }

    pub(crate) fn handle_input(&mut self, input: JumpToInput) -> JumpToOutput {
        match input {
            JumpToInput::Digit(d) if d < 10 && self.len < DIGITS => {
                self.digits[self.len] = d;
                self.len += 1;
                JumpToOutput::Ok
            }
            JumpToInput::Backspace if self.len > 0 => {
                self.len -= 1;
                JumpToOutput::Ok
            }
            JumpToInput::Enter if self.is_complete() => match self.to_date() {
                Some(date) => JumpToOutput::Jump(date),
                None => JumpToOutput::Invalid,
            },
            _ => JumpToOutput::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToInput {
    Digit(u8),
    Backspace,
    Enter,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToOutput {
    Ok,
    Invalid,
    Jump(Date),
}
