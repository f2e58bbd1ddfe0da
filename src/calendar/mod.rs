mod index;
mod month;
mod util;
mod widget;
mod window;
pub(crate) use self::index::{parse_ymd, DateRangeIndex, DateSpan};
pub(crate) use self::month::{CalendarMonth, DayCell};
pub(crate) use self::widget::CalendarGrid;
pub(crate) use self::window::MonthWindow;
