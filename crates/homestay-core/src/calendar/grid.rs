use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::datetime::CalendarMonth;
use crate::room::BookedInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Empty,
    Past,
    Today,
    Available,
    Booked,
}

impl DayStatus {
    pub fn as_key(self) -> &'static str {
        match self {
            DayStatus::Empty => "empty",
            DayStatus::Past => "past",
            DayStatus::Today => "today",
            DayStatus::Available => "available",
            DayStatus::Booked => "booked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    #[serde(serialize_with = "serialize_cell_date")]
    pub date: Option<NaiveDate>,
    pub status: DayStatus,
}

impl DayCell {
    pub fn empty() -> Self {
        Self {
            date: None,
            status: DayStatus::Empty,
        }
    }

    /// `YYYY-MM-DD`, or an empty string for alignment filler.
    pub fn iso(&self) -> String {
        self.date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

fn serialize_cell_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(value) => serializer.serialize_str(&value.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

/// Booked nights keyed by date; a night covered by several stays is stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookedLookup {
    dates: HashSet<NaiveDate>,
}

impl BookedLookup {
    /// Only expands the nights that fall inside `[first, last]`.
    pub fn for_range(intervals: &[BookedInterval], first: NaiveDate, last: NaiveDate) -> Self {
        let mut dates = HashSet::new();
        for interval in intervals.iter().filter(|interval| interval.is_valid()) {
            let start = interval.check_in.max(first);
            let Some(end) = interval.check_out.pred_opt().map(|day| day.min(last)) else {
                continue;
            };
            dates.extend(start.iter_days().take_while(|day| *day <= end));
        }
        Self { dates }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Past, then today, then booked, then available. A booked `today` therefore
/// shows as `Today`.
pub fn classify(date: NaiveDate, today: NaiveDate, booked: &BookedLookup) -> DayStatus {
    if date < today {
        DayStatus::Past
    } else if date == today {
        DayStatus::Today
    } else if booked.contains(date) {
        DayStatus::Booked
    } else {
        DayStatus::Available
    }
}

/// Leading filler for a Sunday-first week, followed by one cell per day.
pub fn build_month_grid(
    month: CalendarMonth,
    intervals: &[BookedInterval],
    today: NaiveDate,
) -> Vec<DayCell> {
    let first = month.first_day();
    let last = month.last_day();
    let leading = first.weekday().num_days_from_sunday() as usize;
    let booked = BookedLookup::for_range(intervals, first, last);

    let mut cells = Vec::with_capacity(leading + month.days_in_month() as usize);
    cells.extend(std::iter::repeat_n(DayCell::empty(), leading));
    cells.extend(
        first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| DayCell {
                date: Some(day),
                status: classify(day, today, &booked),
            }),
    );
    cells
}

/// Same as [`build_month_grid`] but takes a raw zero-based month that may
/// overflow in either direction.
pub fn build_month_grid_ym(
    year: i32,
    month: i64,
    intervals: &[BookedInterval],
    today: NaiveDate,
) -> Vec<DayCell> {
    build_month_grid(CalendarMonth::new(year, month), intervals, today)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub month: CalendarMonth,
    pub label: String,
    pub cells: Vec<DayCell>,
}

impl MonthView {
    pub fn build(month: CalendarMonth, intervals: &[BookedInterval], today: NaiveDate) -> Self {
        Self {
            month,
            label: month.label(),
            cells: build_month_grid(month, intervals, today),
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    pub fn count(&self, status: DayStatus) -> usize {
        self.cells.iter().filter(|cell| cell.status == status).count()
    }
}
