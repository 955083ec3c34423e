//! Availability calendar: month grids, the four-month carousel and gesture input.

pub mod carousel;
pub mod grid;
pub mod swipe;

pub use carousel::{
    CalendarController, CarouselSettings, CarouselState, NavigationCommand, NavigationOutcome,
};
pub use grid::{BookedLookup, DayCell, DayStatus, MonthView, build_month_grid, classify};
pub use swipe::{DEFAULT_SWIPE_THRESHOLD, interpret_swipe};
