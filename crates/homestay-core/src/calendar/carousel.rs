use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::grid::MonthView;
use crate::datetime::CalendarMonth;
use crate::room::Room;

pub const DEFAULT_ANIMATION_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationCommand {
    Next,
    Previous,
}

impl NavigationCommand {
    pub fn direction(self) -> i32 {
        match self {
            NavigationCommand::Next => 1,
            NavigationCommand::Previous => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    Idle,
    Animating { since: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The anchor moved; the view should slide towards `anchor`.
    Accepted { anchor: CalendarMonth },
    /// A transition is still running. The input is dropped, not queued.
    IgnoredWhileAnimating,
    /// No room has been opened yet.
    NotReady,
}

impl NavigationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, NavigationOutcome::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselSettings {
    /// Upper bound on how long a slide may wait for its completion signal.
    pub animation_timeout: Duration,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            animation_timeout: DEFAULT_ANIMATION_TIMEOUT,
        }
    }
}

/// Owns the focused month for one open calendar session.
///
/// The window is always `[anchor - 1, anchor, anchor + 1, anchor + 2]`: the two
/// middle months are on screen and the outer two are pre-rendered so a slide in
/// either direction has its destination ready before it is revealed.
#[derive(Debug, Clone)]
pub struct CalendarController {
    settings: CarouselSettings,
    room: Option<Room>,
    today: NaiveDate,
    anchor: CalendarMonth,
    state: CarouselState,
    window: Option<[MonthView; 4]>,
}

impl CalendarController {
    pub fn new(settings: CarouselSettings, today: NaiveDate) -> Self {
        Self {
            settings,
            room: None,
            today,
            anchor: CalendarMonth::containing(today),
            state: CarouselState::Idle,
            window: None,
        }
    }

    pub fn open_for_room(&mut self, room: Room, today: NaiveDate) {
        self.open_at(room, today, CalendarMonth::containing(today));
    }

    /// Opens the calendar with `anchor` as the first visible month instead of
    /// the month containing `today`.
    #[tracing::instrument(skip(self, room), fields(room = %room.id))]
    pub fn open_at(&mut self, room: Room, today: NaiveDate, anchor: CalendarMonth) {
        self.today = today;
        self.anchor = anchor;
        self.state = CarouselState::Idle;

        let overlaps = room.overlapping_bookings();
        for (first, second) in &overlaps {
            warn!(
                room = %room.id,
                first = *first,
                second = *second,
                "room has overlapping bookings"
            );
        }

        info!(
            room = %room.id,
            anchor = %self.anchor,
            bookings = room.booked_intervals.len(),
            "opened calendar"
        );
        self.room = Some(room);
        self.rebuild_window();
    }

    pub fn close(&mut self) {
        debug!("closed calendar");
        self.room = None;
        self.window = None;
        self.state = CarouselState::Idle;
    }

    pub fn go_to_next_month(&mut self) -> NavigationOutcome {
        self.advance(NavigationCommand::Next)
    }

    pub fn go_to_previous_month(&mut self) -> NavigationOutcome {
        self.advance(NavigationCommand::Previous)
    }

    pub fn dispatch(&mut self, command: NavigationCommand) -> NavigationOutcome {
        self.advance(command)
    }

    /// Moves the anchor exactly one month in the direction of `command`.
    pub fn advance(&mut self, command: NavigationCommand) -> NavigationOutcome {
        self.advance_at(command, Instant::now())
    }

    /// Like [`advance`](Self::advance) with an explicit clock reading; a stalled
    /// transition older than the timeout is completed before the input is judged.
    pub fn advance_at(&mut self, command: NavigationCommand, now: Instant) -> NavigationOutcome {
        let direction = command.direction();
        if self.room.is_none() {
            debug!(direction, "navigation before a room was opened");
            return NavigationOutcome::NotReady;
        }

        self.expire_stalled_animation_at(now);
        if self.is_animating() {
            debug!(direction, anchor = %self.anchor, "ignoring navigation during transition");
            return NavigationOutcome::IgnoredWhileAnimating;
        }

        self.anchor = self.anchor.offset(direction);
        self.state = CarouselState::Animating { since: now };
        self.rebuild_window();
        debug!(direction, anchor = %self.anchor, "accepted navigation");

        NavigationOutcome::Accepted {
            anchor: self.anchor,
        }
    }

    /// Completion signal from the view layer. Harmless when nothing is running.
    pub fn on_animation_complete(&mut self) {
        if !self.is_animating() {
            return;
        }
        self.state = CarouselState::Idle;
        self.rebuild_window();
        debug!(anchor = %self.anchor, "transition complete");
    }

    /// Returns `true` when a transition had to be forced to completion.
    pub fn expire_stalled_animation_at(&mut self, now: Instant) -> bool {
        let CarouselState::Animating { since } = self.state else {
            return false;
        };
        if now.saturating_duration_since(since) < self.settings.animation_timeout {
            return false;
        }

        warn!(
            anchor = %self.anchor,
            timeout_ms = self.settings.animation_timeout.as_millis() as u64,
            "completion signal never arrived; finishing transition"
        );
        self.on_animation_complete();
        true
    }

    pub fn window(&self) -> [CalendarMonth; 4] {
        [
            self.anchor.offset(-1),
            self.anchor,
            self.anchor.offset(1),
            self.anchor.offset(2),
        ]
    }

    pub fn render_window(&self) -> Option<&[MonthView; 4]> {
        self.window.as_ref()
    }

    pub fn visible_months(&self) -> Option<[&MonthView; 2]> {
        self.window.as_ref().map(|window| [&window[1], &window[2]])
    }

    pub fn anchor(&self) -> CalendarMonth {
        self.anchor
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, CarouselState::Animating { .. })
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn settings(&self) -> CarouselSettings {
        self.settings
    }

    fn rebuild_window(&mut self) {
        let Some(room) = self.room.as_ref() else {
            self.window = None;
            return;
        };
        let months = self.window();
        self.window = Some(
            months.map(|month| MonthView::build(month, &room.booked_intervals, self.today)),
        );
    }
}
