use chrono::NaiveDate;
use homestay_shared::{BookedIntervalDto, RoomDto};
use serde::Serialize;
use tracing::warn;

use crate::datetime::parse_booking_date;

/// Half-open stay `[check_in, check_out)`: the guest leaves on `check_out`, so that
/// night is free again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedInterval {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
}

impl BookedInterval {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in,
            check_out,
            guest_name: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.check_in < self.check_out
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    pub fn nights(&self) -> i64 {
        if self.is_valid() {
            (self.check_out - self.check_in).num_days()
        } else {
            0
        }
    }

    pub fn overlaps(&self, other: &BookedInterval) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.check_in < other.check_out
            && other.check_in < self.check_out
    }

    /// Every booked night. Inverted or zero-length stays yield nothing.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.check_out;
        self.check_in
            .iter_days()
            .take_while(move |day| *day < end)
    }

    fn from_dto(dto: &BookedIntervalDto, room_id: &str) -> Option<Self> {
        let check_in = dto.check_in.as_deref().and_then(parse_booking_date);
        let check_out = dto.check_out.as_deref().and_then(parse_booking_date);
        match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => Some(Self {
                check_in,
                check_out,
                guest_name: dto.guest_name.clone().filter(|name| !name.trim().is_empty()),
            }),
            _ => {
                warn!(
                    room = room_id,
                    check_in = ?dto.check_in,
                    check_out = ?dto.check_out,
                    "dropping booking with unreadable dates"
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub capacity: u32,
    pub description: String,
    pub amenities: Vec<String>,
    pub booked_intervals: Vec<BookedInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStatus {
    pub available: bool,
    pub current_booking: Option<BookedInterval>,
}

impl RoomStatus {
    pub fn as_key(&self) -> &'static str {
        if self.available { "available" } else { "booked" }
    }
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: 0.0,
            capacity: 0,
            description: String::new(),
            amenities: vec![],
            booked_intervals: vec![],
        }
    }

    /// Whether a guest is staying on `today`; the first matching stay in input
    /// order is reported as the current booking.
    pub fn status_on(&self, today: NaiveDate) -> RoomStatus {
        let current = self
            .booked_intervals
            .iter()
            .find(|interval| interval.contains(today))
            .cloned();
        RoomStatus {
            available: current.is_none(),
            current_booking: current,
        }
    }

    /// Index pairs of stays that share at least one night.
    pub fn overlapping_bookings(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.booked_intervals.iter().enumerate() {
            for (j, b) in self.booked_intervals.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

impl From<RoomDto> for Room {
    fn from(dto: RoomDto) -> Self {
        let id = dto
            .room_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| dto.id.clone())
            .unwrap_or_default();

        let booked_intervals = dto
            .booked_intervals
            .iter()
            .filter_map(|interval| BookedInterval::from_dto(interval, &id))
            .collect();

        Self {
            capacity: dto.capacity.or(dto.persons).unwrap_or(0),
            name: dto.name,
            price: dto.price,
            description: dto.description,
            amenities: dto.amenities,
            booked_intervals,
            id,
        }
    }
}

pub fn available_rooms(rooms: &[Room], today: NaiveDate) -> Vec<&Room> {
    rooms
        .iter()
        .filter(|room| room.status_on(today).available)
        .collect()
}
