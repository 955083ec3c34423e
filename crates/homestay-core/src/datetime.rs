use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;

pub const DEFAULT_TIMEZONE: &str =
  "Asia/Ho_Chi_Minh";

/// A calendar month with a zero-based
/// month index (0 = January).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
)]
pub struct CalendarMonth {
  pub year:  i32,
  pub month: u32
}

impl CalendarMonth {
  /// Builds a month from a possibly
  /// out-of-range month index. Month 12
  /// rolls into January of the next year,
  /// month -1 into December of the
  /// previous one.
  pub fn new(
    year: i32,
    month: i64
  ) -> Self {
    let ordinal =
      i64::from(year) * 12 + month;
    Self::from_ordinal(ordinal)
  }

  pub fn containing(
    date: NaiveDate
  ) -> Self {
    Self {
      year:  date.year(),
      month: date.month0()
    }
  }

  pub fn offset(
    self,
    delta: i32
  ) -> Self {
    Self::from_ordinal(
      self.ordinal() + i64::from(delta)
    )
  }

  pub fn first_day(self) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      self.year,
      self.month + 1,
      1
    )
    .unwrap_or(NaiveDate::MIN)
  }

  /// Day zero of the following month.
  pub fn last_day(self) -> NaiveDate {
    self
      .offset(1)
      .first_day()
      .pred_opt()
      .unwrap_or(NaiveDate::MIN)
  }

  pub fn days_in_month(self) -> u32 {
    self.last_day().day()
  }

  pub fn label(self) -> String {
    self
      .first_day()
      .format("%B %Y")
      .to_string()
  }

  fn ordinal(self) -> i64 {
    i64::from(self.year) * 12
      + i64::from(self.month)
  }

  fn from_ordinal(ordinal: i64) -> Self {
    let year = ordinal
      .div_euclid(12)
      .clamp(
        i64::from(i32::MIN),
        i64::from(i32::MAX)
      ) as i32;
    let month =
      ordinal.rem_euclid(12) as u32;
    Self { year, month }
  }
}

impl fmt::Display for CalendarMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year,
      self.month + 1
    )
  }
}

impl FromStr for CalendarMonth {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let (year, month) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| {
        anyhow!(
          "expected YYYY-MM, got: {s}"
        )
      })?;
    let year: i32 =
      year.parse().with_context(|| {
        format!("invalid year in {s}")
      })?;
    let month: u32 =
      month.parse().with_context(|| {
        format!("invalid month in {s}")
      })?;
    if !(1..=12).contains(&month) {
      return Err(anyhow!(
        "month out of range in {s}"
      ));
    }
    // The pre-rendered window reaches a
    // month either side of this year.
    let representable = [
      year.checked_sub(1),
      Some(year),
      year.checked_add(1)
    ]
    .into_iter()
    .all(|year| {
      year.is_some_and(|year| {
        NaiveDate::from_ymd_opt(
          year, 1, 1
        )
        .and_then(|_| {
          NaiveDate::from_ymd_opt(
            year, 12, 31
          )
        })
        .is_some()
      })
    });
    if !representable {
      return Err(anyhow!(
        "year out of range in {s}"
      ));
    }
    Ok(Self {
      year,
      month: month - 1
    })
  }
}

fn booking_date_regex() -> &'static Regex
{
  static BOOKING_DATE: OnceLock<Regex> =
    OnceLock::new();
  BOOKING_DATE.get_or_init(|| {
    Regex::new(
      r"^(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})(?:$|[T ])"
    )
    .expect("booking date pattern is valid")
  })
}

/// Reads the calendar date out of a
/// booking field. Accepts plain
/// `YYYY-MM-DD` and ISO timestamps that
/// start with one.
pub fn parse_booking_date(
  raw: &str
) -> Option<NaiveDate> {
  let caps = booking_date_regex()
    .captures(raw.trim())?;
  let year = caps["y"].parse().ok()?;
  let month = caps["m"].parse().ok()?;
  let day = caps["d"].parse().ok()?;
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

pub fn parse_date_arg(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "expected YYYY-MM-DD, got: {raw}"
    )
  })
}

pub fn resolve_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

pub fn today_in_timezone(
  timezone: Tz
) -> NaiveDate {
  Utc::now()
    .with_timezone(&timezone)
    .date_naive()
}
