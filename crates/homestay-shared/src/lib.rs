use serde::de::IgnoredAny;
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};

/// A value of the expected shape, or anything else (null, wrong type).
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
  Value(T),
  Other(IgnoredAny)
}

/// Maps null or wrongly typed values to `None` instead of failing the
/// whole document.
fn lenient<'de, D, T>(
  deserializer: D
) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>
{
  Ok(
    match Lenient::<T>::deserialize(
      deserializer
    )? {
      | Lenient::Value(value) => {
        Some(value)
      }
      | Lenient::Other(_) => None
    }
  )
}

fn lenient_or_default<'de, D, T>(
  deserializer: D
) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default
{
  Ok(
    lenient(deserializer)?
      .unwrap_or_default()
  )
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct BookedIntervalDto {
  #[serde(
    default,
    deserialize_with = "lenient"
  )]
  pub check_in:    Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient"
  )]
  pub check_out:   Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient"
  )]
  pub guest_name:  Option<String>,
  #[serde(default)]
  pub guest_phone: Option<String>,
  #[serde(default)]
  pub guest_email: Option<String>,
  #[serde(default)]
  pub notes:       Option<String>,
  #[serde(default)]
  pub created_at:  Option<String>,
  #[serde(default)]
  pub updated_at:  Option<String>
}

/// A room as served by `/backend/api/rooms`, or as stored in the backend's
/// fallback `rooms_data.json` (where the identifier lives in `_id` and the
/// capacity in `persons`).
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
pub struct RoomDto {
  #[serde(default)]
  pub room_id:          Option<String>,
  #[serde(default, alias = "_id")]
  pub id:               Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_or_default"
  )]
  pub name:             String,
  #[serde(
    default,
    deserialize_with = "lenient_or_default"
  )]
  pub price:            f64,
  #[serde(
    default,
    deserialize_with = "lenient"
  )]
  pub capacity:         Option<u32>,
  #[serde(
    default,
    deserialize_with = "lenient"
  )]
  pub persons:          Option<u32>,
  #[serde(default)]
  pub description:      String,
  #[serde(default)]
  pub amenities:        Vec<String>,
  #[serde(
    default,
    rename = "bookedIntervals"
  )]
  pub booked_intervals:
    Vec<BookedIntervalDto>,
  #[serde(default)]
  pub created_at:       Option<String>,
  #[serde(default)]
  pub updated_at:       Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  Many(Vec<T>),
  One(T)
}

impl<T> OneOrMany<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      | Self::Many(items) => items,
      | Self::One(item) => vec![item]
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub data:    Option<OneOrMany<RoomDto>>,
  #[serde(default)]
  pub source:  Option<String>,
  #[serde(default)]
  pub count:   Option<usize>,
  #[serde(default)]
  pub error:   Option<String>,
  #[serde(default)]
  pub message: Option<String>
}
