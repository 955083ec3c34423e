use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, anyhow};
use homestay_shared::{ApiEnvelope, RoomDto};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::room::Room;

/// Either the API response envelope or the backend's bare fallback file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoomsDocument {
    Bare(Vec<RoomDto>),
    Envelope(ApiEnvelope),
}

/// Rooms already fetched and parsed by whatever talks to the backend.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
    source: Option<String>,
}

impl RoomCatalog {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self {
            rooms,
            source: None,
        }
    }

    #[tracing::instrument(skip(text))]
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let document: RoomsDocument =
            serde_json::from_str(text).context("failed parsing rooms payload")?;

        let (dtos, source) = match document {
            RoomsDocument::Bare(rooms) => (rooms, Some("file".to_string())),
            RoomsDocument::Envelope(envelope) => {
                if !envelope.success {
                    let reason = envelope
                        .error
                        .or(envelope.message)
                        .unwrap_or_else(|| "unspecified error".to_string());
                    return Err(anyhow!("room API reported failure: {reason}"));
                }

                let rooms = envelope.data.map(|data| data.into_vec()).unwrap_or_default();
                if let Some(count) = envelope.count
                    && count != rooms.len()
                {
                    warn!(
                        declared = count,
                        received = rooms.len(),
                        "room count does not match payload"
                    );
                }
                (rooms, envelope.source)
            }
        };

        let rooms: Vec<Room> = dtos.into_iter().map(Room::from).collect();
        info!(count = rooms.len(), source = ?source, "loaded rooms");
        Ok(Self { rooms, source })
    }

    /// Reads a rooms payload from `path`, or from stdin when `path` is `-`.
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = if path.as_os_str() == "-" {
            debug!("reading rooms from stdin");
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed reading rooms from stdin")?;
            buf
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        };

        Self::from_json(&text).with_context(|| format!("invalid rooms in {}", path.display()))
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn find(&self, id: &str) -> Option<&Room> {
        let id = id.trim();
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn require(&self, id: &str) -> anyhow::Result<&Room> {
        self.find(id).ok_or_else(|| anyhow!("room not found: {id}"))
    }
}
