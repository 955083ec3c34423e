use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::{
  CarouselSettings,
  DEFAULT_SWIPE_THRESHOLD
};
use crate::datetime::{
  DEFAULT_TIMEZONE,
  resolve_timezone
};

const CONFIG_ENV_VAR: &str =
  "HOMESTAY_CONFIG";
const CONFIG_DIR_NAME: &str = "homestay";
const CONFIG_FILE_NAME: &str =
  "config.toml";

fn default_true() -> bool {
  true
}

fn default_timezone() -> Option<String> {
  Some(DEFAULT_TIMEZONE.to_string())
}

fn default_swipe_threshold() -> f64 {
  DEFAULT_SWIPE_THRESHOLD
}

fn default_animation_timeout_ms() -> u64
{
  1_000
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct Config {
  #[serde(default = "default_timezone")]
  pub timezone:     Option<String>,
  #[serde(default)]
  pub calendar:     CalendarSection,
  #[serde(default)]
  pub display:      DisplaySection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarSection {
  #[serde(
    default = "default_swipe_threshold"
  )]
  pub swipe_threshold:      f64,
  #[serde(
    default = "default_animation_timeout_ms"
  )]
  pub animation_timeout_ms: u64
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct DisplaySection {
  #[serde(default = "default_true")]
  pub color: bool
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timezone:     default_timezone(),
      calendar:     CalendarSection::default(
      ),
      display:      DisplaySection::default(),
      loaded_files: vec![]
    }
  }
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      swipe_threshold:
        default_swipe_threshold(),
      animation_timeout_ms:
        default_animation_timeout_ms()
    }
  }
}

impl Default for DisplaySection {
  fn default() -> Self {
    Self { color: true }
  }
}

impl Config {
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)?
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::from_toml_str(
      &text
    )
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Self =
      toml::from_str(text)?;
    sanitize_config(&mut cfg);
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      let value = value.trim();
      debug!(key = %key, value = %value, "applying override");
      match key.trim() {
        | "timezone" => {
          if resolve_timezone(
            value, "override"
          )
          .is_none()
          {
            return Err(anyhow!(
              "invalid timezone: {value}"
            ));
          }
          self.timezone =
            Some(value.to_string());
        }
        | "calendar.swipe_threshold" => {
          self.calendar.swipe_threshold =
            value.parse().with_context(
              || {
                format!(
                  "invalid swipe \
                   threshold: {value}"
                )
              }
            )?;
        }
        | "calendar.animation_timeout_ms" => {
          self
            .calendar
            .animation_timeout_ms = value
            .parse()
            .with_context(|| {
              format!(
                "invalid animation \
                 timeout: {value}"
              )
            })?;
        }
        | "display.color" => {
          self.display.color =
            parse_bool(value).ok_or_else(
              || {
                anyhow!(
                  "invalid color \
                   setting: {value}"
                )
              }
            )?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }

    sanitize_config(self);
    Ok(())
  }

  pub fn timezone(&self) -> Tz {
    self
      .timezone
      .as_deref()
      .and_then(|raw| {
        resolve_timezone(raw, "config")
      })
      .unwrap_or(chrono_tz::Asia::Ho_Chi_Minh)
  }

  pub fn swipe_threshold(&self) -> f64 {
    self.calendar.swipe_threshold
  }

  pub fn carousel_settings(
    &self
  ) -> CarouselSettings {
    CarouselSettings {
      animation_timeout:
        Duration::from_millis(
          self.calendar.animation_timeout_ms
        )
    }
  }
}

fn sanitize_config(config: &mut Config) {
  let threshold =
    config.calendar.swipe_threshold;
  if !threshold.is_finite()
    || threshold <= 0.0
  {
    warn!(
      threshold,
      "swipe threshold must be positive; \
       using default"
    );
    config.calendar.swipe_threshold =
      default_swipe_threshold();
  }

  if config.calendar.animation_timeout_ms
    == 0
  {
    config
      .calendar
      .animation_timeout_ms =
      default_animation_timeout_ms();
  }

  let timezone_ok = config
    .timezone
    .as_deref()
    .is_some_and(|raw| {
      resolve_timezone(raw, "config")
        .is_some()
    });
  if !timezone_ok {
    config.timezone = default_timezone();
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if env_path == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      env_path
    )));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    debug!(
      "no platform config directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = Config::from_toml_str("")
      .expect("parse empty config");
    assert_eq!(cfg, Config::default());
    assert_eq!(
      cfg.swipe_threshold(),
      DEFAULT_SWIPE_THRESHOLD
    );
    assert_eq!(
      cfg
        .carousel_settings()
        .animation_timeout,
      Duration::from_millis(1_000)
    );
  }

  #[test]
  fn sections_are_read() {
    let cfg = Config::from_toml_str(
      r#"
timezone = "Europe/Amsterdam"

[calendar]
swipe_threshold = 80.0
animation_timeout_ms = 450

[display]
color = false
"#
    )
    .expect("parse config");
    assert_eq!(
      cfg.timezone(),
      chrono_tz::Europe::Amsterdam
    );
    assert_eq!(cfg.swipe_threshold(), 80.0);
    assert_eq!(
      cfg.calendar.animation_timeout_ms,
      450
    );
    assert!(!cfg.display.color);
  }

  #[test]
  fn bad_values_are_sanitized() {
    let cfg = Config::from_toml_str(
      r#"
timezone = "Nowhere/Special"

[calendar]
swipe_threshold = -3.0
animation_timeout_ms = 0
"#
    )
    .expect("parse config");
    assert_eq!(
      cfg.timezone.as_deref(),
      Some(DEFAULT_TIMEZONE)
    );
    assert_eq!(
      cfg.swipe_threshold(),
      DEFAULT_SWIPE_THRESHOLD
    );
    assert_eq!(
      cfg.calendar.animation_timeout_ms,
      1_000
    );
  }

  #[test]
  fn overrides_apply_and_reject_unknown()
  {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        (
          "calendar.swipe_threshold"
            .to_string(),
          "30".to_string()
        ),
        (
          "display.color".to_string(),
          "off".to_string()
        ),
      ])
      .expect("apply overrides");
    assert_eq!(cfg.swipe_threshold(), 30.0);
    assert!(!cfg.display.color);

    assert!(
      cfg
        .apply_overrides(vec![(
          "calendar.week_start"
            .to_string(),
          "monday".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "display.color".to_string(),
          "maybe".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn timezone_override_must_resolve() {
    let mut cfg = Config::default();
    let err = cfg
      .apply_overrides(vec![(
        "timezone".to_string(),
        "Bogus/Zone".to_string()
      )])
      .expect_err("unknown timezone");
    assert!(
      err.to_string().contains("Bogus/Zone")
    );
    assert_eq!(
      cfg.timezone.as_deref(),
      Some(DEFAULT_TIMEZONE)
    );

    cfg
      .apply_overrides(vec![(
        "timezone".to_string(),
        "Europe/Amsterdam".to_string()
      )])
      .expect("known timezone");
    assert_eq!(
      cfg.timezone(),
      chrono_tz::Europe::Amsterdam
    );
  }

  #[test]
  fn load_reads_explicit_file() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp config");
    writeln!(
      file,
      "[calendar]\nswipe_threshold = 64.0"
    )
    .expect("write config");

    let cfg =
      Config::load(Some(file.path()))
        .expect("load config");
    assert_eq!(cfg.swipe_threshold(), 64.0);
    assert_eq!(
      cfg.loaded_files,
      vec![file.path().to_path_buf()]
    );
  }

  #[test]
  fn load_fails_on_missing_explicit_file()
  {
    let dir =
      tempfile::tempdir().expect("tempdir");
    let missing =
      dir.path().join("absent.toml");
    assert!(
      Config::load(Some(&missing)).is_err()
    );
  }
}
