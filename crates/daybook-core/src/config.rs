use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::date::{
  DEFAULT_TIMEZONE,
  parse_timezone
};

pub const DEFAULT_API_URL: &str =
  "http://localhost:5000";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Backend {
  Http,
  Local
}

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  /// Built-in defaults only.
  #[must_use]
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    for (key, value) in [
      ("api.url", DEFAULT_API_URL),
      ("api.backend", "http"),
      ("api.timeout", "0"),
      ("data.location", "~/.daybook"),
      (
        "date.timezone",
        DEFAULT_TIMEZONE
      ),
      ("color", "on"),
      ("mail.name", ""),
      ("mail.greeting", "Hello,"),
      (
        "mail.signature",
        "Best regards,"
      )
    ] {
      cfg.map.insert(
        key.to_string(),
        value.to_string()
      );
    }

    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading daybookrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no daybookrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn set(
    &mut self,
    key: &str,
    value: impl Into<String>
  ) {
    self
      .map
      .insert(key.to_string(), value.into());
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_u64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u64>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<u64>().with_context(
          || {
            format!(
              "config key {key} expects \
               a number, got {v:?}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn backend(
    &self
  ) -> anyhow::Result<Backend> {
    let raw = self
      .get("api.backend")
      .unwrap_or_else(|| {
        "http".to_string()
      });
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "http" | "remote" => {
        Ok(Backend::Http)
      }
      | "local" | "file" => {
        Ok(Backend::Local)
      }
      | other => Err(anyhow!(
        "invalid api.backend \
         setting: {other}"
      ))
    }
  }

  pub fn timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("date.timezone")
      .unwrap_or_else(|| {
        DEFAULT_TIMEZONE.to_string()
      });
    parse_timezone(&raw)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let path = fs::canonicalize(&path)
      .unwrap_or(path);
    if self.loaded_files.contains(&path)
    {
      warn!(
        file = %path.display(),
        "rc file already loaded; skipping repeated include"
      );
      return Ok(());
    }

    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once(" #")
      {
        line = before.trim();
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var("DAYBOOKRC")
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping \
       daybookrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".daybookrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".daybook"))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::{
    Backend,
    Config,
    DEFAULT_API_URL
  };

  #[test]
  fn rc_file_with_include_and_overrides()
   {
    let dir =
      tempdir().expect("tempdir");
    let extra = dir.path().join("mail.rc");
    fs::write(
      &extra,
      "mail.name = Ada Lovelace\n"
    )
    .expect("write include");

    let rc = dir.path().join("daybookrc");
    fs::write(
      &rc,
      "# daybook settings\n\
       api.backend = local\n\
       api.timeout = 15 # seconds\n\
       include mail.rc\n\
       include missing.rc\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.backend().expect("backend"),
      Backend::Local
    );
    assert_eq!(
      cfg
        .get_u64("api.timeout")
        .expect("timeout"),
      Some(15)
    );
    assert_eq!(
      cfg.get("mail.name").as_deref(),
      Some("Ada Lovelace")
    );
    assert_eq!(
      cfg.get("api.url").as_deref(),
      Some(DEFAULT_API_URL)
    );

    cfg.apply_overrides([(
      "rc.api.backend".to_string(),
      "http".to_string()
    )]);
    assert_eq!(
      cfg.backend().expect("backend"),
      Backend::Http
    );
  }

  #[test]
  fn include_cycles_load_each_file_once()
   {
    let dir =
      tempdir().expect("tempdir");
    let first = dir.path().join("a.rc");
    let second = dir.path().join("b.rc");
    fs::write(
      &first,
      "include a.rc\n\
       include b.rc\n\
       mail.name = Ada\n"
    )
    .expect("write a.rc");
    fs::write(
      &second,
      "include a.rc\n\
       api.backend = local\n"
    )
    .expect("write b.rc");

    let cfg = Config::load(Some(&first))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.get("mail.name").as_deref(),
      Some("Ada")
    );
    assert_eq!(
      cfg.backend().expect("backend"),
      Backend::Local
    );
  }

  #[test]
  fn malformed_line_is_an_error() {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("daybookrc");
    fs::write(&rc, "api.url\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn rejects_unknown_backend_and_bad_numbers()
   {
    let mut cfg = Config::defaults();
    cfg.set("api.backend", "carrier-pigeon");
    assert!(cfg.backend().is_err());
    cfg.set("api.timeout", "soon");
    assert!(
      cfg.get_u64("api.timeout").is_err()
    );
  }
}
