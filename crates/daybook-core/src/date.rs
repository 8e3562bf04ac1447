use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Days,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info
};

pub const DAY_FORMAT: &str =
  "%Y-%m-%d";

pub const DEFAULT_TIMEZONE: &str =
  "UTC";

pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "timezone cannot be empty"
    ));
  }

  trimmed.parse::<Tz>().map_err(|err| {
    anyhow!(
      "invalid timezone {trimmed}: \
       {err}"
    )
  })
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

#[must_use]
pub fn format_day(
  day: NaiveDate
) -> String {
  day.format(DAY_FORMAT).to_string()
}

#[must_use]
pub fn previous_day(
  day: NaiveDate
) -> NaiveDate {
  day
    .checked_sub_days(Days::new(1))
    .unwrap_or(day)
}

#[must_use]
pub fn next_day(
  day: NaiveDate
) -> NaiveDate {
  day
    .checked_add_days(Days::new(1))
    .unwrap_or(day)
}

/// Strict `YYYY-MM-DD`.
pub fn parse_iso_day(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  let trimmed = raw.trim();
  let parsed = NaiveDate::parse_from_str(
    trimmed, DAY_FORMAT
  )
  .with_context(|| {
    format!(
      "invalid date {trimmed:?}; \
       expected YYYY-MM-DD"
    )
  })?;

  if format_day(parsed) != trimmed {
    return Err(anyhow!(
      "invalid date {trimmed:?}; \
       expected YYYY-MM-DD"
    ));
  }

  Ok(parsed)
}

/// Accepts `today`, `yesterday`,
/// `tomorrow` or a strict
/// `YYYY-MM-DD` date.
#[tracing::instrument]
pub fn parse_day_expr(
  raw: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let lowered =
    raw.trim().to_ascii_lowercase();
  let day = match lowered.as_str() {
    | "today" => today,
    | "yesterday" => {
      previous_day(today)
    }
    | "tomorrow" => next_day(today),
    | _ => parse_iso_day(&lowered)?
  };
  debug!(input = %raw, day = %day, "parsed day expression");
  Ok(day)
}

/// The calendar day a stored record
/// belongs to, taken from the leading
/// `YYYY-MM-DD` of a timestamp.
#[must_use]
pub fn day_of_timestamp(
  raw: &str
) -> Option<NaiveDate> {
  let head = raw.get(..10)?;
  parse_iso_day(head).ok()
}

/// The day every view operates on.
///
/// Created once when the session starts
/// and only changed through [`set`].
/// Each change bumps `revision`, which
/// dependent views compare against the
/// revision they last loaded for.
///
/// [`set`]: DaySelection::set
#[derive(Debug, Clone)]
pub struct DaySelection {
  day:      NaiveDate,
  revision: u64
}

impl DaySelection {
  #[must_use]
  pub fn new(day: NaiveDate) -> Self {
    Self {
      day,
      revision: 0
    }
  }

  #[must_use]
  pub fn get(&self) -> NaiveDate {
    self.day
  }

  #[must_use]
  pub fn as_string(&self) -> String {
    format_day(self.day)
  }

  #[must_use]
  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Returns whether the selection
  /// changed.
  pub fn set(
    &mut self,
    day: NaiveDate
  ) -> bool {
    if day == self.day {
      return false;
    }
    info!(from = %self.day, to = %day, "selected date changed");
    self.day = day;
    self.revision += 1;
    true
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    DaySelection,
    day_of_timestamp,
    parse_day_expr,
    parse_iso_day,
    parse_timezone
  };

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_relative_words() {
    let today = day(2024, 3, 1);
    assert_eq!(
      parse_day_expr(
        "yesterday",
        today
      )
      .expect("yesterday"),
      day(2024, 2, 29)
    );
    assert_eq!(
      parse_day_expr("Today", today)
        .expect("today"),
      today
    );
    assert_eq!(
      parse_day_expr(
        "tomorrow",
        today
      )
      .expect("tomorrow"),
      day(2024, 3, 2)
    );
  }

  #[test]
  fn rejects_loose_dates() {
    assert!(
      parse_iso_day("2024-1-5").is_err()
    );
    assert!(
      parse_iso_day("15/01/2024")
        .is_err()
    );
    assert_eq!(
      parse_iso_day("2024-01-15")
        .expect("strict date"),
      day(2024, 1, 15)
    );
  }

  #[test]
  fn timestamp_prefix_is_the_day() {
    assert_eq!(
      day_of_timestamp(
        "2024-01-15T09:30:00.123"
      ),
      Some(day(2024, 1, 15))
    );
    assert_eq!(
      day_of_timestamp("garbage"),
      None
    );
  }

  #[test]
  fn selection_revision_moves_only_on_change()
   {
    let mut selection =
      DaySelection::new(day(
        2024, 1, 15
      ));
    assert!(
      !selection.set(day(2024, 1, 15))
    );
    assert_eq!(selection.revision(), 0);
    assert!(
      selection.set(day(2024, 1, 16))
    );
    assert_eq!(selection.revision(), 1);
    assert_eq!(
      selection.as_string(),
      "2024-01-16"
    );
  }

  #[test]
  fn timezone_names_parse() {
    assert!(
      parse_timezone("Europe/Berlin")
        .is_ok()
    );
    assert!(
      parse_timezone("Mars/Olympus")
        .is_err()
    );
    assert!(parse_timezone(" ").is_err());
  }
}
