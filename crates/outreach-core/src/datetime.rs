use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Utc
};
use chrono_tz::Tz;

use crate::classify::resolve_local;

pub const DEFAULT_TIMEZONE: &str =
  "America/New_York";

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return Err(anyhow!(
      "empty timezone from {source}"
    ));
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Ok(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      Err(anyhow!(
        "unknown timezone '{trimmed}' \
         from {source}"
      ))
    }
  }
}

/// Resolves the instant used as "now"
/// for a whole command. `real_now` is
/// the only wall-clock read and is
/// supplied by the caller.
#[tracing::instrument(skip(real_now, tz), fields(input = input))]
pub fn parse_now_expr(
  input: &str,
  tz: Tz,
  real_now: DateTime<Utc>
) -> anyhow::Result<DateTime<Tz>> {
  let token = input.trim();

  if token.eq_ignore_ascii_case("now") {
    return Ok(
      real_now.with_timezone(&tz)
    );
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&tz));
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return resolve_local(
        ndt.date(),
        ndt.time(),
        tz
      )
      .with_context(|| {
        format!("invalid --now value: {input}")
      });
    }
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return resolve_local(
      date,
      NaiveTime::MIN,
      tz
    )
    .with_context(|| {
      format!("invalid --now value: {input}")
    });
  }

  Err(anyhow!(
    "unrecognized time expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: now, RFC3339, \
     YYYY-MM-DDTHH:MM, YYYY-MM-DD \
     HH:MM, YYYY-MM-DD"
  })
}
