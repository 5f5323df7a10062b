use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fixed offset used to read and render wall-clock timestamps.
///
/// Instants are always compared as `DateTime<Utc>`; the reference only decides what an
/// offset-less value such as `2020-06-14T10:00:00` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    offset: FixedOffset,
}

impl Default for TimeReference {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeReference {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    pub fn parse_timestamp(&self, text: &str) -> anyhow::Result<DateTime<Utc>> {
        let text = text.trim();
        anyhow::ensure!(!text.is_empty(), "timestamp must be non-empty");

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive = LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .with_context(|| format!("unrecognised timestamp: {text}"))?;
        self.localize(naive)
    }

    pub fn localize(&self, naive: NaiveDateTime) -> anyhow::Result<DateTime<Utc>> {
        let local = self
            .offset
            .from_local_datetime(&naive)
            .single()
            .with_context(|| format!("ambiguous local timestamp: {naive}"))?;
        Ok(local.with_timezone(&Utc))
    }

    pub fn epoch_millis(&self, millis: i64) -> anyhow::Result<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(millis)
            .with_context(|| format!("epoch millis out of range: {millis}"))
    }

    pub fn format_local(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(OUTPUT_FORMAT)
            .to_string()
    }
}

impl std::str::FromStr for TimeReference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Self::utc());
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => anyhow::bail!("offset must be UTC or start with '+'/'-': {s}"),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "00"));
        let hours = offset_component(hours, 23).with_context(|| format!("bad offset hours: {s}"))?;
        let minutes =
            offset_component(minutes, 59).with_context(|| format!("bad offset minutes: {s}"))?;

        let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .with_context(|| format!("offset out of range: {s}"))?;
        Ok(Self { offset })
    }
}

// Digits only, so a second sign such as "+-01:00" is refused.
fn offset_component(text: &str, max: i32) -> anyhow::Result<i32> {
    anyhow::ensure!(
        (1..=2).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_digit()),
        "expected one or two digits, got {text:?}"
    );
    let value: i32 = text.parse()?;
    anyhow::ensure!(value <= max, "{value} exceeds {max}");
    Ok(value)
}
