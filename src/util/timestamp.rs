use chrono::{DateTime, Duration, TimeZone, Utc};

fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = match raw.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (raw, ""),
    };
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = format!("{:0<9}", frac.get(..9).unwrap_or(frac)).parse().ok()?;
    Utc.timestamp_opt(secs, nanos).single()
}

/// Renders a warehouse `"<epoch>[.<fraction>] <offset minutes>"` cell as
/// ISO-8601 UTC. Anything that does not parse is returned unchanged.
pub fn parse_snowflake_timestamp(raw: &str) -> String {
    let mut parts = raw.split_whitespace();
    let Some(epoch) = parts.next() else {
        return raw.to_string();
    };

    let offset_minutes = match parts.next() {
        Some(offset) => match offset.parse::<i64>() {
            Ok(minutes) => minutes,
            Err(_) => return raw.to_string(),
        },
        None => 0,
    };

    let Some(instant) = parse_epoch(epoch) else {
        return raw.to_string();
    };
    let Some(shifted) = Duration::try_minutes(offset_minutes)
        .and_then(|delta| instant.checked_add_signed(delta))
    else {
        return raw.to_string();
    };

    if shifted.timestamp_subsec_micros() == 0 {
        shifted.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        shifted.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

/// Null-preserving wrapper for nullable date cells.
pub fn normalize_timestamp(cell: Option<String>) -> Option<String> {
    cell.map(|raw| parse_snowflake_timestamp(&raw))
}
