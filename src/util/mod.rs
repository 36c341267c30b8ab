use chrono::DateTime;

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Allocates an id for a new note (random UUID v4).
pub(crate) fn new_note_id() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes)?;
    Ok(note_id_from_bytes(bytes))
}

fn note_id_from_bytes(bytes: [u8; 16]) -> String {
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Renders a modification timestamp as e.g. `April 10, 2019` (UTC).
pub(crate) fn format_last_modified(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|d| d.format("%B %-d, %Y").to_string())
}

/// `datetime` attribute for the `<time>` element.
pub(crate) fn last_modified_iso(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|d| d.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_last_modified() {
        // 2019-04-10T14:48:03.672Z
        assert_eq!(
            format_last_modified(1554907683672).as_deref(),
            Some("April 10, 2019")
        );
        assert_eq!(
            last_modified_iso(1554907683672).as_deref(),
            Some("2019-04-10T14:48:03.672Z")
        );
    }

    #[test]
    fn test_format_last_modified_single_digit_day() {
        // 2021-03-05T00:00:00Z
        assert_eq!(
            format_last_modified(1614902400000).as_deref(),
            Some("March 5, 2021")
        );
    }

    #[test]
    fn test_note_id_from_bytes_is_v4_uuid() {
        let id = note_id_from_bytes([0xab; 16]);
        let parsed = uuid::Uuid::parse_str(&id).expect("should be a uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.len(), 36);
    }
}
