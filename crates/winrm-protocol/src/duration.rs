//! ISO-8601 duration literals of the restricted `PT<seconds>S` shape WinRM
//! uses for `w:OperationTimeout`.

use std::time::Duration;

/// Renders `secs` as `PT<secs>S`. `secs` is truncated to whole seconds — the
/// protocol only ever needs second resolution here.
pub fn to_operation_timeout(duration: Duration) -> String {
    format!("PT{}S", duration.as_secs())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid OperationTimeout literal: {0:?}")]
pub struct InvalidDuration(pub String);

/// Parses a `PT<seconds>S` literal back into whole seconds. Only the exact
/// shape WinRM emits is accepted; this is not a general ISO-8601 duration
/// parser.
pub fn parse_operation_timeout(literal: &str) -> Result<Duration, InvalidDuration> {
    let secs = literal
        .strip_prefix("PT")
        .and_then(|rest| rest.strip_suffix('S'))
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| InvalidDuration(literal.to_string()))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_for_any_positive_second_count() {
        for secs in [0u64, 1, 60, 3599, 153_600] {
            let literal = to_operation_timeout(Duration::from_secs(secs));
            assert_eq!(literal, format!("PT{secs}S"));
            assert_eq!(parse_operation_timeout(&literal).unwrap().as_secs(), secs);
        }
    }

    #[test]
    fn rejects_malformed_literals() {
        for bad in ["PT10", "10S", "PT10M", "PTS", ""] {
            assert!(parse_operation_timeout(bad).is_err());
        }
    }
}
