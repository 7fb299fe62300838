use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Hashes serializable data into an i64 using CBOR serialization and XxHash64.
///
/// This provides a stable hash across different runs and systems by:
/// - Serializing the data to CBOR format (deterministic binary representation)
/// - Using XxHash64 with a fixed seed (0) for consistent hashing
pub fn hash_as_i64<T: Serialize>(data: &T) -> Result<i64, String> {
    let mut hasher = XxHash64::with_seed(0);
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(data, &mut cbor)
        .map_err(|e| format!("Failed to serialize data for hashing: {e}"))?;
    hasher.write(&cbor);
    Ok(hasher.finish() as i64)
}

/// Truncates a timestamp to the microsecond precision of the storage layer.
pub fn storage_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Next concurrency token for a record last written at `previous`.
///
/// Always strictly after `previous`, even when the clock has not advanced
/// past it at storage precision.
pub fn next_revision(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = storage_timestamp(now);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let first = hash_as_i64(&("buyer", 42)).unwrap();
        let second = hash_as_i64(&("buyer", 42)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, hash_as_i64(&("buyer", 43)).unwrap());
    }

    #[test]
    fn test_next_revision_moves_forward() {
        let previous = storage_timestamp(Utc::now());
        assert!(next_revision(previous, previous) > previous);
        assert!(next_revision(previous, previous - Duration::seconds(5)) > previous);

        let later = previous + Duration::seconds(1);
        assert_eq!(next_revision(previous, later), later);
    }
}
