//! Per-row message envelope.
//!
//! One envelope is built for each row immediately before it is
//! published and is never reused. The wire form is UTF-8 JSON; text
//! fields may carry non-ASCII descriptions and must survive intact.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::datasource::RowRecord;
use crate::faults::{FaultCatalog, FaultClass, FaultLevel};
use crate::features::SignalFeatures;

/// Decimal digits kept on each feature value.
pub const FEATURE_PRECISION: u32 = 6;

/// The message published per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sample_id: i64,
    pub fault_code: String,
    pub fault_desc: String,
    pub fault_level: FaultLevel,
    pub signal_features: SignalFeatures,
    /// Build time, epoch seconds.
    pub send_timestamp: i64,
    /// Build time, local `YYYY-MM-DD HH:MM:SS`.
    pub send_time: String,
}

impl Envelope {
    /// Build the envelope for one row.
    ///
    /// Classification resolution: a label known to the catalog uses its
    /// entry; an unknown label uses the `UNKNOWN` placeholder; an
    /// unlabeled row uses the `PENDING` placeholder. Features are
    /// rounded to [`FEATURE_PRECISION`] digits. Reads the wall clock.
    pub fn build(row: &RowRecord, features: &SignalFeatures, catalog: &FaultCatalog) -> Self {
        let class = match row.label {
            Some(label) => catalog
                .get(label)
                .cloned()
                .unwrap_or_else(FaultClass::unknown),
            None => FaultClass::pending(),
        };

        let now = Local::now();
        Self {
            sample_id: row.id,
            fault_code: class.code,
            fault_desc: class.desc,
            fault_level: class.level,
            signal_features: features.rounded(FEATURE_PRECISION),
            send_timestamp: now.timestamp(),
            send_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Serialize to the UTF-8 JSON wire form.
    ///
    /// Non-ASCII text passes through unescaped. Fails only if a feature
    /// is non-finite, which the consumer could not represent anyway.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> SignalFeatures {
        SignalFeatures::derive(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()
    }

    fn labeled_row(id: i64, label: u32) -> RowRecord {
        RowRecord {
            id,
            signal: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            label: Some(label),
        }
    }

    #[test]
    fn test_labeled_row_uses_catalog_entry() {
        let catalog = FaultCatalog::builtin();
        let envelope = Envelope::build(&labeled_row(7, 1), &features(), &catalog);

        assert_eq!(envelope.sample_id, 7);
        assert_eq!(envelope.fault_code, "B101");
        assert_eq!(envelope.fault_desc, "直径1-内圈故障");
        assert_eq!(envelope.fault_level, FaultLevel::Fault);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let catalog = FaultCatalog::builtin();
        let envelope = Envelope::build(&labeled_row(8, 99), &features(), &catalog);

        assert_eq!(envelope.fault_code, "UNKNOWN");
        assert_eq!(envelope.fault_desc, "unknown state");
        assert_eq!(envelope.fault_level, FaultLevel::Unknown);
    }

    #[test]
    fn test_unlabeled_row_marked_pending() {
        let catalog = FaultCatalog::builtin();
        let row = RowRecord {
            id: 9,
            signal: vec![0.0, 1.0],
            label: None,
        };
        let envelope = Envelope::build(&row, &features(), &catalog);

        assert_eq!(envelope.fault_code, "PENDING");
        assert_eq!(envelope.fault_desc, "awaiting prediction");
        assert_eq!(envelope.fault_level, FaultLevel::Pending);
    }

    #[test]
    fn test_features_rounded() {
        let catalog = FaultCatalog::builtin();
        let raw = SignalFeatures {
            mean: 0.123_456_789,
            std: 0.1,
            max: 1.0,
            min: 0.0,
            peak_to_peak: 1.0,
        };
        let envelope = Envelope::build(&labeled_row(1, 0), &raw, &catalog);
        assert_eq!(envelope.signal_features.mean, 0.123_457);
    }

    #[test]
    fn test_wire_keys() {
        let catalog = FaultCatalog::builtin();
        let envelope = Envelope::build(&labeled_row(1, 0), &features(), &catalog);
        let value: serde_json::Value =
            serde_json::from_slice(&envelope.to_payload().unwrap()).unwrap();

        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "fault_code",
                "fault_desc",
                "fault_level",
                "sample_id",
                "send_time",
                "send_timestamp",
                "signal_features",
            ]
        );

        let feats = obj["signal_features"].as_object().unwrap();
        let mut fkeys: Vec<_> = feats.keys().map(String::as_str).collect();
        fkeys.sort_unstable();
        assert_eq!(fkeys, ["max", "mean", "min", "peak_to_peak", "std"]);

        assert!(obj["sample_id"].is_i64());
        assert!(obj["send_timestamp"].is_i64());
        assert_eq!(obj["fault_level"], "normal");
    }

    #[test]
    fn test_round_trip_preserves_non_ascii() {
        let catalog = FaultCatalog::builtin();
        let envelope = Envelope::build(&labeled_row(3, 4), &features(), &catalog);

        let payload = envelope.to_payload().unwrap();
        let text = std::str::from_utf8(&payload).unwrap();
        // ensure the description is not \u-escaped on the wire
        assert!(text.contains("直径2-内圈故障"));

        let decoded: Envelope = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_send_time_format() {
        let catalog = FaultCatalog::builtin();
        let envelope = Envelope::build(&labeled_row(1, 0), &features(), &catalog);
        chrono::NaiveDateTime::parse_from_str(&envelope.send_time, "%Y-%m-%d %H:%M:%S").unwrap();
        assert!(envelope.send_timestamp > 0);
    }
}
