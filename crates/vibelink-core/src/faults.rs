//! Bearing fault classification catalog.
//!
//! Maps the numeric class labels carried by training rows to the fault
//! codes the algorithm host expects. The catalog is immutable and
//! injected wherever it is needed; there is no process-wide table.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse status of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultLevel {
    Normal,
    Fault,
    Unknown,
    Pending,
}

impl fmt::Display for FaultLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Fault => "fault",
            Self::Unknown => "unknown",
            Self::Pending => "pending",
        };
        f.pad(s)
    }
}

/// One catalog entry: standardized code, human description, level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultClass {
    pub code: String,
    pub desc: String,
    pub level: FaultLevel,
}

impl FaultClass {
    fn new(code: &str, desc: &str, level: FaultLevel) -> Self {
        Self {
            code: code.to_string(),
            desc: desc.to_string(),
            level,
        }
    }

    /// Placeholder for a label the catalog does not know.
    pub fn unknown() -> Self {
        Self::new("UNKNOWN", "unknown state", FaultLevel::Unknown)
    }

    /// Placeholder for rows from an unlabeled source.
    pub fn pending() -> Self {
        Self::new("PENDING", "awaiting prediction", FaultLevel::Pending)
    }
}

/// Immutable label → fault class mapping.
#[derive(Debug, Clone, Default)]
pub struct FaultCatalog {
    entries: HashMap<u32, FaultClass>,
}

impl FaultCatalog {
    /// Build a catalog from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, FaultClass)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The standard bearing catalog agreed with the algorithm host:
    /// one normal class plus inner-race, outer-race and ball faults at
    /// three defect diameters.
    pub fn builtin() -> Self {
        use FaultLevel::{Fault, Normal};
        Self::from_entries([
            (0, FaultClass::new("B000", "直径1-正常状态", Normal)),
            (1, FaultClass::new("B101", "直径1-内圈故障", Fault)),
            (2, FaultClass::new("B102", "直径1-外圈故障", Fault)),
            (3, FaultClass::new("B103", "直径1-滚珠故障", Fault)),
            (4, FaultClass::new("B201", "直径2-内圈故障", Fault)),
            (5, FaultClass::new("B202", "直径2-外圈故障", Fault)),
            (6, FaultClass::new("B203", "直径2-滚珠故障", Fault)),
            (7, FaultClass::new("B301", "直径3-内圈故障", Fault)),
            (8, FaultClass::new("B302", "直径3-外圈故障", Fault)),
            (9, FaultClass::new("B303", "直径3-滚珠故障", Fault)),
        ])
    }

    /// Look up a label.
    pub fn get(&self, label: u32) -> Option<&FaultClass> {
        self.entries.get(&label)
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = FaultCatalog::builtin();
        assert_eq!(catalog.len(), 10);

        let normal = catalog.get(0).unwrap();
        assert_eq!(normal.code, "B000");
        assert_eq!(normal.level, FaultLevel::Normal);

        let ball = catalog.get(9).unwrap();
        assert_eq!(ball.code, "B303");
        assert_eq!(ball.level, FaultLevel::Fault);

        assert!(catalog.get(10).is_none());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FaultLevel::Normal).unwrap(),
            "\"normal\""
        );
        assert_eq!(
            serde_json::to_string(&FaultLevel::Pending).unwrap(),
            "\"pending\""
        );
        let level: FaultLevel = serde_json::from_str("\"fault\"").unwrap();
        assert_eq!(level, FaultLevel::Fault);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(FaultClass::unknown().code, "UNKNOWN");
        assert_eq!(FaultClass::unknown().level, FaultLevel::Unknown);
        assert_eq!(FaultClass::pending().code, "PENDING");
        assert_eq!(FaultClass::pending().level, FaultLevel::Pending);
    }
}
