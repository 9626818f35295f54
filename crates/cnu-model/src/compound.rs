//! Cannabinoid compounds quantified by the CN method.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A compound reported by the CN (cannabinoid potency) method.
///
/// Declaration order is the row order of the results sheet and the order used
/// everywhere values are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Compound {
    #[serde(rename = "CBDVA")]
    Cbdva,
    #[serde(rename = "CBDV")]
    Cbdv,
    #[serde(rename = "CBDA")]
    Cbda,
    #[serde(rename = "CBGA")]
    Cbga,
    #[serde(rename = "CBG")]
    Cbg,
    #[serde(rename = "CBD")]
    Cbd,
    #[serde(rename = "THCV")]
    Thcv,
    #[serde(rename = "THCVA")]
    Thcva,
    #[serde(rename = "CBCV")]
    Cbcv,
    #[serde(rename = "CBN")]
    Cbn,
    #[serde(rename = "D9-THC")]
    D9Thc,
    #[serde(rename = "D8-THC")]
    D8Thc,
    #[serde(rename = "CBL")]
    Cbl,
    #[serde(rename = "THCA")]
    Thca,
    #[serde(rename = "CBC")]
    Cbc,
    #[serde(rename = "CBCA")]
    Cbca,
    #[serde(rename = "CBLA")]
    Cbla,
    #[serde(rename = "CBT")]
    Cbt,
}

impl Compound {
    /// All compounds in sheet order.
    pub const ALL: [Compound; 18] = [
        Compound::Cbdva,
        Compound::Cbdv,
        Compound::Cbda,
        Compound::Cbga,
        Compound::Cbg,
        Compound::Cbd,
        Compound::Thcv,
        Compound::Thcva,
        Compound::Cbcv,
        Compound::Cbn,
        Compound::D9Thc,
        Compound::D8Thc,
        Compound::Cbl,
        Compound::Thca,
        Compound::Cbc,
        Compound::Cbca,
        Compound::Cbla,
        Compound::Cbt,
    ];

    /// Name used in sheets, QBench worksheet keys and audit payloads.
    pub const fn name(&self) -> &'static str {
        match self {
            Compound::Cbdva => "CBDVA",
            Compound::Cbdv => "CBDV",
            Compound::Cbda => "CBDA",
            Compound::Cbga => "CBGA",
            Compound::Cbg => "CBG",
            Compound::Cbd => "CBD",
            Compound::Thcv => "THCV",
            Compound::Thcva => "THCVA",
            Compound::Cbcv => "CBCV",
            Compound::Cbn => "CBN",
            Compound::D9Thc => "D9-THC",
            Compound::D8Thc => "D8-THC",
            Compound::Cbl => "CBL",
            Compound::Thca => "THCA",
            Compound::Cbc => "CBC",
            Compound::Cbca => "CBCA",
            Compound::Cbla => "CBLA",
            Compound::Cbt => "CBT",
        }
    }

    /// Zero-based position of the compound in [`Compound::ALL`].
    pub fn position(&self) -> usize {
        Compound::ALL
            .iter()
            .position(|candidate| candidate == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compound {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Compound::ALL
            .iter()
            .copied()
            .find(|compound| compound.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownCompound(trimmed.to_string()))
    }
}

/// Per-compound values for one sample column; `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompoundValues(BTreeMap<Compound, Option<f64>>);

impl CompoundValues {
    /// Values with every compound present but missing.
    pub fn empty() -> Self {
        Self(Compound::ALL.iter().map(|c| (*c, None)).collect())
    }

    /// Build values by reading each compound from `read`.
    pub fn from_fn(mut read: impl FnMut(Compound) -> Option<f64>) -> Self {
        Self(Compound::ALL.iter().map(|c| (*c, read(*c))).collect())
    }

    pub fn get(&self, compound: Compound) -> Option<f64> {
        self.0.get(&compound).copied().flatten()
    }

    pub fn set(&mut self, compound: Compound, value: Option<f64>) {
        self.0.insert(compound, value);
    }

    /// Present values in compound order.
    pub fn present(&self) -> impl Iterator<Item = (Compound, f64)> + '_ {
        self.0
            .iter()
            .filter_map(|(compound, value)| value.map(|v| (*compound, v)))
    }

    /// Number of compounds with a value.
    pub fn present_count(&self) -> usize {
        self.0.values().filter(|value| value.is_some()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.present_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("d9-thc".parse::<Compound>().unwrap(), Compound::D9Thc);
        assert_eq!(" CBGA ".parse::<Compound>().unwrap(), Compound::Cbga);
        assert!("THC".parse::<Compound>().is_err());
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = Compound::ALL;
        sorted.sort();
        assert_eq!(sorted, Compound::ALL);
        assert_eq!(Compound::Cbt.position(), 17);
    }

    #[test]
    fn values_serialize_in_sheet_order() {
        let mut values = CompoundValues::empty();
        values.set(Compound::Cbt, Some(1.5));
        values.set(Compound::Cbdva, Some(0.25));
        let json = serde_json::to_string(&values).unwrap();
        assert!(json.starts_with("{\"CBDVA\":0.25,\"CBDV\":null"));
        assert!(json.ends_with("\"CBT\":1.5}"));
    }

    #[test]
    fn present_skips_missing() {
        let values = CompoundValues::from_fn(|c| (c == Compound::Cbd).then_some(2.0));
        let present: Vec<_> = values.present().collect();
        assert_eq!(present, vec![(Compound::Cbd, 2.0)]);
        assert_eq!(values.present_count(), 1);
        assert!(!values.is_all_missing());
        assert!(CompoundValues::empty().is_all_missing());
    }
}
