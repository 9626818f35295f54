//! Worksheet payloads built from workbook columns.

use std::collections::BTreeMap;

use cnu_model::{AREA_RESULT_SUFFIX, Compound, SampleQuantification, format_number};
use cnu_qbench::WorksheetUpdate;

use crate::plan::{ScheduledUpdate, TestKind};

/// Fields of a CN worksheet for one column.
///
/// Serving fields are written under both the current and legacy key names.
pub fn cannabinoid_payload(sample: &SampleQuantification) -> WorksheetUpdate {
    let mut data = BTreeMap::new();
    let mut put = |key: &str, value: Option<f64>| {
        if let Some(value) = value {
            data.insert(key.to_string(), format_number(value));
        }
    };

    put("sample_mass", sample.sample_mass_mg);
    put("dilution", sample.dilution);
    put("serving_mass_g", sample.serving_mass_g);
    put("unit_weight", sample.serving_mass_g);
    put("servings_per_package", sample.servings_per_package);
    put("units_per_package", sample.servings_per_package);

    for (compound, value) in sample.components.present() {
        data.insert(compound.name().to_string(), format_number(value));
    }
    for (compound, value) in sample.area_results.present() {
        data.insert(area_key(compound), format_number(value));
    }
    WorksheetUpdate::new(data)
}

/// Fields of an HO worksheet, suffixed with each column's replicate slot.
pub fn homogeneity_payload(columns: &[(usize, SampleQuantification)]) -> WorksheetUpdate {
    let mut data = BTreeMap::new();
    for (index, sample) in columns {
        if let Some(mass) = sample.sample_mass_mg {
            data.insert(format!("sample_mass_{index}"), format_number(mass));
        }
        if let Some(dilution) = sample.dilution {
            data.insert(format!("dilution_{index}"), format_number(dilution));
        }
        for (compound, value) in sample.components.present() {
            data.insert(format!("{}_{index}", compound.name()), format_number(value));
        }
    }
    WorksheetUpdate::new(data)
}

fn area_key(compound: Compound) -> String {
    format!("{}{AREA_RESULT_SUFFIX}", compound.name())
}

impl ScheduledUpdate {
    /// Worksheet fields to send for this update.
    pub fn payload(&self) -> WorksheetUpdate {
        match self.kind() {
            TestKind::Cannabinoids => self
                .columns
                .first()
                .map(|(_, sample)| cannabinoid_payload(sample))
                .unwrap_or_default(),
            TestKind::Homogeneity => homogeneity_payload(&self.columns),
        }
    }
}
