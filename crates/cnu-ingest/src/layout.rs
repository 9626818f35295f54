//! Fixed positions in the CN results workbook (0-based rows and columns).

/// Sheet holding one column per sample.
pub const RESULTS_SHEET: &str = "Results Transfer";
/// Optional sheet whose first row lists batch numbers.
pub const BATCH_SHEET: &str = "Blank Spike Recovery";

pub const HEADER_ROW: u32 = 0;
/// First compound row; compounds follow in `Compound::ALL` order.
pub const COMPONENT_ROW_OFFSET: u32 = 1;
pub const SAMPLE_MASS_ROW: u32 = 22;
pub const DILUTION_ROW: u32 = 23;
pub const SERVING_MASS_ROW: u32 = 24;
pub const SERVINGS_PER_PACKAGE_ROW: u32 = 25;
/// First area-result row; compounds follow in `Compound::ALL` order.
pub const AREA_RESULT_ROW_OFFSET: u32 = 26;

/// Batch numbers sit in every other column of the batch sheet.
pub const BATCH_COLUMN_STEP: usize = 2;

/// Labels searched for in the results sheet below the header row.
pub const RUN_DATE_LABEL: &str = "run date";
pub const INSTRUMENT_LABEL: &str = "instrument";

/// A1-style reference for a 0-based cell position.
pub fn cell_ref(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(22, 1), "B23");
        assert_eq!(cell_ref(4, 25), "Z5");
        assert_eq!(cell_ref(0, 26), "AA1");
        assert_eq!(cell_ref(9, 701), "ZZ10");
    }

    #[test]
    fn test_area_rows_follow_compounds() {
        let compounds = cnu_model::Compound::ALL.len() as u32;
        assert!(COMPONENT_ROW_OFFSET + compounds <= SAMPLE_MASS_ROW);
        assert_eq!(AREA_RESULT_ROW_OFFSET, SERVINGS_PER_PACKAGE_ROW + 1);
    }
}
