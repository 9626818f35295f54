//! Matching workbook columns to QBench tests.
//!
//! A base sample can have up to three CN tests and one HO (homogeneity)
//! test in QBench. Which columns go to which test depends on how many of
//! each are open for review:
//!
//! - one HO test only: every replicate column goes to the HO worksheet;
//! - one CN and one HO: the first column goes to CN, every column to HO;
//! - one to three CN tests only: columns and tests are paired in order.
//!
//! Anything else is skipped with a reason.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;

use cnu_model::SampleQuantification;
use cnu_qbench::{ASSAY_ID_CN, ASSAY_ID_HO, QBenchSample, QBenchTest};
use serde::Serialize;

/// Tests must be in this state to receive values.
pub const REQUIRED_STATE: &str = "NEEDS REVIEW (DATA TEAM)";

/// Replicate slots on the HO worksheet.
pub const HO_ALLOWED_INDICES: RangeInclusive<usize> = 0..=2;

const MAX_CN_TESTS: usize = 3;

fn state_priority(state: &str) -> u8 {
    match state {
        "NOT STARTED" => 0,
        "IN PROGRESS" => 1,
        "NOT REPORTABLE" => 2,
        "NEEDS REVIEW (DATA TEAM)" => 3,
        "IN REVIEW" => 4,
        "COMPLETED" => 5,
        "REPORTED" => 6,
        _ => 99,
    }
}

/// Kind of QBench test a worksheet update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TestKind {
    #[serde(rename = "CN")]
    Cannabinoids,
    #[serde(rename = "HO")]
    Homogeneity,
}

impl TestKind {
    pub fn from_assay(assay_id: u64) -> Option<Self> {
        match assay_id {
            ASSAY_ID_CN => Some(Self::Cannabinoids),
            ASSAY_ID_HO => Some(Self::Homogeneity),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cannabinoids => "CN",
            Self::Homogeneity => "HO",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A QBench test that may receive values.
#[derive(Debug, Clone)]
pub struct EligibleTest {
    pub test_id: u64,
    pub kind: TestKind,
    pub state: String,
    pub batches: BTreeSet<String>,
    pub test: QBenchTest,
}

/// Select CN and HO tests awaiting data review, CN first.
///
/// CN tests are narrowed to those sharing a batch with the workbook columns;
/// when none do, every eligible CN test is kept.
pub fn eligible_tests(tests: &[QBenchTest], excel_batches: &BTreeSet<String>) -> Vec<EligibleTest> {
    let mut selected: BTreeMap<TestKind, Vec<EligibleTest>> = BTreeMap::new();
    let mut fallback: BTreeMap<TestKind, Vec<EligibleTest>> = BTreeMap::new();

    for test in tests {
        let Some(kind) = test.assay_id().and_then(TestKind::from_assay) else {
            continue;
        };
        let state = test.normalized_state();
        if state != REQUIRED_STATE {
            continue;
        }
        let Some(test_id) = test.id else {
            continue;
        };
        let eligible = EligibleTest {
            test_id,
            kind,
            state,
            batches: test.batches.iter().cloned().collect(),
            test: test.clone(),
        };

        fallback.entry(kind).or_default().push(eligible.clone());
        if kind == TestKind::Cannabinoids
            && !excel_batches.is_empty()
            && eligible.batches.is_disjoint(excel_batches)
        {
            continue;
        }
        selected.entry(kind).or_default().push(eligible);
    }

    let mut result = Vec::new();
    for kind in [TestKind::Cannabinoids, TestKind::Homogeneity] {
        let mut group = match selected.remove(&kind) {
            Some(group) if !group.is_empty() => group,
            _ => fallback.remove(&kind).unwrap_or_default(),
        };
        group.sort_by_key(|test| (state_priority(&test.state), test.test_id));
        result.extend(group);
    }
    result
}

/// Replicate slot of a column: 0 for the base id, the numeric suffix for
/// `A-N`, else the column's occurrence index.
pub fn replicate_index(sample: &SampleQuantification, base_sample_id: &str) -> usize {
    if sample.sample_id == base_sample_id {
        return 0;
    }
    sample
        .sample_id
        .rsplit_once('-')
        .and_then(|(_, suffix)| suffix.parse().ok())
        .unwrap_or(sample.test_index)
}

/// Why a sample was not synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SkipReason {
    NoEligibleTests,
    MultipleHoTests { count: usize },
    TooManyCnTests { count: usize },
    DuplicateReplicates { indices: Vec<usize> },
    HoIndexOutOfRange { indices: Vec<usize> },
    ColumnCountMismatch { columns: usize, cn_tests: usize },
    UnsupportedCombination { cn: usize, ho: usize },
    NoPayload,
    AlreadyProcessed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleTests => write!(f, "no QBench tests awaiting data review"),
            Self::MultipleHoTests { count } => {
                write!(f, "{count} HO tests awaiting review; only one is supported")
            }
            Self::TooManyCnTests { count } => {
                write!(f, "{count} CN tests awaiting review; at most {MAX_CN_TESTS} are supported")
            }
            Self::DuplicateReplicates { indices } => {
                write!(f, "replicate indices repeated in the workbook: {}", join(indices))
            }
            Self::HoIndexOutOfRange { indices } => {
                write!(f, "HO replicate indices {} outside 0-2", join(indices))
            }
            Self::ColumnCountMismatch { columns, cn_tests } => {
                write!(f, "{columns} workbook columns for {cn_tests} CN tests")
            }
            Self::UnsupportedCombination { cn, ho } => {
                write!(f, "unsupported combination of {cn} CN and {ho} HO tests")
            }
            Self::NoPayload => write!(f, "no values to send"),
            Self::AlreadyProcessed => write!(f, "QBench worksheets already hold values"),
        }
    }
}

fn join(indices: &[usize]) -> String {
    indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columns assigned to one QBench test, each with its replicate slot.
#[derive(Debug, Clone)]
pub struct ScheduledUpdate {
    pub test: EligibleTest,
    pub columns: Vec<(usize, SampleQuantification)>,
}

impl ScheduledUpdate {
    pub fn kind(&self) -> TestKind {
        self.test.kind
    }

    pub fn indices(&self) -> Vec<usize> {
        self.columns.iter().map(|(index, _)| *index).collect()
    }

    pub fn column_headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(_, sample)| sample.display_header().to_string())
            .collect()
    }
}

/// Decision for one base sample.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    pub base_sample_id: String,
    pub updates: Vec<ScheduledUpdate>,
    /// Column headers that receive no update.
    pub skipped_columns: Vec<String>,
    pub skip: Option<SkipReason>,
    pub available_cn: usize,
    pub available_ho: usize,
}

/// Plan the worksheet updates for one base sample.
///
/// `columns` must be the sample's workbook columns ordered by test index.
pub fn plan_sample(
    base_sample_id: &str,
    columns: &[SampleQuantification],
    qbench_sample: &QBenchSample,
) -> SamplePlan {
    let excel_batches: BTreeSet<String> = columns
        .iter()
        .filter_map(|column| column.batch_code.clone())
        .collect();
    let available = eligible_tests(&qbench_sample.tests, &excel_batches);
    let (cn_tests, ho_tests): (Vec<_>, Vec<_>) = available
        .into_iter()
        .partition(|test| test.kind == TestKind::Cannabinoids);

    let mut plan = SamplePlan {
        base_sample_id: base_sample_id.to_string(),
        updates: Vec::new(),
        skipped_columns: Vec::new(),
        skip: None,
        available_cn: cn_tests.len(),
        available_ho: ho_tests.len(),
    };

    match schedule(base_sample_id, columns, cn_tests, ho_tests) {
        Ok(updates) => {
            let used: BTreeSet<&str> = updates
                .iter()
                .flat_map(|update| update.columns.iter())
                .map(|(_, sample)| sample.sample_id.as_str())
                .collect();
            plan.skipped_columns = columns
                .iter()
                .filter(|column| !used.contains(column.sample_id.as_str()))
                .map(|column| column.display_header().to_string())
                .collect();
            plan.updates = updates;
        }
        Err(reason) => {
            plan.skipped_columns = columns
                .iter()
                .map(|column| column.display_header().to_string())
                .collect();
            plan.skip = Some(reason);
        }
    }
    plan
}

fn schedule(
    base_sample_id: &str,
    columns: &[SampleQuantification],
    cn_tests: Vec<EligibleTest>,
    mut ho_tests: Vec<EligibleTest>,
) -> Result<Vec<ScheduledUpdate>, SkipReason> {
    if cn_tests.is_empty() && ho_tests.is_empty() {
        return Err(SkipReason::NoEligibleTests);
    }
    if ho_tests.len() > 1 {
        return Err(SkipReason::MultipleHoTests {
            count: ho_tests.len(),
        });
    }
    if cn_tests.len() > MAX_CN_TESTS {
        return Err(SkipReason::TooManyCnTests {
            count: cn_tests.len(),
        });
    }

    let mut replicates: BTreeMap<usize, SampleQuantification> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for column in columns {
        let index = replicate_index(column, base_sample_id);
        if replicates.insert(index, column.clone()).is_some() {
            duplicates.push(index);
        }
    }
    if !duplicates.is_empty() {
        return Err(SkipReason::DuplicateReplicates {
            indices: duplicates,
        });
    }

    let ho_update = |test: EligibleTest| {
        let indices: Vec<usize> = replicates.keys().copied().collect();
        if indices.iter().any(|index| !HO_ALLOWED_INDICES.contains(index)) {
            return Err(SkipReason::HoIndexOutOfRange { indices });
        }
        Ok(ScheduledUpdate {
            test,
            columns: replicates
                .iter()
                .map(|(index, sample)| (*index, sample.clone()))
                .collect(),
        })
    };

    match (cn_tests.len(), ho_tests.pop()) {
        (0, Some(ho)) => Ok(vec![ho_update(ho)?]),
        (1, Some(ho)) => {
            let Some(first) = columns.first() else {
                return Err(SkipReason::NoPayload);
            };
            let cn = ScheduledUpdate {
                test: cn_tests.into_iter().next().ok_or(SkipReason::NoEligibleTests)?,
                columns: vec![(replicate_index(first, base_sample_id), first.clone())],
            };
            Ok(vec![cn, ho_update(ho)?])
        }
        (count, None) if count == columns.len() => Ok(cn_tests
            .into_iter()
            .zip(columns)
            .map(|(test, column)| ScheduledUpdate {
                test,
                columns: vec![(replicate_index(column, base_sample_id), column.clone())],
            })
            .collect()),
        (count, None) => Err(SkipReason::ColumnCountMismatch {
            columns: columns.len(),
            cn_tests: count,
        }),
        (count, Some(_)) => Err(SkipReason::UnsupportedCombination { cn: count, ho: 1 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnu_model::CompoundValues;
    use serde_json::json;

    fn column(sample_id: &str, test_index: usize, batch: Option<&str>) -> SampleQuantification {
        SampleQuantification {
            sample_id: sample_id.to_string(),
            base_sample_id: "14956".to_string(),
            test_index,
            column_header: sample_id.to_string(),
            batch_code: batch.map(str::to_string),
            components: CompoundValues::empty(),
            area_results: CompoundValues::empty(),
            sample_mass_mg: Some(100.0),
            dilution: Some(2.0),
            serving_mass_g: None,
            servings_per_package: None,
        }
    }

    fn test(id: u64, assay: u64, state: &str, batches: &[&str]) -> QBenchTest {
        serde_json::from_value(json!({
            "id": id,
            "assay": {"id": assay},
            "state": state,
            "batches": batches,
        }))
        .unwrap()
    }

    fn qbench(tests: Vec<QBenchTest>) -> QBenchSample {
        QBenchSample {
            id: "14956".to_string(),
            tests,
        }
    }

    #[test]
    fn test_replicate_index() {
        assert_eq!(replicate_index(&column("14956", 3, None), "14956"), 0);
        assert_eq!(replicate_index(&column("14956-2", 0, None), "14956"), 2);
        assert_eq!(replicate_index(&column("14956-x", 4, None), "14956"), 4);
    }

    #[test]
    fn test_eligible_tests_filter_and_sort() {
        let tests = vec![
            test(30, ASSAY_ID_CN, REQUIRED_STATE, &["8561"]),
            test(10, ASSAY_ID_CN, "needs review (data team)", &["8561"]),
            test(20, ASSAY_ID_CN, REQUIRED_STATE, &["9999"]),
            test(40, ASSAY_ID_CN, "IN PROGRESS", &["8561"]),
            test(50, ASSAY_ID_HO, REQUIRED_STATE, &[]),
            test(60, 7, REQUIRED_STATE, &["8561"]),
        ];
        let batches = BTreeSet::from(["8561".to_string()]);
        let eligible: Vec<_> = eligible_tests(&tests, &batches)
            .iter()
            .map(|t| (t.test_id, t.kind))
            .collect();
        assert_eq!(
            eligible,
            vec![
                (10, TestKind::Cannabinoids),
                (30, TestKind::Cannabinoids),
                (50, TestKind::Homogeneity),
            ]
        );
    }

    #[test]
    fn test_cn_batch_filter_falls_back() {
        let tests = vec![test(20, ASSAY_ID_CN, REQUIRED_STATE, &["9999"])];
        let batches = BTreeSet::from(["8561".to_string()]);
        assert_eq!(eligible_tests(&tests, &batches).len(), 1);
    }

    #[test]
    fn test_single_cn() {
        let plan = plan_sample(
            "14956",
            &[column("14956", 0, Some("8561"))],
            &qbench(vec![test(10, ASSAY_ID_CN, REQUIRED_STATE, &["8561"])]),
        );
        assert_eq!(plan.skip, None);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].test.test_id, 10);
        assert!(plan.skipped_columns.is_empty());
    }

    #[test]
    fn test_ho_only_takes_all_replicates() {
        let columns = [column("14956", 0, None), column("14956-1", 1, None), column("14956-2", 2, None)];
        let plan = plan_sample(
            "14956",
            &columns,
            &qbench(vec![test(50, ASSAY_ID_HO, REQUIRED_STATE, &[])]),
        );
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].kind(), TestKind::Homogeneity);
        assert_eq!(plan.updates[0].indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_ho_index_out_of_range() {
        let columns = [column("14956", 0, None), column("14956-3", 1, None)];
        let plan = plan_sample(
            "14956",
            &columns,
            &qbench(vec![test(50, ASSAY_ID_HO, REQUIRED_STATE, &[])]),
        );
        assert_eq!(
            plan.skip,
            Some(SkipReason::HoIndexOutOfRange {
                indices: vec![0, 3]
            })
        );
        assert_eq!(plan.skipped_columns, vec!["14956", "14956-3"]);
    }

    #[test]
    fn test_cn_and_ho() {
        let columns = [column("14956", 0, None), column("14956-1", 1, None)];
        let plan = plan_sample(
            "14956",
            &columns,
            &qbench(vec![
                test(10, ASSAY_ID_CN, REQUIRED_STATE, &[]),
                test(50, ASSAY_ID_HO, REQUIRED_STATE, &[]),
            ]),
        );
        assert_eq!(plan.updates.len(), 2);
        assert_eq!(plan.updates[0].kind(), TestKind::Cannabinoids);
        assert_eq!(plan.updates[0].column_headers(), vec!["14956"]);
        assert_eq!(plan.updates[1].indices(), vec![0, 1]);
    }

    #[test]
    fn test_cn_column_count_must_match() {
        let columns = [column("14956", 0, None), column("14956-1", 1, None)];
        let plan = plan_sample(
            "14956",
            &columns,
            &qbench(vec![test(10, ASSAY_ID_CN, REQUIRED_STATE, &[])]),
        );
        assert_eq!(
            plan.skip,
            Some(SkipReason::ColumnCountMismatch {
                columns: 2,
                cn_tests: 1
            })
        );
    }

    #[test]
    fn test_duplicate_replicates_skip() {
        let columns = [column("14956", 0, None), column("14956", 1, None)];
        let plan = plan_sample(
            "14956",
            &columns,
            &qbench(vec![
                test(10, ASSAY_ID_CN, REQUIRED_STATE, &[]),
                test(11, ASSAY_ID_CN, REQUIRED_STATE, &[]),
            ]),
        );
        assert_eq!(
            plan.skip,
            Some(SkipReason::DuplicateReplicates { indices: vec![0] })
        );
    }

    #[test]
    fn test_unsupported_counts() {
        let columns = [column("14956", 0, None)];
        let two_ho = qbench(vec![
            test(50, ASSAY_ID_HO, REQUIRED_STATE, &[]),
            test(51, ASSAY_ID_HO, REQUIRED_STATE, &[]),
        ]);
        assert_eq!(
            plan_sample("14956", &columns, &two_ho).skip,
            Some(SkipReason::MultipleHoTests { count: 2 })
        );

        let four_cn = qbench((10..14).map(|id| test(id, ASSAY_ID_CN, REQUIRED_STATE, &[])).collect());
        assert_eq!(
            plan_sample("14956", &columns, &four_cn).skip,
            Some(SkipReason::TooManyCnTests { count: 4 })
        );

        let two_cn_one_ho = qbench(vec![
            test(10, ASSAY_ID_CN, REQUIRED_STATE, &[]),
            test(11, ASSAY_ID_CN, REQUIRED_STATE, &[]),
            test(50, ASSAY_ID_HO, REQUIRED_STATE, &[]),
        ]);
        assert_eq!(
            plan_sample("14956", &columns, &two_cn_one_ho).skip,
            Some(SkipReason::UnsupportedCombination { cn: 2, ho: 1 })
        );

        assert_eq!(
            plan_sample("14956", &columns, &qbench(Vec::new())).skip,
            Some(SkipReason::NoEligibleTests)
        );
    }
}
