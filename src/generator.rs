//! Test Case Generator
//!
//! Deterministic expansion of test points into concrete test cases. No
//! external calls, no randomness: the same analysis always produces the same
//! suite. Failures here are invariant violations, never recoverable errors.

use std::collections::{HashMap, HashSet};

use excellentcase_core::{
    Analysis, CaseType, PipelineResult, PipelineError, Priority, TestCase, TestCategory,
    TestPoint, TestStep, TestSuite,
};

/// Words in scenario text that signal a quantifiable constraint worth a
/// boundary case, alongside any literal digit.
const LIMIT_KEYWORDS: &[&str] = &[
    "max", "maximum", "min", "minimum", "limit", "at most", "at least", "up to",
    "no more than", "length", "size", "range", "between", "quota", "capacity",
];

/// Words that signal an invalid-input or failure path worth a negative case.
const NEGATIVE_KEYWORDS: &[&str] = &[
    "invalid", "wrong", "incorrect", "fail", "reject", "denied", "empty",
    "missing", "unauthorized", "forbidden", "expired", "malformed", "duplicate",
];

/// Words that signal an error-recovery path worth an exceptional case.
const EXCEPTIONAL_KEYWORDS: &[&str] = &[
    "timeout", "network", "interrupt", "crash", "unavailable", "exception",
    "retry", "offline", "disconnect", "abort", "recover", "degrade",
];

/// Expands validated test points into a deterministic test suite.
pub struct TestCaseGenerator;

impl TestCaseGenerator {
    /// Generate the full suite for one analysis.
    ///
    /// Every point yields a positive case; negative, boundary, and
    /// exceptional cases are added when the point's text or priority calls
    /// for them. Case ids are sequential per category and restart for every
    /// suite.
    pub fn generate(analysis: &Analysis) -> PipelineResult<TestSuite> {
        if analysis.points.is_empty() {
            return Err(PipelineError::invariant(
                "analysis reached generation with zero test points",
            ));
        }

        let mut counters: HashMap<TestCategory, u32> = HashMap::new();
        let mut signatures: HashSet<String> = HashSet::new();
        let mut cases = Vec::new();

        for point in &analysis.points {
            for case_type in case_types_for(point) {
                let case = build_case(point, case_type, &mut counters);
                let signature = case_signature(&case);
                if !signatures.insert(signature) {
                    tracing::debug!(point = %point.id, case_type = %case_type, "duplicate case skipped");
                    continue;
                }
                cases.push(case);
            }
        }

        validate_suite(&cases)?;
        tracing::info!(
            feature = %analysis.feature_name,
            points = analysis.points.len(),
            cases = cases.len(),
            "suite generated"
        );
        Ok(TestSuite {
            feature_name: analysis.feature_name.clone(),
            test_cases: cases,
        })
    }
}

/// Which case types one point expands into. The positive case is
/// unconditional.
fn case_types_for(point: &TestPoint) -> Vec<CaseType> {
    let text = format!(
        "{} {}",
        point.description.to_lowercase(),
        point.scenario.to_lowercase()
    );

    let mut types = vec![CaseType::Positive];
    if contains_any(&text, NEGATIVE_KEYWORDS) {
        types.push(CaseType::Negative);
    }
    if text.chars().any(|c| c.is_ascii_digit()) || contains_any(&text, LIMIT_KEYWORDS) {
        types.push(CaseType::Boundary);
    }
    if contains_any(&text, EXCEPTIONAL_KEYWORDS)
        || matches!(point.priority, Priority::P0 | Priority::P1)
    {
        types.push(CaseType::Exceptional);
    }
    types
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn build_case(
    point: &TestPoint,
    case_type: CaseType,
    counters: &mut HashMap<TestCategory, u32>,
) -> TestCase {
    let seq = counters.entry(point.category).or_insert(0);
    *seq += 1;
    let id = format!("TC_{}_{:03}", point.category.tag(), seq);

    let (title_prefix, steps, expected_result) = match case_type {
        CaseType::Positive => (
            "Verify",
            vec![
                step(1, format!("Prepare the preconditions for: {}", point.scenario),
                    "Environment and test data are ready"),
                step(2, format!("Execute the scenario: {}", point.scenario),
                    "The operation completes without errors"),
                step(3, format!("Check the outcome against: {}", point.description),
                    "Observed behavior matches the expectation"),
            ],
            format!("{} succeeds as specified", point.description),
        ),
        CaseType::Negative => (
            "Reject",
            vec![
                step(1, format!("Prepare invalid or conflicting input for: {}", point.scenario),
                    "Invalid test data is ready"),
                step(2, "Execute the scenario with the invalid input".to_string(),
                    "The system refuses the operation"),
                step(3, "Check the reported error".to_string(),
                    "A clear error message is shown and no partial state remains"),
            ],
            format!("Invalid input for '{}' is rejected safely", point.description),
        ),
        CaseType::Boundary => (
            "Probe limits of",
            vec![
                step(1, format!("Identify the limits implied by: {}", point.scenario),
                    "Minimum, maximum, and just-outside values are listed"),
                step(2, "Execute the scenario at each limit value".to_string(),
                    "On-limit values succeed"),
                step(3, "Execute the scenario just outside each limit".to_string(),
                    "Out-of-range values are rejected"),
            ],
            format!("Boundary behavior of '{}' matches the specification", point.description),
        ),
        CaseType::Exceptional => (
            "Recover from failure during",
            vec![
                step(1, format!("Start the scenario: {}", point.scenario),
                    "The operation is in progress"),
                step(2, "Inject a failure (dependency outage, timeout, or interruption)".to_string(),
                    "The failure is detected and reported"),
                step(3, "Retry or resume after the failure clears".to_string(),
                    "The system recovers without data loss"),
            ],
            format!("'{}' degrades and recovers safely under failure", point.description),
        ),
    };

    TestCase {
        id,
        title: format!("{} {}", title_prefix, point.description),
        category: point.category,
        priority: point.priority,
        case_type,
        steps,
        expected_result,
        description: point.scenario.clone(),
        source_point: point.id.clone(),
    }
}

fn step(step_no: u32, action: String, expected: &str) -> TestStep {
    TestStep {
        step_no,
        action,
        expected: expected.to_string(),
    }
}

/// Dedup key: normalized title plus the action sequence.
fn case_signature(case: &TestCase) -> String {
    let mut sig = case.title.to_lowercase();
    for s in &case.steps {
        sig.push('\n');
        sig.push_str(&s.action.to_lowercase());
    }
    sig
}

fn validate_suite(cases: &[TestCase]) -> PipelineResult<()> {
    if cases.is_empty() {
        return Err(PipelineError::invariant("generated suite is empty"));
    }
    let mut ids = HashSet::new();
    for case in cases {
        if !ids.insert(case.id.as_str()) {
            return Err(PipelineError::invariant(format!(
                "duplicate case id {}",
                case.id
            )));
        }
        if case.steps.is_empty() {
            return Err(PipelineError::invariant(format!("case {} has no steps", case.id)));
        }
        for (i, s) in case.steps.iter().enumerate() {
            if s.step_no != (i + 1) as u32 {
                return Err(PipelineError::invariant(format!(
                    "case {} has misnumbered steps",
                    case.id
                )));
            }
        }
        if case.expected_result.trim().is_empty() {
            return Err(PipelineError::invariant(format!(
                "case {} has no expected result",
                case.id
            )));
        }
    }
    Ok(())
}
