use crate::plan::Plan;
use infraguard_types::{FatalError, PlanAction, ReportSummary, RuleResult, Severity, SeverityCounts, Verdict};

/// The outcome of one run, before run metadata is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub verdict: Verdict,
    pub counts: SeverityCounts,
    pub results: Vec<RuleResult>,
    pub plan: Option<Vec<PlanAction>>,
    pub summary: ReportSummary,
    pub error: Option<FatalError>,
}

fn severity_counts(results: &[RuleResult]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for r in results {
        match (r.passed, r.severity) {
            (true, _) => counts.passed += 1,
            (false, Severity::Blocking) => counts.blocking_failed += 1,
            (false, Severity::Advisory) => counts.advisory_failed += 1,
        }
    }
    counts
}

/// Any failing blocking rule fails the run; advisory failures never do.
fn compute_verdict(results: &[RuleResult]) -> Verdict {
    if results.iter().any(RuleResult::is_blocking_failure) {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

fn summarize(
    results: &[RuleResult],
    counts: &SeverityCounts,
    plan: Option<&Plan>,
    resources: usize,
) -> ReportSummary {
    let findings: u32 = results.iter().map(|r| r.findings.len() as u32).sum();
    ReportSummary {
        resources: resources as u32,
        rules_evaluated: results.len() as u32,
        rules_passed: counts.passed,
        rules_failed: counts.blocking_failed + counts.advisory_failed,
        counts: counts.clone(),
        plan: plan.map(Plan::counts),
        findings_total: findings,
        findings_emitted: findings,
        truncated_reason: None,
    }
}

/// Combine rule results and the plan into a report. Pure and deterministic.
pub fn generate(results: Vec<RuleResult>, plan: Option<Plan>, resources: usize) -> Report {
    let counts = severity_counts(&results);
    let summary = summarize(&results, &counts, plan.as_ref(), resources);
    Report {
        verdict: compute_verdict(&results),
        counts,
        results,
        plan: plan.map(Plan::into_actions),
        summary,
        error: None,
    }
}

impl Report {
    /// A run that stopped before any rule ran (parse, reference or variable errors).
    pub fn from_fatal(error: FatalError) -> Self {
        Report {
            verdict: Verdict::Fail,
            counts: SeverityCounts::default(),
            results: Vec::new(),
            plan: None,
            summary: ReportSummary::default(),
            error: Some(error),
        }
    }

    /// Rules ran but planning failed; the rule results are kept and the run fails.
    pub fn with_plan_error(results: Vec<RuleResult>, error: FatalError, resources: usize) -> Self {
        let mut report = generate(results, None, resources);
        report.verdict = Verdict::Fail;
        report.error = Some(error);
        report
    }

    /// Keep at most `max` findings across all results, in result order. Pass/fail status and
    /// counts are unaffected.
    pub fn truncate_findings(&mut self, max: usize) {
        let mut budget = max;
        for result in &mut self.results {
            let keep = result.findings.len().min(budget);
            result.findings.truncate(keep);
            budget -= keep;
        }
        let emitted: u32 = self.results.iter().map(|r| r.findings.len() as u32).sum();
        if emitted < self.summary.findings_total {
            self.summary.truncated_reason = Some(format!("findings truncated to max_findings={max}"));
        }
        self.summary.findings_emitted = emitted;
    }

    /// 0 on pass, 1 on failed rules, 2 on a fatal error.
    pub fn exit_code(&self) -> i32 {
        match (&self.error, self.verdict) {
            (Some(_), _) => 2,
            (None, Verdict::Fail) => 1,
            (None, Verdict::Pass) => 0,
        }
    }
}
