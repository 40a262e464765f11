#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableSeverity {
    Blocking,
    Advisory,
}

impl RenderableSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderableSeverity::Blocking => "blocking",
            RenderableSeverity::Advisory => "advisory",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Fail,
    /// The run stopped on a fatal error.
    Error,
}

impl RenderableVerdictStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderableVerdictStatus::Pass => "PASS",
            RenderableVerdictStatus::Fail => "FAIL",
            RenderableVerdictStatus::Error => "ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableLocation {
    pub path: String,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

impl std::fmt::Display for RenderableLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(col) = self.col {
                write!(f, ":{col}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableRule {
    pub rule_id: String,
    pub severity: RenderableSeverity,
    pub passed: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFinding {
    pub severity: RenderableSeverity,
    pub rule_id: String,
    pub code: String,
    pub message: String,
    pub resource: Option<String>,
    pub location: Option<RenderableLocation>,
    pub help: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderablePlanAction {
    pub address: String,
    /// `create`, `update`, `destroy` or `no-op`.
    pub action: String,
    pub changed_attributes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    pub resources: u32,
    pub findings_emitted: u32,
    pub findings_total: u32,
    pub truncated_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub rules: Vec<RenderableRule>,
    pub findings: Vec<RenderableFinding>,
    pub plan: Option<Vec<RenderablePlanAction>>,
    pub error: Option<String>,
    pub data: RenderableData,
}
