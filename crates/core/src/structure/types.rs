//! Report structure data types.

use std::fmt;
use std::str::FromStr;

use reportree_shared::types::{
    AccountId, IndicatorId, OperationalFormulaId, ReportLineId, ReportTemplateId,
};
use serde::{Deserialize, Serialize};

/// Contribution sign of a line or of a formula reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Sign {
    /// Adds to the aggregate (`+1`).
    #[default]
    Positive,
    /// Subtracts from the aggregate (`-1`).
    Negative,
}

impl Sign {
    /// Returns the integer form used in persisted records.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }

    /// Returns the opposite sign.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }

    /// Returns the symbol shown next to a line or reference.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Positive => '+',
            Self::Negative => '-',
        }
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> Self {
        sign.as_i8()
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Positive),
            -1 => Ok(Self::Negative),
            other => Err(format!("invalid sign {other}, expected 1 or -1")),
        }
    }
}

/// Kind of report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    /// Structural grouping line.
    Header,
    /// Aggregation line.
    Total,
    /// Leaf bound to one external account.
    DataBucket,
    /// Signed sum of other lines of the same structure.
    Formula,
    /// Leaf bound to an operational indicator or formula.
    Operational,
}

impl LineType {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Total => "total",
            Self::DataBucket => "data_bucket",
            Self::Formula => "formula",
            Self::Operational => "operational",
        }
    }

    /// Returns true if lines of this type may be referenced by a formula.
    #[must_use]
    pub const fn is_formula_target(self) -> bool {
        matches!(self, Self::Header | Self::Total | Self::DataBucket)
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "total" => Ok(Self::Total),
            "data_bucket" => Ok(Self::DataBucket),
            "formula" => Ok(Self::Formula),
            "operational" => Ok(Self::Operational),
            other => Err(format!("unknown line type: {other}")),
        }
    }
}

/// One signed term of a formula line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaReference {
    /// Referenced line of the same structure.
    #[serde(rename = "lineId")]
    pub target: ReportLineId,
    /// Contribution sign of the referenced line inside the formula.
    pub sign: Sign,
}

impl FormulaReference {
    /// Creates a reference to `target` with the given sign.
    #[must_use]
    pub const fn new(target: ReportLineId, sign: Sign) -> Self {
        Self { target, sign }
    }
}

/// Catalog entry an operational line is bound to.
///
/// Indicators and operational formulas live in separate catalogs whose ids
/// may collide, so the source is carried alongside the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationalSource {
    /// Entry of the operational indicator catalog.
    Indicator(IndicatorId),
    /// Entry of the operational formula catalog.
    Formula(OperationalFormulaId),
}

impl OperationalSource {
    const INDICATOR_PREFIX: &'static str = "indicator:";
    const FORMULA_PREFIX: &'static str = "formula:";
}

impl fmt::Display for OperationalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicator(id) => write!(f, "{}{id}", Self::INDICATOR_PREFIX),
            Self::Formula(id) => write!(f, "{}{id}", Self::FORMULA_PREFIX),
        }
    }
}

impl FromStr for OperationalSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix(Self::INDICATOR_PREFIX) {
            raw.parse()
                .map(Self::Indicator)
                .map_err(|e| format!("invalid indicator id {raw}: {e}"))
        } else if let Some(raw) = s.strip_prefix(Self::FORMULA_PREFIX) {
            raw.parse()
                .map(Self::Formula)
                .map_err(|e| format!("invalid operational formula id {raw}: {e}"))
        } else {
            Err(format!("operational source without catalog prefix: {s}"))
        }
    }
}

/// Type-specific payload of a report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineContent {
    /// Structural grouping line.
    Header,
    /// Aggregation line.
    Total,
    /// Leaf bound to one external account.
    DataBucket {
        /// Bound account, if any.
        account_id: Option<AccountId>,
    },
    /// Signed sum of other lines.
    Formula {
        /// Ordered signed references.
        references: Vec<FormulaReference>,
    },
    /// Leaf bound to an operational catalog entry.
    Operational {
        /// Bound catalog entry, if any.
        source: Option<OperationalSource>,
    },
}

impl LineContent {
    /// Returns an empty payload for the given line type.
    #[must_use]
    pub const fn empty(line_type: LineType) -> Self {
        match line_type {
            LineType::Header => Self::Header,
            LineType::Total => Self::Total,
            LineType::DataBucket => Self::DataBucket { account_id: None },
            LineType::Formula => Self::Formula {
                references: Vec::new(),
            },
            LineType::Operational => Self::Operational { source: None },
        }
    }

    /// Returns the line type this payload belongs to.
    #[must_use]
    pub const fn line_type(&self) -> LineType {
        match self {
            Self::Header => LineType::Header,
            Self::Total => LineType::Total,
            Self::DataBucket { .. } => LineType::DataBucket,
            Self::Formula { .. } => LineType::Formula,
            Self::Operational { .. } => LineType::Operational,
        }
    }
}

/// Presentation attributes of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    /// Render the line in bold.
    #[serde(default)]
    pub bold: bool,
    /// Line used as the 100% denominator of vertical analysis.
    #[serde(default)]
    pub is_vertical_analysis_base: bool,
}

/// One row of a hierarchical report definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Line ID.
    pub id: ReportLineId,
    /// Owning report template.
    pub report_id: ReportTemplateId,
    /// Containing line, `None` at root level.
    pub parent_id: Option<ReportLineId>,
    /// Display label.
    pub name: String,
    /// Zero-based position among siblings.
    pub order: usize,
    /// Contribution sign relative to the parent aggregation.
    pub sign: Sign,
    /// Type-specific payload.
    pub content: LineContent,
    /// Presentation attributes.
    pub style: LineStyle,
}

impl ReportLine {
    /// Creates a new unbound data bucket line.
    #[must_use]
    pub fn new(
        report_id: ReportTemplateId,
        parent_id: Option<ReportLineId>,
        name: impl Into<String>,
        order: usize,
    ) -> Self {
        Self {
            id: ReportLineId::new(),
            report_id,
            parent_id,
            name: name.into(),
            order,
            sign: Sign::Positive,
            content: LineContent::empty(LineType::DataBucket),
            style: LineStyle::default(),
        }
    }

    /// Replaces the payload with an empty one of the given type.
    #[must_use]
    pub fn with_type(mut self, line_type: LineType) -> Self {
        self.content = LineContent::empty(line_type);
        self
    }

    /// Sets the contribution sign.
    #[must_use]
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    /// Returns the line type.
    #[must_use]
    pub const fn line_type(&self) -> LineType {
        self.content.line_type()
    }

    /// Returns the bound account of a data bucket line.
    #[must_use]
    pub const fn account_id(&self) -> Option<AccountId> {
        match &self.content {
            LineContent::DataBucket { account_id } => *account_id,
            _ => None,
        }
    }

    /// Returns the references of a formula line (empty for other types).
    #[must_use]
    pub fn formula_references(&self) -> &[FormulaReference] {
        match &self.content {
            LineContent::Formula { references } => references,
            _ => &[],
        }
    }

    /// Returns the bound catalog entry of an operational line.
    #[must_use]
    pub const fn operational_source(&self) -> Option<OperationalSource> {
        match &self.content {
            LineContent::Operational { source } => *source,
            _ => None,
        }
    }
}

/// Kind of report a template describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Income statement (DRE).
    Dre,
    /// Balance sheet.
    BalanceSheet,
    /// Cash flow statement.
    CashFlow,
}

/// Report template whose structure is being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    /// Template ID.
    pub id: ReportTemplateId,
    /// Template name.
    pub name: String,
    /// Report type, selects the candidate accounts.
    pub report_type: ReportType,
}

impl ReportTemplate {
    /// Creates a template with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, report_type: ReportType) -> Self {
        Self {
            id: ReportTemplateId::new(),
            name: name.into(),
            report_type,
        }
    }
}
