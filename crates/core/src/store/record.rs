//! Persisted form of a report line.
//!
//! The store keeps the flat, stringly shape other consumers of the report
//! tables read: a `type` tag, an integer sign, the formula as a JSON string
//! and the operational binding as a namespaced id. Conversion to and from
//! the typed [`ReportLine`] happens only here.

use reportree_shared::types::{AccountId, ReportLineId, ReportTemplateId};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use crate::structure::{
    FormulaReference, LineContent, LineStyle, LineType, OperationalSource, ReportLine, Sign,
};

/// One persisted line of a report structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLineRecord {
    /// Line ID.
    pub id: ReportLineId,
    /// Owning report template.
    pub report_id: ReportTemplateId,
    /// Containing line, absent at root level.
    #[serde(default)]
    pub parent_id: Option<ReportLineId>,
    /// Display label.
    pub name: String,
    /// Zero-based position among siblings.
    pub order: usize,
    /// Line type tag.
    #[serde(rename = "type")]
    pub line_type: String,
    /// `1` or `-1`.
    pub sign: i8,
    /// Bound account of a data bucket line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dre_account_id: Option<AccountId>,
    /// JSON-encoded reference list of a formula line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Namespaced catalog id of an operational line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_formula_id: Option<String>,
    /// Presentation attributes.
    #[serde(default)]
    pub style: LineStyle,
}

impl ReportLineRecord {
    /// Converts a typed line into its persisted form.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the formula cannot be encoded.
    pub fn from_line(line: &ReportLine) -> Result<Self, StoreError> {
        let mut record = Self {
            id: line.id,
            report_id: line.report_id,
            parent_id: line.parent_id,
            name: line.name.clone(),
            order: line.order,
            line_type: line.line_type().as_str().to_string(),
            sign: line.sign.as_i8(),
            dre_account_id: None,
            formula: None,
            operational_formula_id: None,
            style: line.style,
        };

        match &line.content {
            LineContent::Header | LineContent::Total => {}
            LineContent::DataBucket { account_id } => record.dre_account_id = *account_id,
            LineContent::Formula { references } => {
                record.formula = Some(serde_json::to_string(references)?);
            }
            LineContent::Operational { source } => {
                record.operational_formula_id = source.map(|source| source.to_string());
            }
        }
        Ok(record)
    }

    /// Converts the persisted form back into a typed line.
    ///
    /// Fields that do not belong to the record's type are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` for an unknown type, a sign other than `1` or
    /// `-1`, a malformed formula or an unprefixed operational id.
    pub fn into_line(self) -> Result<ReportLine, StoreError> {
        let line_type: LineType = self
            .line_type
            .parse()
            .map_err(|reason: String| StoreError::invalid_record(self.id, reason))?;
        let sign = Sign::try_from(self.sign)
            .map_err(|reason| StoreError::invalid_record(self.id, reason))?;

        let content = match line_type {
            LineType::Header => LineContent::Header,
            LineType::Total => LineContent::Total,
            LineType::DataBucket => LineContent::DataBucket {
                account_id: self.dre_account_id,
            },
            LineType::Formula => LineContent::Formula {
                references: parse_formula(self.id, self.formula.as_deref())?,
            },
            LineType::Operational => LineContent::Operational {
                source: self
                    .operational_formula_id
                    .as_deref()
                    .filter(|raw| !raw.is_empty())
                    .map(str::parse::<OperationalSource>)
                    .transpose()
                    .map_err(|reason: String| StoreError::invalid_record(self.id, reason))?,
            },
        };

        Ok(ReportLine {
            id: self.id,
            report_id: self.report_id,
            parent_id: self.parent_id,
            name: self.name,
            order: self.order,
            sign,
            content,
            style: self.style,
        })
    }
}

fn parse_formula(
    line_id: ReportLineId,
    raw: Option<&str>,
) -> Result<Vec<FormulaReference>, StoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| StoreError::invalid_record(line_id, format!("malformed formula: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportree_shared::types::IndicatorId;

    fn line(line_type: LineType) -> ReportLine {
        ReportLine::new(ReportTemplateId::new(), None, "Receita", 0).with_type(line_type)
    }

    #[test]
    fn test_formula_is_stored_as_json_string() {
        let target = ReportLineId::new();
        let mut formula = line(LineType::Formula).with_sign(Sign::Negative);
        formula.content = LineContent::Formula {
            references: vec![FormulaReference::new(target, Sign::Negative)],
        };

        let record = ReportLineRecord::from_line(&formula).unwrap();

        assert_eq!(record.line_type, "formula");
        assert_eq!(record.sign, -1);
        assert_eq!(
            record.formula.as_deref(),
            Some(format!(r#"[{{"lineId":"{target}","sign":-1}}]"#).as_str())
        );
        assert_eq!(record.into_line().unwrap(), formula);
    }

    #[test]
    fn test_record_json_shape() {
        let account = AccountId::new();
        let mut bucket = line(LineType::DataBucket);
        bucket.content = LineContent::DataBucket {
            account_id: Some(account),
        };
        bucket.style.bold = true;

        let json = serde_json::to_value(ReportLineRecord::from_line(&bucket).unwrap()).unwrap();

        assert_eq!(json["type"], "data_bucket");
        assert_eq!(json["sign"], 1);
        assert_eq!(json["dreAccountId"], account.to_string());
        assert_eq!(json["style"]["bold"], true);
        assert_eq!(json["style"]["isVerticalAnalysisBase"], false);
        assert!(json.get("formula").is_none());
    }

    #[test]
    fn test_operational_source_keeps_catalog() {
        let source = OperationalSource::Indicator(IndicatorId::new());
        let mut operational = line(LineType::Operational);
        operational.content = LineContent::Operational {
            source: Some(source),
        };

        let record = ReportLineRecord::from_line(&operational).unwrap();
        assert!(
            record
                .operational_formula_id
                .as_deref()
                .is_some_and(|raw| raw.starts_with("indicator:"))
        );
        assert_eq!(record.into_line().unwrap().operational_source(), Some(source));
    }

    #[test]
    fn test_missing_or_empty_formula_means_no_references() {
        let mut record = ReportLineRecord::from_line(&line(LineType::Formula)).unwrap();
        record.formula = None;
        assert!(record.clone().into_line().unwrap().formula_references().is_empty());
        record.formula = Some(String::new());
        assert!(record.into_line().unwrap().formula_references().is_empty());
    }

    #[test]
    fn test_invalid_records_rejected() {
        let base = ReportLineRecord::from_line(&line(LineType::Header)).unwrap();

        let mut bad_type = base.clone();
        bad_type.line_type = "chart".into();
        assert!(matches!(bad_type.into_line(), Err(StoreError::InvalidRecord { .. })));

        let mut bad_sign = base.clone();
        bad_sign.sign = 0;
        assert!(matches!(bad_sign.into_line(), Err(StoreError::InvalidRecord { .. })));

        let mut bad_formula = base.clone();
        bad_formula.line_type = "formula".into();
        bad_formula.formula = Some("{not json".into());
        assert!(matches!(bad_formula.into_line(), Err(StoreError::InvalidRecord { .. })));

        let mut bad_source = base;
        bad_source.line_type = "operational".into();
        bad_source.operational_formula_id = Some(IndicatorId::new().to_string());
        assert!(matches!(bad_source.into_line(), Err(StoreError::InvalidRecord { .. })));
    }
}
