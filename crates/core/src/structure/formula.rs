//! Formula references and operational bindings.

use reportree_shared::types::ReportLineId;

use super::catalog::OperationalCatalog;
use super::codes::LineCodes;
use super::error::StructureError;
use super::tree::ReportTree;
use super::types::{FormulaReference, LineContent, LineType, OperationalSource, ReportLine, Sign};

/// What a formula reference points at, resolved against the current tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// The referenced line exists.
    Line {
        /// Referenced line.
        id: ReportLineId,
        /// Current display code.
        code: String,
        /// Current name.
        name: String,
    },
    /// The referenced line is no longer in the tree.
    Removed {
        /// Id the reference still carries.
        id: ReportLineId,
    },
}

/// One formula term ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Position inside the formula.
    pub index: usize,
    /// Contribution sign.
    pub sign: Sign,
    /// Resolved target.
    pub target: ReferenceTarget,
}

impl ResolvedReference {
    /// Returns the label shown in the formula editor.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.target {
            ReferenceTarget::Line { code, name, .. } => {
                format!("{} {code} {name}", self.sign.symbol())
            }
            ReferenceTarget::Removed { .. } => format!("{} [removed line]", self.sign.symbol()),
        }
    }
}

impl ReportTree {
    /// Appends a signed reference to a formula line.
    ///
    /// # Errors
    ///
    /// Returns `WrongLineType` if the line is not a formula, `LineNotFound` if
    /// the target is missing, or `InvalidReferenceTarget` if the target is the
    /// line itself or not a header, total or data bucket.
    pub fn add_reference(
        &mut self,
        id: ReportLineId,
        target: ReportLineId,
        sign: Sign,
    ) -> Result<(), StructureError> {
        self.ensure_formula(id)?;
        let target_line = self.line(target)?;
        if target == id || !target_line.line_type().is_formula_target() {
            return Err(StructureError::InvalidReferenceTarget {
                line_id: id,
                target,
            });
        }

        self.references_mut(id)?
            .push(FormulaReference::new(target, sign));
        Ok(())
    }

    /// Removes the reference at `index`, returning it.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceOutOfRange` for an invalid index.
    pub fn remove_reference(
        &mut self,
        id: ReportLineId,
        index: usize,
    ) -> Result<FormulaReference, StructureError> {
        let references = self.references_mut(id)?;
        if index >= references.len() {
            return Err(StructureError::ReferenceOutOfRange {
                line_id: id,
                index,
                len: references.len(),
            });
        }
        Ok(references.remove(index))
    }

    /// Sets the sign of the reference at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceOutOfRange` for an invalid index.
    pub fn change_reference_sign(
        &mut self,
        id: ReportLineId,
        index: usize,
        sign: Sign,
    ) -> Result<(), StructureError> {
        let references = self.references_mut(id)?;
        let len = references.len();
        let reference = references
            .get_mut(index)
            .ok_or(StructureError::ReferenceOutOfRange {
                line_id: id,
                index,
                len,
            })?;
        reference.sign = sign;
        Ok(())
    }

    /// Returns the lines a formula line may reference, in tree order.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn reference_candidates(&self, id: ReportLineId) -> Result<Vec<&ReportLine>, StructureError> {
        self.line(id)?;
        let mut candidates = Vec::new();
        let mut stack: Vec<ReportLineId> = self.child_ids(None).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if let Some(line) = self.get(current)
                && current != id
                && line.line_type().is_formula_target()
            {
                candidates.push(line);
            }
            stack.extend(self.child_ids(Some(current)).iter().rev().copied());
        }
        Ok(candidates)
    }

    /// Resolves the references of a formula line against the current tree.
    ///
    /// References to lines that no longer exist resolve to
    /// `ReferenceTarget::Removed`.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the id is not in the tree.
    pub fn resolve_references(
        &self,
        id: ReportLineId,
        codes: &LineCodes,
    ) -> Result<Vec<ResolvedReference>, StructureError> {
        let line = self.line(id)?;
        Ok(line
            .formula_references()
            .iter()
            .enumerate()
            .map(|(index, reference)| ResolvedReference {
                index,
                sign: reference.sign,
                target: self.get(reference.target).map_or(
                    ReferenceTarget::Removed {
                        id: reference.target,
                    },
                    |target| ReferenceTarget::Line {
                        id: target.id,
                        code: codes.get(&target.id).cloned().unwrap_or_default(),
                        name: target.name.clone(),
                    },
                ),
            })
            .collect())
    }

    /// Binds an operational line to a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `OperationalEntryNotFound` if the catalog has no such entry,
    /// `OperationalEntryInactive` if the entry is deactivated, or
    /// `WrongLineType` if the line is not operational.
    pub fn bind_operational(
        &mut self,
        id: ReportLineId,
        source: OperationalSource,
        catalog: &OperationalCatalog,
    ) -> Result<(), StructureError> {
        match catalog.is_active(source) {
            None => return Err(StructureError::OperationalEntryNotFound(source.to_string())),
            Some(false) => return Err(StructureError::OperationalEntryInactive(source.to_string())),
            Some(true) => {}
        }
        let line = self.line_mut(id)?;
        match &mut line.content {
            LineContent::Operational { source: bound } => {
                *bound = Some(source);
                Ok(())
            }
            other => Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::Operational,
                actual: other.line_type(),
            }),
        }
    }

    fn ensure_formula(&self, id: ReportLineId) -> Result<(), StructureError> {
        let actual = self.line(id)?.line_type();
        if actual == LineType::Formula {
            Ok(())
        } else {
            Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::Formula,
                actual,
            })
        }
    }

    fn references_mut(
        &mut self,
        id: ReportLineId,
    ) -> Result<&mut Vec<FormulaReference>, StructureError> {
        let line = self.line_mut(id)?;
        match &mut line.content {
            LineContent::Formula { references } => Ok(references),
            other => Err(StructureError::WrongLineType {
                line_id: id,
                expected: LineType::Formula,
                actual: other.line_type(),
            }),
        }
    }
}
