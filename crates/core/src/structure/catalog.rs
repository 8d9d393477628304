//! External catalogs a structure binds to.
//!
//! Accounts back `data_bucket` lines; operational indicators and operational
//! formulas back `operational` lines. Both are owned by other parts of the
//! system and only read here.

use reportree_shared::types::{AccountId, IndicatorId, OperationalFormulaId, ReportLineId};
use serde::{Deserialize, Serialize};

use super::tree::ReportTree;
use super::types::{OperationalSource, ReportType};

/// Classification of a chart of accounts entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Balance sheet asset.
    Asset,
    /// Balance sheet liability or equity.
    Liability,
    /// Income statement (result) account.
    Result,
}

impl AccountCategory {
    /// Classifies an imported account by the leading digit of its code.
    ///
    /// Only meant for sources that do not carry an explicit category.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim_start().chars().next()? {
            '1' => Some(Self::Asset),
            '2' => Some(Self::Liability),
            '3' => Some(Self::Result),
            _ => None,
        }
    }
}

impl ReportType {
    /// Returns true if accounts of this category can back lines of this report.
    #[must_use]
    pub const fn accepts(self, category: AccountCategory) -> bool {
        match self {
            Self::Dre => matches!(category, AccountCategory::Result),
            Self::BalanceSheet => {
                matches!(category, AccountCategory::Asset | AccountCategory::Liability)
            }
            Self::CashFlow => true,
        }
    }
}

/// Chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account classification.
    pub category: AccountCategory,
}

impl Account {
    /// Creates an account with a fresh id.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, category: AccountCategory) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            category,
        }
    }

    /// Creates an account classified from its code, if the code is classifiable.
    #[must_use]
    pub fn classified(id: AccountId, code: impl Into<String>, name: impl Into<String>) -> Option<Self> {
        let code = code.into();
        let category = AccountCategory::from_code(&code)?;
        Some(Self {
            id,
            code,
            name: name.into(),
            category,
        })
    }
}

/// Accounts available as binding targets.
#[derive(Debug, Clone, Default)]
pub struct AccountCatalog {
    accounts: Vec<Account>,
}

impl AccountCatalog {
    /// Creates a catalog; accounts are kept sorted by code.
    #[must_use]
    pub fn new(mut accounts: Vec<Account>) -> Self {
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Self { accounts }
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    /// Returns the accounts a report type can bind to.
    pub fn candidates(&self, report_type: ReportType) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(move |account| report_type.accepts(account.category))
    }

    /// Returns the candidates still free for `line_id`.
    ///
    /// Accounts bound by other lines are left out; the account currently bound
    /// to `line_id` stays in the list.
    #[must_use]
    pub fn available_for<'a>(
        &'a self,
        tree: &ReportTree,
        report_type: ReportType,
        line_id: ReportLineId,
    ) -> Vec<&'a Account> {
        self.candidates(report_type)
            .filter(|account| {
                tree.line_bound_to(account.id)
                    .is_none_or(|holder| holder.id == line_id)
            })
            .collect()
    }

    /// Returns the display names of the given accounts, falling back to the id.
    #[must_use]
    pub fn names_of(&self, ids: &[AccountId]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                self.get(*id)
                    .map_or_else(|| id.to_string(), |account| account.name.clone())
            })
            .collect()
    }
}

/// Operational indicator catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalIndicator {
    /// Indicator ID.
    pub id: IndicatorId,
    /// Indicator code.
    pub code: String,
    /// Indicator name.
    pub name: String,
    /// Measurement unit.
    pub unit: String,
    /// Whether the indicator can be selected.
    pub active: bool,
}

/// Operational formula catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalFormula {
    /// Formula ID.
    pub id: OperationalFormulaId,
    /// Formula code.
    pub code: String,
    /// Formula name.
    pub name: String,
    /// Measurement unit.
    pub unit: String,
    /// Whether the formula can be selected.
    pub active: bool,
}

/// Entry of the merged operational picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalOption {
    /// Namespaced catalog reference.
    pub source: OperationalSource,
    /// Entry code.
    pub code: String,
    /// Entry name.
    pub name: String,
    /// Measurement unit.
    pub unit: String,
}

impl OperationalOption {
    /// Returns the `code - name` label shown in pickers.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Both operational catalogs of a tenant.
#[derive(Debug, Clone, Default)]
pub struct OperationalCatalog {
    indicators: Vec<OperationalIndicator>,
    formulas: Vec<OperationalFormula>,
}

impl OperationalCatalog {
    /// Creates a catalog from the two source lists.
    #[must_use]
    pub fn new(indicators: Vec<OperationalIndicator>, formulas: Vec<OperationalFormula>) -> Self {
        Self {
            indicators,
            formulas,
        }
    }

    /// Returns active entries of both catalogs, sorted by code then name.
    #[must_use]
    pub fn options(&self) -> Vec<OperationalOption> {
        let indicators = self
            .indicators
            .iter()
            .filter(|entry| entry.active)
            .map(Self::indicator_option);
        let formulas = self
            .formulas
            .iter()
            .filter(|entry| entry.active)
            .map(Self::formula_option);

        let mut options: Vec<OperationalOption> = indicators.chain(formulas).collect();
        options.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.name.cmp(&b.name)));
        options
    }

    /// Resolves a namespaced reference, active or not.
    #[must_use]
    pub fn find(&self, source: OperationalSource) -> Option<OperationalOption> {
        match source {
            OperationalSource::Indicator(id) => self
                .indicators
                .iter()
                .find(|entry| entry.id == id)
                .map(Self::indicator_option),
            OperationalSource::Formula(id) => self
                .formulas
                .iter()
                .find(|entry| entry.id == id)
                .map(Self::formula_option),
        }
    }

    /// Returns whether a namespaced reference is active, or `None` if unknown.
    #[must_use]
    pub fn is_active(&self, source: OperationalSource) -> Option<bool> {
        match source {
            OperationalSource::Indicator(id) => self
                .indicators
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| entry.active),
            OperationalSource::Formula(id) => self
                .formulas
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| entry.active),
        }
    }

    fn indicator_option(entry: &OperationalIndicator) -> OperationalOption {
        OperationalOption {
            source: OperationalSource::Indicator(entry.id),
            code: entry.code.clone(),
            name: entry.name.clone(),
            unit: entry.unit.clone(),
        }
    }

    fn formula_option(entry: &OperationalFormula) -> OperationalOption {
        OperationalOption {
            source: OperationalSource::Formula(entry.id),
            code: entry.code.clone(),
            name: entry.name.clone(),
            unit: entry.unit.clone(),
        }
    }
}
