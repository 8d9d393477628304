//! Structure seeder for Reportree development and testing.
//!
//! Builds the default DRE structure through an editor session and saves it
//! through the configured store, then prints the resulting code listing.
//! An already seeded structure is left as is.
//!
//! Usage: cargo run --bin seeder

use reportree_core::store::OpendalStructureStore;
use reportree_core::structure::{
    Account, AccountCatalog, AccountCategory, EditorSession, LineType, OperationalCatalog,
    OperationalFormula, OperationalIndicator, OperationalSource, ReportTemplate, ReportType,
    ResolvedReference, Sign,
};
use reportree_shared::types::{
    AccountId, IndicatorId, OperationalFormulaId, ReportLineId, ReportTemplateId,
};
use reportree_shared::{AppConfig, AppError, AppResult};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seeded DRE template ID (consistent across runs)
const DRE_TEMPLATE_ID: &str = "00000000-0000-0000-0000-000000000101";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(AppError::from)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = OpendalStructureStore::from_config(config.store.clone())?;
    info!(provider = store.provider_name(), "structure store ready");

    let template = ReportTemplate {
        id: DRE_TEMPLATE_ID.parse::<ReportTemplateId>()?,
        name: "DRE Gerencial".to_string(),
        report_type: ReportType::Dre,
    };
    let accounts = seed_accounts()?;
    let operational = seed_operational()?;

    let mut session = EditorSession::load(
        template,
        &store,
        AccountCatalog::new(accounts.clone()),
        operational.clone(),
        &config.editor,
    )
    .await?;

    if session.tree().is_empty() {
        if let Err(err) = build_dre(&mut session, &accounts, &operational) {
            error!(code = err.error_code(), error = %err, "seeding failed");
            return Err(err.into());
        }
        session.save(&store).await?;
        info!(lines = session.tree().len(), "DRE structure seeded");
    } else {
        info!(
            lines = session.tree().len(),
            "DRE structure already exists, skipping"
        );
    }

    print_listing(&session);
    Ok(())
}

/// Seeded chart of accounts: id, code, name, category.
const SEED_ACCOUNTS: [(&str, &str, &str, AccountCategory); 8] = [
    ("00000000-0000-0000-0000-000000000201", "3.1.01", "Vendas de Mercadorias", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000202", "3.1.02", "Prestação de Serviços", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000203", "3.2.01", "Impostos sobre Vendas", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000204", "3.2.02", "Devoluções", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000205", "3.3.01", "Custo das Mercadorias Vendidas", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000206", "3.4.01", "Despesas com Pessoal", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000207", "3.4.02", "Aluguéis", AccountCategory::Result),
    ("00000000-0000-0000-0000-000000000208", "1.1.01", "Caixa", AccountCategory::Asset),
];

/// Seeded operational indicator IDs
const LOJAS_ATIVAS_ID: &str = "00000000-0000-0000-0000-000000000301";
const CLIENTES_ATENDIDOS_ID: &str = "00000000-0000-0000-0000-000000000302";

/// Seeded operational formula ID
const TICKET_MEDIO_ID: &str = "00000000-0000-0000-0000-000000000311";

fn seed_accounts() -> anyhow::Result<Vec<Account>> {
    SEED_ACCOUNTS
        .iter()
        .map(|(id, code, name, category)| {
            Ok::<_, anyhow::Error>(Account {
                id: id.parse::<AccountId>()?,
                code: (*code).to_string(),
                name: (*name).to_string(),
                category: *category,
            })
        })
        .collect()
}

fn seed_operational() -> anyhow::Result<OperationalCatalog> {
    Ok(OperationalCatalog::new(
        vec![
            OperationalIndicator {
                id: LOJAS_ATIVAS_ID.parse::<IndicatorId>()?,
                code: "OP-01".to_string(),
                name: "Lojas Ativas".to_string(),
                unit: "un".to_string(),
                active: true,
            },
            OperationalIndicator {
                id: CLIENTES_ATENDIDOS_ID.parse::<IndicatorId>()?,
                code: "OP-02".to_string(),
                name: "Clientes Atendidos".to_string(),
                unit: "un".to_string(),
                active: true,
            },
        ],
        vec![OperationalFormula {
            id: TICKET_MEDIO_ID.parse::<OperationalFormulaId>()?,
            code: "OP-10".to_string(),
            name: "Ticket Médio".to_string(),
            unit: "R$".to_string(),
            active: true,
        }],
    ))
}

/// Adds a child line of the given type.
fn child(
    session: &mut EditorSession,
    parent: ReportLineId,
    name: &str,
    line_type: LineType,
) -> AppResult<ReportLineId> {
    let id = session.add_child_line(parent, name)?;
    session.set_line_type(id, line_type)?;
    Ok(id)
}

/// Adds a data bucket bound to the account with `code`.
fn bucket(
    session: &mut EditorSession,
    parent: ReportLineId,
    accounts: &[Account],
    code: &str,
) -> AppResult<ReportLineId> {
    let account = accounts
        .iter()
        .find(|account| account.code == code)
        .ok_or_else(|| AppError::NotFound(format!("seed account {code}")))?;
    let id = session.add_child_line(parent, account.name.as_str())?;
    session.bind_account(id, account.id)?;
    Ok(id)
}

/// Adds a root line of the given type.
fn root(session: &mut EditorSession, name: &str, line_type: LineType) -> AppResult<ReportLineId> {
    let id = session.add_root_line(name);
    session.set_line_type(id, line_type)?;
    Ok(id)
}

fn build_dre(
    session: &mut EditorSession,
    accounts: &[Account],
    operational: &OperationalCatalog,
) -> AppResult<()> {
    let gross = root(session, "Receita Bruta", LineType::Header)?;
    bucket(session, gross, accounts, "3.1.01")?;
    bucket(session, gross, accounts, "3.1.02")?;

    let deductions = root(session, "Deduções", LineType::Header)?;
    session.set_sign(deductions, Sign::Negative)?;
    bucket(session, deductions, accounts, "3.2.01")?;
    bucket(session, deductions, accounts, "3.2.02")?;

    let net = root(session, "Receita Líquida", LineType::Total)?;
    session.set_bold(net, true)?;
    session.set_vertical_analysis_base(net, true)?;

    let costs = root(session, "Custos", LineType::Header)?;
    session.set_sign(costs, Sign::Negative)?;
    bucket(session, costs, accounts, "3.3.01")?;

    let gross_profit = root(session, "Lucro Bruto", LineType::Formula)?;
    session.set_bold(gross_profit, true)?;
    session.add_reference(gross_profit, net, Sign::Positive)?;
    session.add_reference(gross_profit, costs, Sign::Negative)?;

    let expenses = root(session, "Despesas Operacionais", LineType::Header)?;
    session.set_sign(expenses, Sign::Negative)?;
    bucket(session, expenses, accounts, "3.4.01")?;
    bucket(session, expenses, accounts, "3.4.02")?;

    let result = root(session, "Resultado Operacional", LineType::Formula)?;
    session.set_bold(result, true)?;
    session.add_reference(result, gross_profit, Sign::Positive)?;
    session.add_reference(result, expenses, Sign::Negative)?;

    let kpis = root(session, "Indicadores", LineType::Header)?;
    for option in operational.options() {
        let id = child(session, kpis, &option.name, LineType::Operational)?;
        session.bind_operational(id, option.source)?;
    }

    Ok(())
}

fn print_listing(session: &EditorSession) {
    let codes = session.codes();
    for line in session.tree().lines_in_tree_order() {
        let code = codes.get(&line.id).map_or("?", String::as_str);
        let depth = code.matches('.').count();
        let mut detail = line.line_type().to_string();
        if let Ok(references) = session.resolved_references(line.id)
            && !references.is_empty()
        {
            let terms: Vec<String> = references.iter().map(ResolvedReference::label).collect();
            detail = format!("{detail}: {}", terms.join(" "));
        }
        if let Some(OperationalSource::Formula(_)) = line.operational_source() {
            detail.push_str(" (operational formula)");
        }
        println!(
            "{}{code:<8} {}{} [{detail}]",
            "  ".repeat(depth),
            line.sign.symbol(),
            line.name
        );
    }
}

#[cfg(test)]
mod tests {
    use reportree_core::structure::ReportLine;
    use reportree_shared::EditorConfig;

    use super::*;

    fn open(lines: Vec<ReportLine>) -> EditorSession {
        let template = ReportTemplate {
            id: DRE_TEMPLATE_ID.parse().unwrap(),
            name: "DRE Gerencial".to_string(),
            report_type: ReportType::Dre,
        };
        EditorSession::open(
            template,
            lines,
            AccountCatalog::new(seed_accounts().unwrap()),
            seed_operational().unwrap(),
            &EditorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_seed_ids_are_stable() {
        let first: Vec<AccountId> = seed_accounts().unwrap().iter().map(|a| a.id).collect();
        let second: Vec<AccountId> = seed_accounts().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(first, second);

        let sources = |catalog: OperationalCatalog| -> Vec<OperationalSource> {
            catalog.options().into_iter().map(|option| option.source).collect()
        };
        assert_eq!(
            sources(seed_operational().unwrap()),
            sources(seed_operational().unwrap())
        );
    }

    #[test]
    fn test_seeded_structure_survives_reopen() {
        let mut session = open(Vec::new());
        let accounts = seed_accounts().unwrap();
        let operational = seed_operational().unwrap();
        build_dre(&mut session, &accounts, &operational).unwrap();
        let lines = session.tree().lines().to_vec();

        // A later run rebuilds both catalogs before reopening.
        let reopened = open(lines);
        let bound: Vec<AccountId> = reopened
            .tree()
            .lines()
            .iter()
            .filter_map(ReportLine::account_id)
            .collect();
        assert_eq!(bound.len(), 7);

        let kpis = reopened
            .tree()
            .lines()
            .iter()
            .find(|line| line.name == "Indicadores")
            .unwrap()
            .id;
        assert!(reopened.account_options(kpis).unwrap().is_empty());

        let options = reopened.operational_options();
        for line in reopened.tree().lines() {
            if let Some(source) = line.operational_source() {
                assert!(options.iter().any(|option| option.source == source));
            }
        }
    }
}
