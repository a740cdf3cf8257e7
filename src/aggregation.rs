use chrono::{Local, NaiveDate};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::schemas::{default_investment_categories, InvestmentCategory, RecordKind, User};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_bills_needed: f64,
    pub total_bills_deposited: f64,
    pub total_investment_needed: f64,
    pub total_investment_deposited: f64,
    pub total_spending: f64,
}

impl Totals {
    pub fn deposited(&self, kind: RecordKind) -> f64 {
        match kind {
            RecordKind::Bills => self.total_bills_deposited,
            RecordKind::Investments => self.total_investment_deposited,
            RecordKind::Spending => self.total_spending,
        }
    }
}

/// Deposited totals per record kind, in the fixed order Bills, Investments,
/// Spending. Kinds with nothing deposited are left out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryBreakdown(Vec<(RecordKind, f64)>);

impl CategoryBreakdown {
    pub fn from_totals(totals: &Totals) -> Self {
        CategoryBreakdown(
            RecordKind::ALL
                .into_iter()
                .map(|kind| (kind, totals.deposited(kind)))
                .filter(|(_, amount)| *amount > 0.0)
                .collect(),
        )
    }
}

impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, amount) in &self.0 {
            map.serialize_entry(kind.label(), amount)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFinancialData {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub by_category: CategoryBreakdown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: String,
    pub monthly_data: MonthlyFinancialData,
    pub leftover: f64,
}

/// How far a single investment is towards its target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvestmentProgress {
    pub id: String,
    pub name: String,
    pub percentage: f64,
    pub description: String,
}

// Summed in sorted order so the result does not depend on record order.
fn sum(amounts: impl Iterator<Item = f64>) -> f64 {
    let mut amounts: Vec<f64> = amounts.collect();
    amounts.sort_by(f64::total_cmp);
    amounts.into_iter().sum()
}

pub fn compute_totals(user: &User) -> Totals {
    Totals {
        total_bills_needed: sum(user.bills.iter().map(|bill| bill.amount_needed)),
        total_bills_deposited: sum(user.bills.iter().map(|bill| bill.amount_deposited)),
        total_investment_needed: sum(user.investments.iter().map(|inv| inv.amount_needed)),
        total_investment_deposited: sum(user.investments.iter().map(|inv| inv.amount_deposited)),
        total_spending: sum(user.spendings.iter().map(|spend| spend.amount_deposited)),
    }
}

/// "March 2025" style label for the month containing `date`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

pub fn current_month_label() -> String {
    month_label(Local::now().date_naive())
}

fn resolve_month(month: Option<&str>) -> String {
    match month.map(str::trim) {
        Some(month) if !month.is_empty() => month.to_string(),
        _ => current_month_label(),
    }
}

/// Income against money already spent this month. Investments are not
/// counted as expenses; they only show up in the category breakdown.
pub fn compute_monthly_financial_data(user: &User, month: Option<&str>) -> MonthlyFinancialData {
    let totals = compute_totals(user);
    MonthlyFinancialData {
        month: resolve_month(month),
        income: user.profile.monthly_salary,
        expenses: totals.total_bills_deposited + totals.total_spending,
        by_category: CategoryBreakdown::from_totals(&totals),
    }
}

/// Salary minus what has been deposited for bills. Not floored at zero.
pub fn compute_leftover_after_bills(user: &User) -> f64 {
    user.profile.monthly_salary - compute_totals(user).total_bills_deposited
}

pub fn compute_dashboard(user: &User, month: Option<&str>) -> Dashboard {
    let monthly_data = compute_monthly_financial_data(user, month);
    let leftover = compute_leftover_after_bills(user);
    Dashboard {
        month: monthly_data.month.clone(),
        monthly_data,
        leftover,
    }
}

fn funded_percentage(deposited: f64, needed: f64) -> f64 {
    if needed <= 0.0 {
        return 0.0;
    }
    let percentage = deposited / needed * 100.0;
    if percentage.is_finite() {
        percentage
    } else {
        0.0
    }
}

pub fn compute_investment_categories(user: &User) -> Vec<InvestmentProgress> {
    user.investments
        .iter()
        .map(|inv| InvestmentProgress {
            id: inv.id.clone(),
            name: inv.title.clone(),
            percentage: funded_percentage(inv.amount_deposited, inv.amount_needed),
            description: format!("Investment in {}", inv.title),
        })
        .collect()
}

/// The user's target allocation, or the seed allocation when none is stored.
pub fn effective_investment_categories(user: &User) -> Vec<InvestmentCategory> {
    if user.investment_categories.is_empty() {
        default_investment_categories()
    } else {
        user.investment_categories.clone()
    }
}
