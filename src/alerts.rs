use serde::Serialize;

use crate::aggregation::{compute_totals, Totals};
use crate::schemas::User;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Shortage,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

impl Alert {
    fn new(title: &str, message: String, kind: AlertKind) -> Self {
        Alert {
            title: title.to_string(),
            message,
            kind,
        }
    }
}

fn money(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

/// Checks the rules in a fixed order: bills shortage, investment shortage,
/// high spending. Each rule fires on its own.
pub fn evaluate_alerts(totals: &Totals, currency: &str) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if totals.total_bills_deposited < totals.total_bills_needed {
        let shortfall = totals.total_bills_needed - totals.total_bills_deposited;
        alerts.push(Alert::new(
            "Bills Shortage",
            format!(
                "You're short by {} for bills this month",
                money(currency, shortfall)
            ),
            AlertKind::Shortage,
        ));
    }

    if totals.total_investment_deposited < totals.total_investment_needed {
        let shortfall = totals.total_investment_needed - totals.total_investment_deposited;
        alerts.push(Alert::new(
            "Investment Shortage",
            format!("You're short by {} for investments", money(currency, shortfall)),
            AlertKind::Warning,
        ));
    }

    if totals.total_spending > totals.total_bills_needed {
        alerts.push(Alert::new(
            "High Spending Alert",
            format!(
                "Your spending ({}) exceeds bills needed",
                money(currency, totals.total_spending)
            ),
            AlertKind::Warning,
        ));
    }

    alerts
}

pub fn compute_spending_alerts(user: &User) -> Vec<Alert> {
    evaluate_alerts(&compute_totals(user), &user.profile.currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::tests::{bill, investment, sample_user, spending, user};

    #[test]
    fn no_alerts_without_records() {
        assert!(compute_spending_alerts(&user(1000.0)).is_empty());
    }

    #[test]
    fn shortage_and_high_spending_fire_together() {
        let alerts = compute_spending_alerts(&sample_user());
        let titles: Vec<_> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Bills Shortage", "High Spending Alert"]);
        assert_eq!(alerts[0].kind, AlertKind::Shortage);
        assert_eq!(alerts[0].message, "You're short by USD 200.00 for bills this month");
        assert_eq!(alerts[1].kind, AlertKind::Warning);
        assert_eq!(alerts[1].message, "Your spending (USD 600.00) exceeds bills needed");
    }

    #[test]
    fn all_three_alerts_keep_their_order() {
        let mut user = user(0.0);
        user.profile.currency = "EUR".to_string();
        user.spendings.push(spending("s1", 75.5));
        user.investments.push(investment("i1", 100.0, 33.333));
        user.bills.push(bill("b1", 50.0, 10.0));

        let alerts = compute_spending_alerts(&user);
        let titles: Vec<_> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Bills Shortage", "Investment Shortage", "High Spending Alert"]
        );
        assert_eq!(alerts[1].message, "You're short by EUR 66.67 for investments");
        assert_eq!(alerts[1].kind, AlertKind::Warning);
    }

    #[test]
    fn fully_funded_user_gets_no_alerts() {
        let mut user = user(0.0);
        user.bills.push(bill("b1", 100.0, 100.0));
        user.investments.push(investment("i1", 100.0, 150.0));
        user.spendings.push(spending("s1", 100.0));
        assert!(compute_spending_alerts(&user).is_empty());
    }

    #[test]
    fn alert_serializes_kind_as_type() {
        let alert = Alert::new("Bills Shortage", "x".to_string(), AlertKind::Shortage);
        let json = serde_json::to_value(alert).unwrap();
        assert_eq!(json["type"], "shortage");
        assert!(json.get("kind").is_none());
    }
}
