use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ValidationError;

pub type UserId = String;
pub type RecordId = String;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Stored documents may carry nulls or nothing at all where a number is
// expected; those read as 0 so aggregation stays total.
fn amount_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0))
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_bill_category() -> String {
    "bill".to_string()
}

fn default_spending_category() -> String {
    "spending".to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The three record lists a user owns. Also the fixed set of keys used by
/// the category breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Bills,
    Investments,
    Spending,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Bills, RecordKind::Investments, RecordKind::Spending];

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Bills => "Bills",
            RecordKind::Investments => "Investments",
            RecordKind::Spending => "Spending",
        }
    }

    /// Name of the array holding this kind inside a user document.
    pub fn field(self) -> &'static str {
        match self {
            RecordKind::Bills => "bills",
            RecordKind::Investments => "investments",
            RecordKind::Spending => "spendings",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            RecordKind::Bills => "Bill",
            RecordKind::Investments => "Investment",
            RecordKind::Spending => "Spending",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub monthly_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prof_pic: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub profile: Profile,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub investments: Vec<Investment>,
    #[serde(default)]
    pub spendings: Vec<Spending>,
    #[serde(default)]
    pub investment_categories: Vec<InvestmentCategory>,
}

impl User {
    pub fn new(id: UserId, profile: Profile) -> Self {
        User {
            id,
            profile,
            bills: vec![],
            investments: vec![],
            spendings: vec![],
            investment_categories: vec![],
        }
    }

    pub fn push_record(&mut self, record: Record) {
        match record {
            Record::Bill(bill) => self.bills.push(bill),
            Record::Investment(investment) => self.investments.push(investment),
            Record::Spending(spending) => self.spendings.push(spending),
        }
    }

    /// Returns false when no record of that kind has the given id.
    pub fn remove_record(&mut self, kind: RecordKind, record_id: &str) -> bool {
        fn retain<T>(records: &mut Vec<T>, id_of: impl Fn(&T) -> &str, record_id: &str) -> bool {
            let before = records.len();
            records.retain(|record| id_of(record) != record_id);
            records.len() != before
        }
        match kind {
            RecordKind::Bills => retain(&mut self.bills, |bill| bill.id.as_str(), record_id),
            RecordKind::Investments => retain(&mut self.investments, |inv| inv.id.as_str(), record_id),
            RecordKind::Spending => retain(&mut self.spendings, |spend| spend.id.as_str(), record_id),
        }
    }

    /// Applies the patch to the record with the given id in place. Returns
    /// false when no such record exists.
    pub fn apply_patch(&mut self, record_id: &str, patch: &RecordPatch) -> bool {
        match patch {
            RecordPatch::Bill(patch) => self
                .bills
                .iter_mut()
                .find(|bill| bill.id == record_id)
                .map(|bill| patch.apply(bill))
                .is_some(),
            RecordPatch::Investment(patch) => self
                .investments
                .iter_mut()
                .find(|inv| inv.id == record_id)
                .map(|inv| patch.apply(inv))
                .is_some(),
            RecordPatch::Spending(patch) => self
                .spendings
                .iter_mut()
                .find(|spend| spend.id == record_id)
                .map(|spend| patch.apply(spend))
                .is_some(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            first_name: self.profile.first_name.clone(),
            last_name: self.profile.last_name.clone(),
            email: self.profile.email.clone(),
            currency: self.profile.currency.clone(),
            monthly_salary: self.profile.monthly_salary,
            prof_pic: self.profile.prof_pic.clone(),
        }
    }
}

/// The subset of a user returned alongside a freshly issued token.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub currency: String,
    pub monthly_salary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prof_pic: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: RecordId,
    pub title: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub amount_needed: f64,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub amount_deposited: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_bill_category")]
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: RecordId,
    pub title: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub amount_needed: f64,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub amount_deposited: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spending {
    pub id: RecordId,
    pub title: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub amount_deposited: f64,
    #[serde(default = "default_spending_category")]
    pub category: String,
    #[serde(default = "today")]
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentCategory {
    pub id: RecordId,
    pub name: String,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub percentage: f64,
    #[serde(default)]
    pub description: String,
}

impl InvestmentCategory {
    fn seed(id: &str, name: &str, percentage: f64, description: &str) -> Self {
        InvestmentCategory {
            id: id.to_string(),
            name: name.to_string(),
            percentage,
            description: description.to_string(),
        }
    }
}

/// Target allocation used for users that never configured their own.
pub fn default_investment_categories() -> Vec<InvestmentCategory> {
    vec![
        InvestmentCategory::seed("1", "Stocks", 40.0, "Equity investments"),
        InvestmentCategory::seed("2", "Bonds", 30.0, "Fixed income securities"),
        InvestmentCategory::seed("3", "Real Estate", 20.0, "Property investments"),
        InvestmentCategory::seed("4", "Crypto", 10.0, "Digital assets"),
        InvestmentCategory::seed("5", "Other", 0.0, "Custom investment category"),
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Bill(Bill),
    Investment(Investment),
    Spending(Spending),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Bill(_) => RecordKind::Bills,
            Record::Investment(_) => RecordKind::Investments,
            Record::Spending(_) => RecordKind::Spending,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub title: String,
    pub amount_needed: f64,
    #[serde(default)]
    pub amount_deposited: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewBill {
    pub fn into_bill(self, id: RecordId) -> Result<Bill, ValidationError> {
        validate_title(&self.title)?;
        validate_amount("amountNeeded", self.amount_needed)?;
        validate_amount("amountDeposited", self.amount_deposited)?;
        Ok(Bill {
            id,
            title: self.title.trim().to_string(),
            amount_needed: self.amount_needed,
            amount_deposited: self.amount_deposited,
            due_date: self.due_date,
            category: self.category.unwrap_or_else(default_bill_category),
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    pub title: String,
    pub amount_needed: f64,
    #[serde(default)]
    pub amount_deposited: f64,
}

impl NewInvestment {
    pub fn into_investment(self, id: RecordId) -> Result<Investment, ValidationError> {
        validate_title(&self.title)?;
        validate_amount("amountNeeded", self.amount_needed)?;
        validate_amount("amountDeposited", self.amount_deposited)?;
        Ok(Investment {
            id,
            title: self.title.trim().to_string(),
            amount_needed: self.amount_needed,
            amount_deposited: self.amount_deposited,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpending {
    pub title: String,
    pub amount_deposited: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewSpending {
    pub fn into_spending(self, id: RecordId) -> Result<Spending, ValidationError> {
        validate_title(&self.title)?;
        validate_amount("amountDeposited", self.amount_deposited)?;
        Ok(Spending {
            id,
            title: self.title.trim().to_string(),
            amount_deposited: self.amount_deposited,
            category: self.category.unwrap_or_else(default_spending_category),
            date: self.date.unwrap_or_else(today),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_needed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_deposited: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl BillPatch {
    pub fn apply(&self, bill: &mut Bill) {
        if let Some(title) = &self.title {
            bill.title = title.clone();
        }
        if let Some(amount) = self.amount_needed {
            bill.amount_needed = amount;
        }
        if let Some(amount) = self.amount_deposited {
            bill.amount_deposited = amount;
        }
        if let Some(due_date) = self.due_date {
            bill.due_date = Some(due_date);
        }
        if let Some(category) = &self.category {
            bill.category = category.clone();
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_needed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_deposited: Option<f64>,
}

impl InvestmentPatch {
    pub fn apply(&self, investment: &mut Investment) {
        if let Some(title) = &self.title {
            investment.title = title.clone();
        }
        if let Some(amount) = self.amount_needed {
            investment.amount_needed = amount;
        }
        if let Some(amount) = self.amount_deposited {
            investment.amount_deposited = amount;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_deposited: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl SpendingPatch {
    pub fn apply(&self, spending: &mut Spending) {
        if let Some(title) = &self.title {
            spending.title = title.clone();
        }
        if let Some(amount) = self.amount_deposited {
            spending.amount_deposited = amount;
        }
        if let Some(category) = &self.category {
            spending.category = category.clone();
        }
        if let Some(date) = self.date {
            spending.date = date;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordPatch {
    Bill(BillPatch),
    Investment(InvestmentPatch),
    Spending(SpendingPatch),
}

impl RecordPatch {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordPatch::Bill(_) => RecordKind::Bills,
            RecordPatch::Investment(_) => RecordKind::Investments,
            RecordPatch::Spending(_) => RecordKind::Spending,
        }
    }

    /// Validates the patch and trims a supplied title, matching what record
    /// creation does.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        let (title, amounts) = match &mut self {
            RecordPatch::Bill(patch) => (
                &mut patch.title,
                vec![
                    ("amountNeeded", patch.amount_needed),
                    ("amountDeposited", patch.amount_deposited),
                ],
            ),
            RecordPatch::Investment(patch) => (
                &mut patch.title,
                vec![
                    ("amountNeeded", patch.amount_needed),
                    ("amountDeposited", patch.amount_deposited),
                ],
            ),
            RecordPatch::Spending(patch) => (
                &mut patch.title,
                vec![("amountDeposited", patch.amount_deposited)],
            ),
        };
        if let Some(title) = title {
            validate_title(title)?;
            *title = title.trim().to_string();
        }
        for (field, amount) in amounts {
            if let Some(amount) = amount {
                validate_amount(field, amount)?;
            }
        }
        Ok(self)
    }
}

/// Profile fields a user may change after signup. `salary` is accepted as
/// an alias of `monthlySalary`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, alias = "salary", skip_serializing_if = "Option::is_none")]
    pub monthly_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prof_pic: Option<String>,
}

impl ProfilePatch {
    /// Validates the patch and canonicalises email and currency.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        if let Some(email) = self.email.take() {
            self.email = Some(normalize_email(&email)?);
        }
        if let Some(currency) = self.currency.take() {
            self.currency = Some(normalize_currency(&currency)?);
        }
        if let Some(salary) = self.monthly_salary {
            validate_amount("monthlySalary", salary)?;
        }
        Ok(self)
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(first_name) = &self.first_name {
            profile.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            profile.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(currency) = &self.currency {
            profile.currency = currency.clone();
        }
        if let Some(salary) = self.monthly_salary {
            profile.monthly_salary = salary;
        }
        if let Some(prof_pic) = &self.prof_pic {
            profile.prof_pic = Some(prof_pic.clone());
        }
    }
}

pub fn validate_amount(field: &'static str, amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NotANumber(field));
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount(field));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Empty("title"));
    }
    Ok(())
}

pub fn normalize_currency(currency: &str) -> Result<String, ValidationError> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ValidationError::Currency(currency.to_string()))
    }
}

pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::Email(email)),
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

pub fn validate_investment_categories(
    categories: &[InvestmentCategory],
) -> Result<(), ValidationError> {
    for (index, category) in categories.iter().enumerate() {
        if category.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if !(0.0..=100.0).contains(&category.percentage) {
            return Err(ValidationError::Percentage(category.percentage));
        }
        if categories[..index].iter().any(|other| other.id == category.id) {
            return Err(ValidationError::DuplicateId(category.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_with_records() -> User {
        let mut user = User::new(
            "u1".to_string(),
            Profile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                currency: "EUR".to_string(),
                monthly_salary: 1000.0,
                prof_pic: None,
            },
        );
        user.push_record(Record::Bill(Bill {
            id: "b1".to_string(),
            title: "Rent".to_string(),
            amount_needed: 500.0,
            amount_deposited: 300.0,
            due_date: None,
            category: "bill".to_string(),
        }));
        user.push_record(Record::Investment(Investment {
            id: "i1".to_string(),
            title: "Index fund".to_string(),
            amount_needed: 200.0,
            amount_deposited: 50.0,
        }));
        user
    }

    #[test]
    fn missing_and_null_amounts_read_as_zero() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "profile": { "email": "a@b.c" },
            "bills": [{ "id": "b1", "title": "Rent", "amountNeeded": null }],
            "investments": [{ "id": "i1", "title": "Fund" }],
            "spendings": [{ "id": "s1", "title": "Coffee", "amountDeposited": 3 }]
        }))
        .unwrap();

        assert_eq!(user.profile.monthly_salary, 0.0);
        assert_eq!(user.profile.currency, "USD");
        assert_eq!(user.bills[0].amount_needed, 0.0);
        assert_eq!(user.bills[0].amount_deposited, 0.0);
        assert_eq!(user.bills[0].category, "bill");
        assert_eq!(user.investments[0].amount_needed, 0.0);
        assert_eq!(user.spendings[0].amount_deposited, 3.0);
        assert_eq!(user.spendings[0].category, "spending");
        assert!(user.investment_categories.is_empty());
    }

    #[test]
    fn user_serializes_with_camel_case_fields() {
        let value = serde_json::to_value(user_with_records()).unwrap();
        assert_eq!(value["profile"]["monthlySalary"], json!(1000.0));
        assert_eq!(value["bills"][0]["amountNeeded"], json!(500.0));
        assert!(value["investmentCategories"].as_array().unwrap().is_empty());
        assert!(value["profile"].get("profPic").is_none());
    }

    #[test]
    fn default_categories_are_the_five_seed_entries() {
        let categories = default_investment_categories();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Stocks", "Bonds", "Real Estate", "Crypto", "Other"]);
        let total: f64 = categories.iter().map(|c| c.percentage).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut user = user_with_records();
        let patch = RecordPatch::Bill(BillPatch {
            amount_deposited: Some(500.0),
            ..Default::default()
        });

        assert!(user.apply_patch("b1", &patch));
        assert_eq!(user.bills[0].amount_deposited, 500.0);
        assert_eq!(user.bills[0].amount_needed, 500.0);
        assert_eq!(user.bills[0].title, "Rent");

        assert!(!user.apply_patch("missing", &patch));
    }

    #[test]
    fn patched_titles_are_trimmed_like_new_ones() {
        let patch = RecordPatch::Spending(SpendingPatch {
            title: Some("  Groceries  ".to_string()),
            ..Default::default()
        })
        .normalized()
        .unwrap();
        let RecordPatch::Spending(patch) = patch else {
            panic!("kind changed");
        };
        assert_eq!(patch.title.as_deref(), Some("Groceries"));

        let blank = RecordPatch::Bill(BillPatch {
            title: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(matches!(blank.normalized(), Err(ValidationError::Empty("title"))));

        let negative = RecordPatch::Investment(InvestmentPatch {
            amount_deposited: Some(-3.0),
            ..Default::default()
        });
        assert!(matches!(
            negative.normalized(),
            Err(ValidationError::NegativeAmount("amountDeposited"))
        ));
    }

    #[test]
    fn remove_record_filters_by_id() {
        let mut user = user_with_records();
        assert!(!user.remove_record(RecordKind::Bills, "i1"));
        assert!(user.remove_record(RecordKind::Investments, "i1"));
        assert!(user.investments.is_empty());
        assert_eq!(user.bills.len(), 1);
    }

    #[test]
    fn new_records_reject_negative_amounts() {
        let bill = NewBill {
            title: "Rent".to_string(),
            amount_needed: -1.0,
            amount_deposited: 0.0,
            due_date: None,
            category: None,
        };
        assert!(matches!(
            bill.into_bill("b1".to_string()),
            Err(ValidationError::NegativeAmount("amountNeeded"))
        ));

        let spending = NewSpending {
            title: "  ".to_string(),
            amount_deposited: 5.0,
            category: None,
            date: None,
        };
        assert!(matches!(
            spending.into_spending("s1".to_string()),
            Err(ValidationError::Empty("title"))
        ));
    }

    #[test]
    fn new_spending_fills_defaults() {
        let spending = NewSpending {
            title: "Lunch".to_string(),
            amount_deposited: 12.5,
            category: None,
            date: None,
        }
        .into_spending("s1".to_string())
        .unwrap();
        assert_eq!(spending.category, "spending");
        assert_eq!(spending.date, today());
    }

    #[test]
    fn profile_patch_accepts_salary_alias_and_normalizes() {
        let patch: ProfilePatch =
            serde_json::from_value(json!({ "salary": 2500, "currency": "gbp", "email": " Ada@Example.com " }))
                .unwrap();
        let patch = patch.normalized().unwrap();
        assert_eq!(patch.monthly_salary, Some(2500.0));
        assert_eq!(patch.currency.as_deref(), Some("GBP"));
        assert_eq!(patch.email.as_deref(), Some("ada@example.com"));

        let bad = ProfilePatch {
            currency: Some("EURO".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.normalized(), Err(ValidationError::Currency(_))));
    }

    #[test]
    fn category_validation_checks_range_and_ids() {
        let mut categories = default_investment_categories();
        assert!(validate_investment_categories(&categories).is_ok());

        categories[4].percentage = 120.0;
        assert!(matches!(
            validate_investment_categories(&categories),
            Err(ValidationError::Percentage(_))
        ));

        categories[4].percentage = 0.0;
        categories[4].id = "1".to_string();
        assert!(matches!(
            validate_investment_categories(&categories),
            Err(ValidationError::DuplicateId(_))
        ));
    }

    #[test]
    fn password_and_email_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
    }
}
