//! Expense and income category labels shown to the model.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_EXPENSES: &[&str] = &[
    // food & drink
    "Breakfast", "Lunch", "Dinner", "Coffee", "Snacks", "Drinks/Party",
    // transport
    "Fuel", "Parking", "Taxi", "Maintenance", "Tickets",
    // housing
    "Rent", "Electricity", "Water", "Internet", "Gas", "Cleaning", "Repairs",
    // shopping
    "Clothing", "Shoes", "Cosmetics", "Accessories", "Household", "Electronics",
    // personal / health
    "Haircut", "Gym", "Medicine", "Doctor",
    // entertainment, family, other
    "Movies", "Travel", "Books", "Tuition", "Baby Supplies",
    "Weddings", "Gifts", "Charity", "Other",
];

const DEFAULT_INCOMES: &[&str] = &[
    "Salary", "Bonus", "Interest", "Selling", "Gift", "Refund", "Other",
];

pub const DEFAULT_FALLBACK: &str = "Other";

/// The permitted category labels, in the order they are listed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    expense: Vec<String>,
    income: Vec<String>,
    #[serde(default = "default_fallback")]
    fallback: String,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            expense: DEFAULT_EXPENSES.iter().map(|s| s.to_string()).collect(),
            income: DEFAULT_INCOMES.iter().map(|s| s.to_string()).collect(),
            fallback: default_fallback(),
        }
    }
}

impl Catalog {
    pub fn new(
        expense: Vec<String>,
        income: Vec<String>,
        fallback: impl Into<String>,
    ) -> Result<Self> {
        let catalog = Self {
            expense,
            income,
            fallback: fallback.into(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from TOML text.
    ///
    /// ```toml
    /// expense = ["Rent", "Food"]
    /// income = ["Salary"]
    /// fallback = "Misc"   # optional, defaults to "Other"
    /// ```
    pub fn from_toml(text: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn expense(&self) -> &[String] {
        &self.expense
    }

    pub fn income(&self) -> &[String] {
        &self.income
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    fn validate(&self) -> Result<()> {
        if self.fallback.trim().is_empty() {
            return Err(Error::Catalog("fallback label is blank".into()));
        }
        for (kind, labels) in [("expense", &self.expense), ("income", &self.income)] {
            if labels.is_empty() {
                return Err(Error::Catalog(format!("{kind} list is empty")));
            }
            let mut seen = HashSet::new();
            for label in labels {
                if label.trim().is_empty() {
                    return Err(Error::Catalog(format!("{kind} list contains a blank label")));
                }
                if !seen.insert(label.as_str()) {
                    return Err(Error::Catalog(format!("duplicate {kind} label `{label}`")));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.expense().len(), 37);
        assert_eq!(catalog.income().len(), 7);
        assert_eq!(catalog.expense()[0], "Breakfast");
        assert_eq!(catalog.fallback(), "Other");
    }

    #[test]
    fn test_from_toml() {
        let catalog = Catalog::from_toml(
            r#"
expense = ["Rent", "Food"]
income = ["Salary"]
"#,
        )
        .unwrap();
        assert_eq!(catalog.expense(), ["Rent", "Food"]);
        assert_eq!(catalog.income(), ["Salary"]);
        assert_eq!(catalog.fallback(), "Other");
    }

    #[test]
    fn test_from_toml_custom_fallback() {
        let catalog = Catalog::from_toml(
            r#"
expense = ["Rent"]
income = ["Salary"]
fallback = "Misc"
"#,
        )
        .unwrap();
        assert_eq!(catalog.fallback(), "Misc");
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = Catalog::new(
            vec!["Rent".into(), "Rent".into()],
            vec!["Salary".into()],
            "Other",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
        assert!(err.to_string().contains("duplicate expense label"));
    }

    #[test]
    fn test_rejects_empty_list() {
        let err = Catalog::new(vec!["Rent".into()], vec![], "Other").unwrap_err();
        assert!(err.to_string().contains("income list is empty"));
    }

    #[test]
    fn test_rejects_blank_label() {
        assert!(Catalog::new(vec!["  ".into()], vec!["Salary".into()], "Other").is_err());
        assert!(Catalog::new(vec!["Rent".into()], vec!["Salary".into()], "").is_err());
    }

    #[test]
    fn test_same_label_allowed_across_lists() {
        assert!(Catalog::new(vec!["Other".into()], vec!["Other".into()], "Other").is_ok());
    }

    #[test]
    fn test_from_toml_missing_field() {
        let err = Catalog::from_toml(r#"expense = ["Rent"]"#).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "expense = [\"Fuel\"]\nincome = [\"Bonus\"]\n").unwrap();
        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.expense(), ["Fuel"]);

        let missing = Catalog::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, Error::Io(_)));
    }
}
