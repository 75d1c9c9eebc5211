//! Product categories used to label complaint excerpts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The product family a complaint was filed against.
///
/// Serialized as its display name (`"Credit Card"`, `"Money Transfers"`, ...),
/// which is how the category is stored in the document store artifact.
/// Unknown names deserialize to [`ProductCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Personal Loan")]
    PersonalLoan,
    #[serde(rename = "Savings Account")]
    SavingsAccount,
    #[serde(rename = "Money Transfers")]
    MoneyTransfers,
    #[serde(other)]
    Other,
}

/// Raw CFPB `Product` labels grouped under each tracked category.
const PRODUCT_LABELS: &[(ProductCategory, &[&str])] = &[
    (ProductCategory::CreditCard, &["Credit card", "Credit card or prepaid card", "Prepaid card"]),
    (
        ProductCategory::PersonalLoan,
        &["Personal loan", "Consumer Loan", "Student loan", "Vehicle loan or lease"],
    ),
    (ProductCategory::SavingsAccount, &["Checking or savings account", "Bank account or service"]),
    (
        ProductCategory::MoneyTransfers,
        &["Money transfers", "Money transfer, virtual currency, or money service"],
    ),
];

impl ProductCategory {
    /// All tracked categories, excluding [`ProductCategory::Other`].
    pub const TRACKED: [ProductCategory; 4] = [
        ProductCategory::CreditCard,
        ProductCategory::PersonalLoan,
        ProductCategory::SavingsAccount,
        ProductCategory::MoneyTransfers,
    ];

    /// Map a raw complaint `Product` label onto a category.
    ///
    /// Matching is exact; anything unlisted is [`ProductCategory::Other`].
    pub fn from_product_label(label: &str) -> Self {
        PRODUCT_LABELS
            .iter()
            .find(|(_, labels)| labels.contains(&label))
            .map(|(category, _)| *category)
            .unwrap_or(ProductCategory::Other)
    }

    /// The human-readable category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::CreditCard => "Credit Card",
            ProductCategory::PersonalLoan => "Personal Loan",
            ProductCategory::SavingsAccount => "Savings Account",
            ProductCategory::MoneyTransfers => "Money Transfers",
            ProductCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
