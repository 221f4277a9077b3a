/// A line on IRS Schedule E, Part I. Declaration order follows the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaxBucket {
    RentsReceived,
    Advertising,
    AutoAndTravel,
    CleaningAndMaintenance,
    Commissions,
    Insurance,
    LegalAndProfessionalFees,
    ManagementFees,
    MortgageInterest,
    OtherInterest,
    Repairs,
    Supplies,
    Taxes,
    Utilities,
    Depreciation,
    OtherExpenses,
}

impl TaxBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RentsReceived => "rents_received",
            Self::Advertising => "advertising",
            Self::AutoAndTravel => "auto_and_travel",
            Self::CleaningAndMaintenance => "cleaning_and_maintenance",
            Self::Commissions => "commissions",
            Self::Insurance => "insurance",
            Self::LegalAndProfessionalFees => "legal_and_professional_fees",
            Self::ManagementFees => "management_fees",
            Self::MortgageInterest => "mortgage_interest",
            Self::OtherInterest => "other_interest",
            Self::Repairs => "repairs",
            Self::Supplies => "supplies",
            Self::Taxes => "taxes",
            Self::Utilities => "utilities",
            Self::Depreciation => "depreciation",
            Self::OtherExpenses => "other_expenses",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RentsReceived => "Rents received",
            Self::Advertising => "Advertising",
            Self::AutoAndTravel => "Auto and travel",
            Self::CleaningAndMaintenance => "Cleaning and maintenance",
            Self::Commissions => "Commissions",
            Self::Insurance => "Insurance",
            Self::LegalAndProfessionalFees => "Legal and other professional fees",
            Self::ManagementFees => "Management fees",
            Self::MortgageInterest => "Mortgage interest paid to banks, etc.",
            Self::OtherInterest => "Other interest",
            Self::Repairs => "Repairs",
            Self::Supplies => "Supplies",
            Self::Taxes => "Taxes",
            Self::Utilities => "Utilities",
            Self::Depreciation => "Depreciation expense or depletion",
            Self::OtherExpenses => "Other",
        }
    }

    /// Schedule E line number.
    pub fn line(&self) -> u8 {
        match self {
            Self::RentsReceived => 3,
            Self::Advertising => 5,
            Self::AutoAndTravel => 6,
            Self::CleaningAndMaintenance => 7,
            Self::Commissions => 8,
            Self::Insurance => 9,
            Self::LegalAndProfessionalFees => 10,
            Self::ManagementFees => 11,
            Self::MortgageInterest => 12,
            Self::OtherInterest => 13,
            Self::Repairs => 14,
            Self::Supplies => 15,
            Self::Taxes => 16,
            Self::Utilities => 17,
            Self::Depreciation => 18,
            Self::OtherExpenses => 19,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::all().iter().copied().find(|b| b.as_str() == key)
    }

    pub fn all() -> &'static [TaxBucket] {
        &[
            Self::RentsReceived,
            Self::Advertising,
            Self::AutoAndTravel,
            Self::CleaningAndMaintenance,
            Self::Commissions,
            Self::Insurance,
            Self::LegalAndProfessionalFees,
            Self::ManagementFees,
            Self::MortgageInterest,
            Self::OtherInterest,
            Self::Repairs,
            Self::Supplies,
            Self::Taxes,
            Self::Utilities,
            Self::Depreciation,
            Self::OtherExpenses,
        ]
    }
}

impl std::fmt::Display for TaxBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
