/// A once-a-year figure for a property/category, in cents, signed by the
/// category's economic type. Never posted to the ledger; reports prorate it.
#[derive(Debug, Clone)]
pub struct AnnualCategoryAmount {
    pub id: Option<i64>,
    pub property_id: i64,
    pub year: i32,
    pub category_id: i64,
    pub amount: i64,
    pub note: String,
    /// Ownership link. Rows for different owners of the same bucket add up.
    pub owner: Option<String>,
}

impl AnnualCategoryAmount {
    pub fn new(property_id: i64, year: i32, category_id: i64, amount: i64) -> Self {
        Self {
            id: None,
            property_id,
            year,
            category_id,
            amount,
            note: String::new(),
            owner: None,
        }
    }
}
