mod annual_amount;
mod category;
mod month;
mod property;
mod recurring;
mod tax_bucket;
mod transaction;

pub use annual_amount::AnnualCategoryAmount;
pub use category::{Category, CategoryType};
pub use month::Month;
pub use property::Property;
pub use recurring::{RecurringPosting, RecurringRule};
pub use tax_bucket::TaxBucket;
pub use transaction::Transaction;
