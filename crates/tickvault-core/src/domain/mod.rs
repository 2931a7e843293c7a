mod date;
mod models;
mod symbol;

pub use date::DayDate;
pub use models::{PriceBar, PriceSeries};
pub use symbol::Symbol;
