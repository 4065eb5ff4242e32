pub mod house;
pub mod series;
pub mod usage;

pub use house::{ContractType, House};
pub use series::{start_of_day, SeriesId, SeriesPoint, SOURCE_UTC_OFFSET};
pub use usage::{DailyUsage, TotalUsage};
