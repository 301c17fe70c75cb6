pub mod page_path;
pub mod period;

pub use page_path::PagePath;
pub use period::StatsPeriod;
