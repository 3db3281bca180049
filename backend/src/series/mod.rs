pub mod normalize;
pub mod record;
pub mod summary;

pub use normalize::{normalize, select_columns, NormalizeError, PRICE_OHLC_COLUMNS};
pub use record::{PointTime, TimeSeriesRecord};
pub use summary::{latest_close, latest_ratio, RatioReading, ValueReading};
