//! Domain types for SectorLens

pub mod align;
pub mod bar;
pub mod interval;
pub mod series;

pub use align::{align_on_timestamps, AlignedPoint};
pub use bar::Bar;
pub use interval::{HistoryPeriod, Interval};
pub use series::{PriceSeries, SeriesError};
