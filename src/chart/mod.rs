//! Page routing and chart specifications.
//!
//! ```text
//!   Page ──build(PageContext)──▶ PageView { sections: [Chart(ChartSpec) | Notice] }
//! ```

pub mod pages;
pub mod spec;

pub use pages::{Page, PageContext, DEFAULT_SCATTER_SELECTION};
pub use spec::{AxisKind, ChartSpec, PageView, PairCell, SectionBody};
