//! Client-side record view engine.
//!
//! Raw records plus the current [`FilterCriteria`] go through
//! [`pipeline::apply`] (search, industry, distance, sort) and then
//! [`paginate`]. [`ViewOrchestrator`] owns the state containers, recomputes
//! the derived views after every mutation and hands the same filtered set to
//! both the table (current page only) and the map (every match).

pub mod criteria;
pub mod filter_state;
pub mod observe;
pub mod orchestrator;
pub mod paginate;
pub mod pipeline;
pub mod selection;
pub mod session;
pub mod sort;
pub mod source;
pub mod view_state;

pub use criteria::{FilterCriteria, SortDescriptor, SortDirection};
pub use filter_state::FilterState;
pub use observe::{Observable, SubscriptionId};
pub use orchestrator::{MapView, PageView, SelectionView, TableRow, ViewOrchestrator, ViewSnapshot};
pub use paginate::{paginate, Page};
pub use pipeline::{industry_facets, IndustryFacet};
pub use selection::{SelectionMode, SelectionScope, SelectionSet, SelectionState};
pub use session::{FileSessionStore, SessionError, SessionSnapshot, SessionStore};
pub use sort::{RecordComparator, SortKey};
pub use source::{load_city, RecordSource};
pub use view_state::{ColumnKey, ViewMode, ViewSettings, ViewState};
