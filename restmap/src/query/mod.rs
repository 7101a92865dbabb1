mod common;
pub use self::common::{sort_params, start_offset, SortBy, SortDirection};

mod list;
pub use self::list::{ListParams, ListQuery};
