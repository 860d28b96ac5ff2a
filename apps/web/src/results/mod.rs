// Read side of an analysis: adapted candidate records, the sortable table view
// and the suggestion panel. Everything here is recomputed from the session's
// result set on each request.

pub mod adapter;
pub mod handlers;
pub mod suggestions;
pub mod view;
