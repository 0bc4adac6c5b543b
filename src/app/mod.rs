pub mod observable;
pub mod session;
pub mod state;

pub use observable::Observable;
pub use session::Session;
pub use state::{FetchResult, FetchTicket, ViewSnapshot, ViewState, MAX_ZOOM, MIN_ZOOM};
