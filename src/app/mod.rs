mod buffer;
mod loader;
mod main_view;
mod pager;
mod request;
mod state;
mod view;

pub use buffer::LineType;
pub use request::{request_for_key, Request};
pub use state::{slot_rows, App};
pub use view::{DrawContext, OpenFlags, ViewKind};
