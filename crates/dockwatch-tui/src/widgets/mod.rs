//! Reusable widget abstractions for the TUI

mod dialog;
mod menu_list;

pub use dialog::{centered_rect, DialogBuilder};
pub use menu_list::MenuList;
