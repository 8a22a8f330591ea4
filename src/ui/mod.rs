pub mod filter_popover;
pub mod panels;
pub mod table;
