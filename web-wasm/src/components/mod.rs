pub mod chat_dialog;
pub mod detail_panel;
pub mod filter_bar;
pub mod map_view;
pub mod unit_picker;
