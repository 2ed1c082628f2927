//! UI Components
//!
//! Leptos components for the shopping list.

mod auth_bar;
mod clear_completed_button;
mod new_item_form;
mod shopping_item_row;
mod store_section;

pub use auth_bar::AuthBar;
pub use clear_completed_button::ClearCompletedButton;
pub use new_item_form::NewItemForm;
pub use shopping_item_row::ShoppingItemRow;
pub use store_section::StoreSection;

/// Blocking browser alert, used for sign-in and validation failures
pub fn show_alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}
