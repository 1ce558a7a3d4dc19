pub mod landmark;
pub mod layout;
pub mod overlay;
pub mod status;
pub mod unlock_state;
