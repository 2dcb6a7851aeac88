pub mod actions;
pub mod draft;
