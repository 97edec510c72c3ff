pub mod callback;
pub mod listener;
pub mod state;
