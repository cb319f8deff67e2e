pub mod backend;
pub mod classify;
pub mod focus;
pub mod input_state;
pub mod platform;
pub mod settings;

pub use input_state::InputState;
