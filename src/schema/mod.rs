pub mod effect;
pub mod persona;
pub mod requirement;
pub mod scene;
pub mod state;
