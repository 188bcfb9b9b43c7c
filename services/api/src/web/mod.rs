pub mod design_task;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the binary mounts on the router.
pub use rest::{health_handler, list_styles_handler};
pub use ws_handler::ws_handler;
