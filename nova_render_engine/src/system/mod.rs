/// System module - the render system facade tying the core together

// Module declarations
pub mod render_system;

// Re-export from the submodules
pub use render_system::*;
