/// Draw module - engine-neutral render operations and their native
/// translation

// Module declarations
pub mod operation;
pub mod primitive;
pub mod translator;

// Re-export from the submodules
pub use operation::*;
pub use primitive::*;
pub use translator::*;
