/*!
# Nova Render Engine

Core of the Nova rendering system: GPU device abstraction and pipeline-state
management. This crate sits between a retained-mode scene renderer and a
native graphics device, and owns the hard parts of that boundary:

- **Device handle**: exclusive ownership of the native device, feature-tier
  negotiation and validity tracking.
- **Capability derivation**: an immutable capability set computed from the
  achieved feature tier and adapter identity.
- **Pipeline state cache**: engine-level blend/rasterizer/depth-stencil/
  sampler descriptors translated into native state objects, rebuilt only when
  a descriptor actually changed.
- **Binding and draw translation**: per-stage program/texture bindings and
  engine-neutral render operations mapped onto native primitives and draw
  variants, with compute/tessellation stage rules enforced.
- **Device-loss recovery**: a coordinator that releases, re-creates and
  restores device-dependent state across all registered subsystems.

The native driver is reached through the narrow [`device::NativeDevice`] /
[`device::DeviceProvider`] contracts. Backend plugins (e.g. the Vulkan device
plugin) provide concrete implementations; the core never talks to a driver
directly.
*/

// Internal modules
mod error;
mod engine;
pub mod log;

pub mod binding;
pub mod device;
pub mod draw;
pub mod fsaa;
pub mod matrices;
pub mod pipeline;
pub mod recovery;
pub mod system;
pub mod target;

// Main nova namespace module
pub mod nova {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Device sub-module: native device contracts and capabilities
    pub mod device {
        pub use crate::device::*;
    }

    // Render sub-module with all pipeline/draw/recovery types
    pub mod render {
        pub use crate::binding::*;
        pub use crate::draw::*;
        pub use crate::fsaa::*;
        pub use crate::pipeline::*;
        pub use crate::recovery::*;
        pub use crate::system::*;
        pub use crate::target::*;
    }

    // Math helpers
    pub mod matrices {
        pub use crate::matrices::*;
    }
}

// Re-export math library at crate root
pub use glam;
