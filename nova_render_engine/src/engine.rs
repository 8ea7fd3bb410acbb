/// Nova Engine - Singleton manager for engine subsystems
///
/// Provides global singleton management for the render system and the engine
/// logger. Uses thread-safe static storage with RwLock for safe concurrent
/// access; actual rendering calls remain externally serialized through the
/// singleton's Mutex.
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::system::RenderSystem;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::SystemTime;

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Render system singleton (wrapped in Mutex for serialized access)
    render_system: RwLock<Option<Arc<Mutex<RenderSystem>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            render_system: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// Manages the lifecycle of the render system singleton and the global
/// logger.
///
/// # Example
///
/// ```no_run
/// use nova_render_engine::nova::Engine;
/// use nova_render_engine::nova::render::RenderSystem;
/// # fn provider() -> Box<dyn nova_render_engine::nova::device::DeviceProvider> { unimplemented!() }
///
/// Engine::initialize()?;
/// Engine::create_render_system(RenderSystem::new(provider()))?;
///
/// let rs = Engine::render_system()?;
/// // rs.lock().unwrap().initialize(...)...
///
/// Engine::shutdown();
/// # Ok::<(), nova_render_engine::nova::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("nova::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("nova::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    /// Initialize the engine
    ///
    /// Must be called once at application startup before creating any
    /// subsystems.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the entire engine and destroy all singletons
    ///
    /// After calling this, `initialize()` must be called again before
    /// creating new subsystems.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut rs) = state.render_system.write() {
                *rs = None;
            }
        }
    }

    /// Create and register the render system singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A render system already exists
    pub fn create_render_system(render_system: RenderSystem) -> Result<()> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })?;

        let mut lock = state.render_system.write().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "RenderSystem lock poisoned".to_string(),
            ))
        })?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                "RenderSystem already exists. Call Engine::destroy_render_system() first."
                    .to_string(),
            )));
        }

        *lock = Some(Arc::new(Mutex::new(render_system)));

        crate::engine_info!("nova::Engine", "RenderSystem singleton created successfully");

        Ok(())
    }

    /// Get the render system singleton
    ///
    /// # Returns
    ///
    /// A shared pointer to the render system wrapped in a Mutex; all
    /// rendering calls must be serialized through it.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or the render
    /// system has not been created.
    pub fn render_system() -> Result<Arc<Mutex<RenderSystem>>> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })?;

        let lock = state.render_system.read().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "RenderSystem lock poisoned".to_string(),
            ))
        })?;

        lock.clone().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "RenderSystem not created. Call Engine::create_render_system() first.".to_string(),
            ))
        })
    }

    /// Destroy the render system singleton
    ///
    /// Removes the singleton, allowing a new one to be created. Existing
    /// references remain valid until dropped.
    pub fn destroy_render_system() -> Result<()> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized".to_string(),
            ))
        })?;

        let mut lock = state.render_system.write().map_err(|_| {
            Self::log_and_return_error(Error::InitializationFailed(
                "RenderSystem lock poisoned".to_string(),
            ))
        })?;

        *lock = None;

        crate::engine_info!("nova::Engine", "RenderSystem singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut rs) = state.render_system.write() {
                *rs = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger,
    /// test capture, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by the engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
