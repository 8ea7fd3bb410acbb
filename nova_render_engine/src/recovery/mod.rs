/// Recovery module - device-loss notification protocol and state machine
///
/// The device validity cycle is `Valid -> Lost -> Recovering -> Valid`.
/// While the coordinator is anywhere but `Valid`, rendering calls are a
/// caller error. The coordinator owns the registered dependent subsystems
/// and guarantees each receives exactly one lost notification followed by
/// exactly one restored notification per recovery cycle.
use crate::device::NativeDevice;
use std::sync::{Arc, Mutex};

/// Device validity state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Device usable, draws accepted
    Valid,
    /// A removal/reset condition was observed; teardown in progress
    Lost,
    /// The device handle is being re-created
    Recovering,
}

/// Device-dependent resource protocol
///
/// Collaborators (texture, buffer, shader managers) release native handles
/// on `on_device_lost` and reacquire them on `on_device_restored` without
/// losing their engine-level resource descriptions.
pub trait DeviceResourceListener: Send {
    fn on_device_lost(&mut self);

    fn on_device_restored(&mut self, device: &mut dyn NativeDevice);
}

/// Scene-manager protocol invoked during recovery
pub trait SceneManager: Send {
    /// Release manually managed hardware resources
    fn release_manual_hardware_resources(&mut self);

    /// Rebuild manually managed hardware resources
    fn restore_manual_hardware_resources(&mut self);
}

/// Orchestrates release and restoration of device-dependent resources
/// across all registered subsystems
pub struct RecoveryCoordinator {
    state: DeviceState,
    listeners: Vec<Arc<Mutex<dyn DeviceResourceListener>>>,
    scene_managers: Vec<Arc<Mutex<dyn SceneManager>>>,
}

impl Default for RecoveryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryCoordinator {
    pub fn new() -> Self {
        Self {
            state: DeviceState::Valid,
            listeners: Vec::new(),
            scene_managers: Vec::new(),
        }
    }

    /// Current device validity state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// True while draws may be submitted
    pub fn accepts_rendering(&self) -> bool {
        self.state == DeviceState::Valid
    }

    /// Register a dependent subsystem for loss/restore notifications
    pub fn register_listener(&mut self, listener: Arc<Mutex<dyn DeviceResourceListener>>) {
        self.listeners.push(listener);
    }

    /// Register a scene manager for manual-resource release/restore
    pub fn register_scene_manager(&mut self, manager: Arc<Mutex<dyn SceneManager>>) {
        self.scene_managers.push(manager);
    }

    /// Step 1 of recovery: emit the device-lost notification
    ///
    /// Every registered listener releases its device-dependent native
    /// resources; scene managers release their manual hardware resources.
    /// Engine-level descriptions stay intact.
    pub fn notify_lost(&mut self) {
        self.state = DeviceState::Lost;

        for listener in &self.listeners {
            if let Ok(mut listener) = listener.lock() {
                listener.on_device_lost();
            }
        }
        for manager in &self.scene_managers {
            if let Ok(mut manager) = manager.lock() {
                manager.release_manual_hardware_resources();
            }
        }
    }

    /// Step 3 of recovery: the device handle is being re-created
    pub fn begin_recreate(&mut self) {
        self.state = DeviceState::Recovering;
    }

    /// Step 4 of recovery: emit the device-restored notification
    ///
    /// Dependents rebuild their native resources from the retained
    /// engine-level descriptions; the coordinator returns to `Valid`.
    pub fn notify_restored(&mut self, device: &mut dyn NativeDevice) {
        for listener in &self.listeners {
            if let Ok(mut listener) = listener.lock() {
                listener.on_device_restored(device);
            }
        }
        for manager in &self.scene_managers {
            if let Ok(mut manager) = manager.lock() {
                manager.restore_manual_hardware_resources();
            }
        }

        self.state = DeviceState::Valid;
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
