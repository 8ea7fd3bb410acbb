//! Unit tests for the recovery coordinator

use crate::device::mock_device::{MockDevice, MockDeviceState};
use crate::device::NativeDevice;
use crate::recovery::{
    DeviceResourceListener, DeviceState, RecoveryCoordinator, SceneManager,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CountingListener {
    lost: u32,
    restored: u32,
}

impl DeviceResourceListener for CountingListener {
    fn on_device_lost(&mut self) {
        self.lost += 1;
    }

    fn on_device_restored(&mut self, _device: &mut dyn NativeDevice) {
        self.restored += 1;
    }
}

#[derive(Default)]
struct CountingSceneManager {
    released: u32,
    restored: u32,
}

impl SceneManager for CountingSceneManager {
    fn release_manual_hardware_resources(&mut self) {
        self.released += 1;
    }

    fn restore_manual_hardware_resources(&mut self) {
        self.restored += 1;
    }
}

fn mock_native() -> MockDevice {
    MockDevice::new(Arc::new(Mutex::new(MockDeviceState::default())))
}

#[test]
fn test_initial_state_is_valid() {
    let coordinator = RecoveryCoordinator::new();
    assert_eq!(coordinator.state(), DeviceState::Valid);
    assert!(coordinator.accepts_rendering());
}

#[test]
fn test_state_cycle() {
    let mut coordinator = RecoveryCoordinator::new();
    let mut device = mock_native();

    coordinator.notify_lost();
    assert_eq!(coordinator.state(), DeviceState::Lost);
    assert!(!coordinator.accepts_rendering());

    coordinator.begin_recreate();
    assert_eq!(coordinator.state(), DeviceState::Recovering);
    assert!(!coordinator.accepts_rendering());

    coordinator.notify_restored(&mut device);
    assert_eq!(coordinator.state(), DeviceState::Valid);
    assert!(coordinator.accepts_rendering());
}

#[test]
fn test_listeners_notified_exactly_once_per_cycle() {
    let mut coordinator = RecoveryCoordinator::new();
    let listener = Arc::new(Mutex::new(CountingListener::default()));
    coordinator.register_listener(listener.clone());
    let mut device = mock_native();

    coordinator.notify_lost();
    coordinator.begin_recreate();
    coordinator.notify_restored(&mut device);

    let listener = listener.lock().unwrap();
    assert_eq!(listener.lost, 1);
    assert_eq!(listener.restored, 1);
}

#[test]
fn test_all_listeners_and_scene_managers_notified() {
    let mut coordinator = RecoveryCoordinator::new();
    let listeners: Vec<_> = (0..3)
        .map(|_| Arc::new(Mutex::new(CountingListener::default())))
        .collect();
    for listener in &listeners {
        coordinator.register_listener(listener.clone());
    }
    let manager = Arc::new(Mutex::new(CountingSceneManager::default()));
    coordinator.register_scene_manager(manager.clone());
    let mut device = mock_native();

    coordinator.notify_lost();
    coordinator.notify_restored(&mut device);

    for listener in &listeners {
        let listener = listener.lock().unwrap();
        assert_eq!(listener.lost, 1);
        assert_eq!(listener.restored, 1);
    }
    let manager = manager.lock().unwrap();
    assert_eq!(manager.released, 1);
    assert_eq!(manager.restored, 1);
}

#[test]
fn test_two_cycles_notify_twice() {
    let mut coordinator = RecoveryCoordinator::new();
    let listener = Arc::new(Mutex::new(CountingListener::default()));
    coordinator.register_listener(listener.clone());
    let mut device = mock_native();

    for _ in 0..2 {
        coordinator.notify_lost();
        coordinator.begin_recreate();
        coordinator.notify_restored(&mut device);
    }

    let listener = listener.lock().unwrap();
    assert_eq!(listener.lost, 2);
    assert_eq!(listener.restored, 2);
}
