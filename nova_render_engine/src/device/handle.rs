/// Device handle - exclusive owner of the native device
///
/// The handle is created at system init and re-created wholesale on every
/// device loss; it is never partially patched. Replacing the handle
/// invalidates every downstream cache, so callers must treat replacement as
/// a full reset signal.
use crate::device::{
    AdapterInfo, AdapterSelector, DeviceCreationFlags, DeviceProvider, DriverKind, FeatureTier,
    NativeDevice,
};
use crate::error::{Error, Result};

/// Driver version quad as reported by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverVersion {
    pub major: u16,
    pub minor: u16,
    pub release: u16,
    pub build: u16,
}

impl std::fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.release, self.build
        )
    }
}

/// Parameters the device is created (and re-created) with
///
/// The render system retains this for the whole session so that recovery can
/// re-create the device on the previously selected adapter with the same
/// driver kind and tier range.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Which adapter to create the device on
    pub adapter: AdapterSelector,
    /// Requested driver kind
    pub driver_kind: DriverKind,
    /// Lowest acceptable feature tier
    pub min_tier: FeatureTier,
    /// Highest requested feature tier
    pub max_tier: FeatureTier,
    /// Creation flags (debug validation, threading hints)
    pub flags: DeviceCreationFlags,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterSelector::Default,
            driver_kind: DriverKind::Hardware,
            min_tier: FeatureTier::MIN,
            max_tier: FeatureTier::MAX,
            flags: if cfg!(debug_assertions) {
                DeviceCreationFlags::DEBUG_VALIDATION
            } else {
                DeviceCreationFlags::empty()
            },
        }
    }
}

/// Exclusive owner of the native device/context
///
/// Exactly one handle is live per rendering system instance. `is_valid()`
/// reflects whether the last native call reported a removal/reset condition.
pub struct DeviceHandle {
    native: Box<dyn NativeDevice>,
    tier: FeatureTier,
    adapter: AdapterInfo,
    driver_version: DriverVersion,
    valid: bool,
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("tier", &self.tier)
            .field("adapter", &self.adapter)
            .field("driver_version", &self.driver_version)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

impl DeviceHandle {
    /// Create a native device through `provider`
    ///
    /// Validates the requested tier range, then attempts creation with the
    /// configured flags. If the first attempt fails while the
    /// debug-validation flag is set, the flag is dropped and creation is
    /// retried exactly once; a second failure surfaces as a fatal
    /// initialization error.
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` when the tier range is inverted or the
    /// backend cannot create a device.
    pub fn create(provider: &mut dyn DeviceProvider, config: &DeviceConfig) -> Result<Self> {
        if config.min_tier > config.max_tier {
            return Err(Error::InitializationFailed(
                "Requested min feature tier is higher than the requested max tier".to_string(),
            ));
        }

        let created = match provider.create_device(
            &config.adapter,
            config.driver_kind,
            config.min_tier,
            config.max_tier,
            config.flags,
        ) {
            Ok(created) => created,
            Err(first_error)
                if config.flags.contains(DeviceCreationFlags::DEBUG_VALIDATION) =>
            {
                crate::engine_warn!(
                    "nova::DeviceHandle",
                    "Failed to create native device with debug validation ({}). Retrying without it.",
                    first_error
                );
                provider.create_device(
                    &config.adapter,
                    config.driver_kind,
                    config.min_tier,
                    config.max_tier,
                    config.flags - DeviceCreationFlags::DEBUG_VALIDATION,
                )?
            }
            Err(error) => {
                crate::engine_error!(
                    "nova::DeviceHandle",
                    "Failed to create native device: {}",
                    error
                );
                return Err(error);
            }
        };

        let driver_version = created.device.driver_version();
        crate::engine_info!(
            "nova::DeviceHandle",
            "Native device created on \"{}\" at feature tier {} (driver {})",
            created.adapter.name,
            created.tier,
            driver_version
        );

        Ok(Self {
            native: created.device,
            tier: created.tier,
            adapter: created.adapter,
            driver_version,
            valid: true,
        })
    }

    /// Borrow the native device
    pub fn native(&self) -> &dyn NativeDevice {
        self.native.as_ref()
    }

    /// Mutably borrow the native device
    pub fn native_mut(&mut self) -> &mut dyn NativeDevice {
        self.native.as_mut()
    }

    /// Feature tier the driver achieved at creation
    pub fn feature_tier(&self) -> FeatureTier {
        self.tier
    }

    /// Adapter the device lives on
    pub fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    /// Driver version quad
    pub fn driver_version(&self) -> DriverVersion {
        self.driver_version
    }

    /// Whether the device is still usable
    ///
    /// False once the device reported a removal/reset condition or was
    /// explicitly marked lost.
    pub fn is_valid(&self) -> bool {
        self.valid && !self.native.is_lost()
    }

    /// Mark the handle invalid without touching the native device
    pub fn mark_lost(&mut self) {
        self.valid = false;
    }

    /// Drop every reference the native device tracks
    ///
    /// Used at shutdown and immediately before the handle is replaced.
    pub fn release_all(&mut self) {
        self.native.release_all();
        self.valid = false;
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
