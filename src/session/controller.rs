//! Controller session over one daisy chain.
//!
//! Generic over the driver binding and an embedded-hal 1.0 delay provider.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use tracing::{debug, info, warn};

use crate::config::units::{Millimeters, TravelRange};
use crate::config::{HomingConfig, SystemConfig, WaitConfig};
use crate::driver::{
    ChainAddress, ChainDriver, ChainSlot, Descriptor, DriverError, DriverOp, MAX_AXES,
    MAX_CHAIN_DEVICES,
};
use crate::error::{Error, InitStage, Result};

use super::builder::ControllerSessionBuilder;
use super::device::{AxisInfo, DeviceHandle};
use super::state::DeviceState;
use super::wait::{poll_until_on_target, WaitOutcome};

/// An open daisy chain and the initialized devices on it.
///
/// Generic over:
/// - `D`: driver binding (must implement [`ChainDriver`])
/// - `DELAY`: delay provider used between on-target polls (must implement `DelayNs`)
///
/// Devices are indexed from 0 in ascending chain-address order. The index
/// order is fixed for the lifetime of the session.
///
/// The chain connection is released by [`close`](Self::close) or when the
/// session is dropped, whichever comes first.
pub struct ControllerSession<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    /// Driver binding; sole owner of the physical chain.
    driver: D,

    /// Sleep provider for on-target polling.
    delay: DELAY,

    /// Connected devices, in chain-address order.
    devices: Vec<DeviceHandle, MAX_CHAIN_DEVICES>,

    /// Descriptor of the chain master.
    master: Descriptor,

    /// Polling for commanded moves.
    wait: WaitConfig,

    /// Polling for the reference move.
    homing: HomingConfig,

    /// Set once the chain has been released.
    closed: bool,
}

impl<D, DELAY> ControllerSession<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    /// Start building a session.
    pub fn builder(driver: D, delay: DELAY) -> ControllerSessionBuilder<D, DELAY> {
        ControllerSessionBuilder::new(driver, delay)
    }

    /// Open the chain with settings from `config`.
    ///
    /// Homes every device, so the stages physically move.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDeviceFound`] if nothing is attached or the chain is empty
    /// - [`Error::Initialization`] if any device cannot be connected, servoed or referenced
    /// - [`Error::Communication`] if enumeration or opening the chain fails
    pub fn open(driver: D, delay: DELAY, config: &SystemConfig) -> Result<Self> {
        Self::builder(driver, delay).from_config(config).open()
    }

    pub(crate) fn open_with(
        mut driver: D,
        delay: DELAY,
        descriptor_filter: Option<&str>,
        wait: WaitConfig,
        homing: HomingConfig,
    ) -> Result<Self> {
        let descriptors = driver
            .enumerate(descriptor_filter)
            .map_err(communication(DriverOp::Enumerate))?;

        let Some(master) = descriptors.first().cloned() else {
            warn!("could not find any attached controller");
            return Err(Error::NoDeviceFound);
        };
        info!(descriptor = master.as_str(), "directly attached controller");

        let slots = driver
            .open_chain(&master)
            .map_err(communication(DriverOp::OpenChain))?;

        // The chain is open from here on. Any early return drops `session`,
        // which releases it.
        let mut session = Self {
            driver,
            delay,
            devices: Vec::new(),
            master,
            wait,
            homing,
            closed: false,
        };

        session.devices = slots
            .iter()
            .enumerate()
            .filter_map(|(slot, state)| {
                let address = ChainAddress::from_slot(slot as u8);
                match state {
                    ChainSlot::Connected(description) => {
                        info!(
                            address = address.value(),
                            description = description.as_str(),
                            "found chained device"
                        );
                        Some((address, description.clone()))
                    }
                    ChainSlot::NotConnected => {
                        debug!(address = address.value(), "chain slot not connected");
                        None
                    }
                }
            })
            .enumerate()
            .map(|(index, (address, description))| DeviceHandle::new(index, address, description))
            .collect();

        if session.devices.is_empty() {
            warn!("daisy chain reports no connected device");
            return Err(Error::NoDeviceFound);
        }

        session.initialize()?;
        info!(devices = session.devices.len(), "daisy chain ready");
        Ok(session)
    }

    /// Connect, servo and start homing every device, then wait for all references.
    fn initialize(&mut self) -> Result<()> {
        for index in 0..self.devices.len() {
            self.prepare_device(index)?;
        }
        for index in 0..self.devices.len() {
            self.await_reference(index)?;
        }
        Ok(())
    }

    fn prepare_device(&mut self, index: usize) -> Result<()> {
        let address = self.devices[index].address();
        let span = tracing::debug_span!("init", address = address.value());
        let _guard = span.enter();

        self.driver
            .connect(address)
            .map_err(|e| init_failure(address, InitStage::Connect, Some(&e)))?;

        let axes = self
            .driver
            .axes(address)
            .map_err(|e| init_failure(address, InitStage::AxisQuery, Some(&e)))?;
        if axes.is_empty() {
            return Err(init_failure(address, InitStage::NoAxes, None));
        }

        let axes = axes
            .into_iter()
            .map(|id| -> Result<AxisInfo> {
                let range = self
                    .driver
                    .travel_range(address, &id)
                    .map_err(|e| init_failure(address, InitStage::TravelRange, Some(&e)))?;
                debug!(axis = id.as_str(), min = range.min.0, max = range.max.0, "travel range");
                Ok(AxisInfo { id, range })
            })
            .collect::<Result<Vec<AxisInfo, MAX_AXES>>>()?;
        self.devices[index].set_axes(axes);

        let device = &self.devices[index];
        for axis in device.axes() {
            self.driver
                .enable_servo(address, &axis.id)
                .map_err(|e| init_failure(address, InitStage::Servo, Some(&e)))?;
        }
        for axis in device.axes() {
            self.driver
                .home(address, &axis.id)
                .map_err(|e| init_failure(address, InitStage::Homing, Some(&e)))?;
        }

        self.devices[index].set_state(DeviceState::Homing);
        debug!("reference move started");
        Ok(())
    }

    fn await_reference(&mut self, index: usize) -> Result<()> {
        let poll_interval_ms = self.wait.poll_interval_ms;
        let timeout = self.homing.timeout();
        let device = &self.devices[index];
        let address = device.address();

        let outcome = poll_until_on_target(
            &mut self.driver,
            &mut self.delay,
            address,
            device.axes(),
            poll_interval_ms,
            timeout,
        )
        .map_err(|e| init_failure(address, InitStage::Homing, Some(&e)))?;
        if outcome == WaitOutcome::TimedOut {
            return Err(init_failure(address, InitStage::HomingTimeout, None));
        }

        for axis in device.axes() {
            match self.driver.is_referenced(address, &axis.id) {
                Ok(true) => {}
                Ok(false) => return Err(init_failure(address, InitStage::NotReferenced, None)),
                Err(e) => return Err(init_failure(address, InitStage::Homing, Some(&e))),
            }
        }

        self.devices[index].set_state(DeviceState::Ready);
        info!(address = address.value(), "device referenced");
        Ok(())
    }

    /// Command an absolute move in millimeters.
    ///
    /// `axis` may be omitted on one-axis devices. No range check is done here;
    /// the controller enforces its own travel limits. With `wait` the call
    /// blocks until the device is on target, otherwise it returns as soon as
    /// the move is started.
    ///
    /// # Errors
    ///
    /// `InvalidDeviceIndex`, `InvalidAxis`, `Communication`, `MotionTimeout`
    /// or `SessionClosed`.
    pub fn move_absolute(
        &mut self,
        index: usize,
        target: Millimeters,
        axis: Option<&str>,
        wait: bool,
    ) -> Result<()> {
        let device = self.live_device(index)?;
        let address = device.address();
        let id = device.resolve_axis(axis)?.clone();

        debug!(address = address.value(), axis = id.as_str(), target = target.0, wait, "move absolute");
        self.driver
            .move_absolute(address, &id, target)
            .map_err(communication(DriverOp::MoveAbsolute))?;
        self.devices[index].set_state(DeviceState::Moving);

        if wait {
            self.wait_for_idle(index)?;
        }
        Ok(())
    }

    /// Command a move by `delta` millimeters from the current position.
    ///
    /// The position is read first and the absolute target is computed from
    /// it. If the device is moved by anything else between the two calls,
    /// the offset is applied to a stale base; serialize relative moves on a
    /// device yourself.
    pub fn move_relative(
        &mut self,
        index: usize,
        delta: Millimeters,
        axis: Option<&str>,
        wait: bool,
    ) -> Result<()> {
        let current = self.position(index, axis)?;
        self.move_absolute(index, current + delta, axis, wait)
    }

    /// Current measured position. Does not wait for motion to finish.
    pub fn position(&mut self, index: usize, axis: Option<&str>) -> Result<Millimeters> {
        let device = self.live_device(index)?;
        let address = device.address();
        let id = device.resolve_axis(axis)?.clone();

        self.driver
            .position(address, &id)
            .map_err(communication(DriverOp::Position))
    }

    /// Block until every axis of the device reports on-target.
    ///
    /// # Errors
    ///
    /// [`Error::MotionTimeout`] if the configured motion timeout elapses first.
    pub fn wait_for_idle(&mut self, index: usize) -> Result<()> {
        self.live_device(index)?;
        let poll_interval_ms = self.wait.poll_interval_ms;
        let timeout = self.wait.timeout();
        let device = &self.devices[index];
        let address = device.address();

        let outcome = poll_until_on_target(
            &mut self.driver,
            &mut self.delay,
            address,
            device.axes(),
            poll_interval_ms,
            timeout,
        )
        .map_err(communication(DriverOp::OnTarget))?;

        match outcome {
            WaitOutcome::OnTarget { polls } => {
                debug!(address = address.value(), polls, "on target");
                self.devices[index].set_state(DeviceState::Ready);
                Ok(())
            }
            WaitOutcome::TimedOut => {
                warn!(address = address.value(), timeout_ms = self.wait.timeout_ms, "move timed out");
                Err(Error::MotionTimeout {
                    address,
                    timeout_ms: self.wait.timeout_ms,
                })
            }
        }
    }

    /// Release the chain connection.
    ///
    /// Only the first call reaches the driver; later calls return `Ok(())`.
    /// All device handles move to [`DeviceState::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        for device in self.devices.iter_mut() {
            device.set_state(DeviceState::Closed);
        }

        info!(descriptor = self.master.as_str(), "disconnecting daisy chain");
        self.driver
            .close_chain()
            .map_err(communication(DriverOp::CloseChain))
    }

    /// Whether the chain has been released.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// All devices, in index order.
    #[inline]
    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    /// Device at `index`, if any.
    #[inline]
    pub fn device(&self, index: usize) -> Option<&DeviceHandle> {
        self.devices.get(index)
    }

    /// Number of devices.
    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the session holds no device.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Controllable axes of a device.
    pub fn axes(&self, index: usize) -> Result<&[AxisInfo]> {
        self.live_device(index).map(DeviceHandle::axes)
    }

    /// Travel range of a device axis.
    pub fn travel_range(&self, index: usize, axis: Option<&str>) -> Result<TravelRange> {
        self.live_device(index)?.travel_range(axis)
    }

    /// Lifecycle state of a device.
    pub fn state(&self, index: usize) -> Result<DeviceState> {
        self.devices
            .get(index)
            .map(DeviceHandle::state)
            .ok_or(Error::InvalidDeviceIndex {
                index,
                count: self.devices.len(),
            })
    }

    /// Descriptor of the chain master.
    #[inline]
    pub fn master_descriptor(&self) -> &str {
        self.master.as_str()
    }

    /// Polling settings for moves.
    #[inline]
    pub fn wait_config(&self) -> &WaitConfig {
        &self.wait
    }

    /// Shared access to the driver binding.
    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Exclusive access to the driver binding, for vendor calls outside this API.
    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn live_device(&self, index: usize) -> Result<&DeviceHandle> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        self.devices.get(index).ok_or(Error::InvalidDeviceIndex {
            index,
            count: self.devices.len(),
        })
    }
}

impl<D, DELAY> Drop for ControllerSession<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to release daisy chain");
        }
    }
}

impl<D, DELAY> core::fmt::Debug for ControllerSession<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerSession")
            .field("master", &self.master)
            .field("devices", &self.devices)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn communication(operation: DriverOp) -> impl FnOnce(DriverError) -> Error {
    move |source| Error::Communication { operation, source }
}

fn init_failure(address: ChainAddress, stage: InitStage, cause: Option<&DriverError>) -> Error {
    match cause {
        Some(e) => warn!(address = address.value(), %stage, error = %e, "device initialization failed"),
        None => warn!(address = address.value(), %stage, "device initialization failed"),
    }
    Error::Initialization { address, stage }
}
