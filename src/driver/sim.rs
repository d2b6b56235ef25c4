//! In-memory daisy chain (std only).
//!
//! [`SimulatedChain`] implements [`ChainDriver`] without hardware. Every call
//! is recorded so call order can be checked, and failures can be injected per
//! device and operation. Clones share state, so a clone kept by the caller
//! can inspect a chain that was moved into a session.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use heapless::Vec as BoundedVec;

use crate::config::units::{Millimeters, TravelRange};
use crate::error::truncated;

use super::{
    AxisId, ChainAddress, ChainDriver, ChainSlot, Descriptor, DriverError, DriverOp, DriverResult,
    MAX_AXES, MAX_CHAIN_DEVICES, MAX_CONTROLLERS,
};

/// Unallowable move on an unreferenced axis.
pub const ERR_UNREFERENCED: i32 = 5;
/// Target outside the travel range.
pub const ERR_OUT_OF_LIMITS: i32 = 7;
/// Servo is off.
pub const ERR_SERVO_OFF: i32 = 210;
/// No such axis on the device.
pub const ERR_INVALID_AXIS: i32 = 15;
/// Chain or device not connected.
pub const ERR_NOT_CONNECTED: i32 = -2;
/// Failure injected with [`SimulatedChain::fail_on`].
pub const ERR_INJECTED: i32 = -1000;

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// `enumerate(mask)`
    Enumerate(Option<String>),
    /// `open_chain(descriptor)`
    OpenChain(String),
    /// `connect(address)`
    Connect(ChainAddress),
    /// `close_chain()`
    CloseChain,
    /// `axes(address)`
    Axes(ChainAddress),
    /// `travel_range(address, axis)`
    TravelRange(ChainAddress, String),
    /// `enable_servo(address, axis)`
    EnableServo(ChainAddress, String),
    /// `home(address, axis)`
    Home(ChainAddress, String),
    /// `is_referenced(address, axis)`
    IsReferenced(ChainAddress, String),
    /// `move_absolute(address, axis, target)`
    MoveAbsolute(ChainAddress, String, f64),
    /// `position(address, axis)`
    Position(ChainAddress, String),
    /// `on_target(address, axis)`
    OnTarget(ChainAddress, String),
}

impl DriverCall {
    /// The operation this call was.
    pub fn operation(&self) -> DriverOp {
        match self {
            DriverCall::Enumerate(_) => DriverOp::Enumerate,
            DriverCall::OpenChain(_) => DriverOp::OpenChain,
            DriverCall::Connect(_) => DriverOp::Connect,
            DriverCall::CloseChain => DriverOp::CloseChain,
            DriverCall::Axes(_) => DriverOp::Axes,
            DriverCall::TravelRange(..) => DriverOp::TravelRange,
            DriverCall::EnableServo(..) => DriverOp::EnableServo,
            DriverCall::Home(..) => DriverOp::Home,
            DriverCall::IsReferenced(..) => DriverOp::IsReferenced,
            DriverCall::MoveAbsolute(..) => DriverOp::MoveAbsolute,
            DriverCall::Position(..) => DriverOp::Position,
            DriverCall::OnTarget(..) => DriverOp::OnTarget,
        }
    }
}

/// A simulated single- or multi-axis controller.
#[derive(Debug, Clone)]
pub struct SimDevice {
    description: String,
    axes: Vec<SimAxis>,
    connected: bool,
    stalled: bool,
    skip_reference: bool,
}

#[derive(Debug, Clone)]
struct SimAxis {
    id: AxisId,
    range: TravelRange,
    position: f64,
    target: f64,
    remaining_polls: u32,
    servo: bool,
    referenced: bool,
    reference_pending: bool,
}

impl SimDevice {
    /// A one-axis linear stage (axis `"1"`) with the given travel.
    pub fn linear_stage(description: &str, min: f64, max: f64) -> Self {
        Self::with_axes(description, &["1"], min, max)
    }

    /// A device with several axes sharing one travel range.
    pub fn with_axes(description: &str, axes: &[&str], min: f64, max: f64) -> Self {
        let range = TravelRange::new(Millimeters(min), Millimeters(max));
        Self {
            description: description.to_string(),
            axes: axes
                .iter()
                .filter_map(|name| AxisId::new(name))
                .map(|id| SimAxis {
                    id,
                    range,
                    position: min,
                    target: min,
                    remaining_polls: 0,
                    servo: false,
                    referenced: false,
                    reference_pending: false,
                })
                .collect(),
            connected: false,
            stalled: false,
            skip_reference: false,
        }
    }

    /// A device with no controllable axis.
    pub fn without_axes(description: &str) -> Self {
        Self::with_axes(description, &[], 0.0, 0.0)
    }

    /// Start at `position` instead of the lower travel bound.
    pub fn at(mut self, position: f64) -> Self {
        for axis in &mut self.axes {
            axis.position = position;
            axis.target = position;
        }
        self
    }
}

#[derive(Debug, Default)]
struct SimState {
    descriptors: Vec<String>,
    slots: Vec<Option<SimDevice>>,
    chain_open: bool,
    settle_polls: u32,
    response_time: Duration,
    failures: Vec<(Option<ChainAddress>, DriverOp)>,
    calls: Vec<DriverCall>,
}

impl SimState {
    fn record(&mut self, call: DriverCall) -> DriverResult<()> {
        let op = call.operation();
        let address = match &call {
            DriverCall::Connect(a)
            | DriverCall::Axes(a)
            | DriverCall::TravelRange(a, _)
            | DriverCall::EnableServo(a, _)
            | DriverCall::Home(a, _)
            | DriverCall::IsReferenced(a, _)
            | DriverCall::MoveAbsolute(a, _, _)
            | DriverCall::Position(a, _)
            | DriverCall::OnTarget(a, _) => Some(*a),
            _ => None,
        };
        self.calls.push(call);
        if !self.response_time.is_zero() {
            thread::sleep(self.response_time);
        }

        let injected = self
            .failures
            .iter()
            .any(|(at, failing)| *failing == op && (at.is_none() || *at == address));
        if injected {
            return Err(DriverError::new(ERR_INJECTED, "injected failure"));
        }
        Ok(())
    }

    fn device(&mut self, address: ChainAddress) -> DriverResult<&mut SimDevice> {
        if !self.chain_open {
            return Err(DriverError::new(ERR_NOT_CONNECTED, "daisy chain not open"));
        }
        let slot = usize::from(address.value()).wrapping_sub(1);
        match self.slots.get_mut(slot) {
            Some(Some(device)) => Ok(device),
            _ => Err(DriverError::new(ERR_NOT_CONNECTED, "no device at address")),
        }
    }

    fn connected_device(&mut self, address: ChainAddress) -> DriverResult<&mut SimDevice> {
        let device = self.device(address)?;
        if !device.connected {
            return Err(DriverError::new(ERR_NOT_CONNECTED, "device not connected"));
        }
        Ok(device)
    }

    fn axis(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<&mut SimAxis> {
        self.connected_device(address)?
            .axes
            .iter_mut()
            .find(|a| &a.id == axis)
            .ok_or_else(|| DriverError::new(ERR_INVALID_AXIS, "invalid axis identifier"))
    }
}

/// Simulated daisy chain of controllers behind one USB master.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChain {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedChain {
    /// A chain with one attached master and no chained devices yet.
    pub fn new() -> Self {
        let chain = Self::default();
        chain.with(|s| {
            s.descriptors
                .push("PI C-863 Mercury SN 0000000001 (simulated)".to_string())
        });
        chain
    }

    /// A chain of `count` one-axis stages with 0–50 mm travel, all connected.
    pub fn with_linear_stages(count: usize) -> Self {
        let mut chain = Self::new();
        for i in 0..count {
            let description = format!("C-863 stage {}", i + 1);
            chain = chain.with_device(SimDevice::linear_stage(&description, 0.0, 50.0));
        }
        chain
    }

    /// No controller attached to the host.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Append a connected device at the next chain address.
    pub fn with_device(self, device: SimDevice) -> Self {
        self.with(|s| s.slots.push(Some(device)));
        self
    }

    /// Append a chain position where nothing answers.
    pub fn with_empty_slot(self) -> Self {
        self.with(|s| s.slots.push(None));
        self
    }

    /// Number of `on_target` polls a move or reference takes to finish.
    pub fn settle_polls(self, polls: u32) -> Self {
        self.with(|s| s.settle_polls = polls);
        self
    }

    /// Time every driver call takes to answer, like a slow serial link.
    pub fn response_time_ms(self, ms: u64) -> Self {
        self.with(|s| s.response_time = Duration::from_millis(ms));
        self
    }

    /// Make every call of `op` fail, on one device or on all.
    pub fn fail_on(self, address: Option<ChainAddress>, op: DriverOp) -> Self {
        self.with(|s| s.failures.push((address, op)));
        self
    }

    /// The device at `address` never reports on-target.
    pub fn stall(&self, address: ChainAddress) {
        self.with_device_at(address, |d| d.stalled = true);
    }

    /// The device at `address` finishes homing without becoming referenced.
    pub fn skip_reference(self, address: ChainAddress) -> Self {
        self.with_device_at(address, |d| d.skip_reference = true);
        self
    }

    /// Move the device at `address` behind the session's back.
    pub fn nudge(&self, address: ChainAddress, position: f64) {
        self.with_device_at(address, |d| {
            for axis in &mut d.axes {
                axis.position = position;
                axis.target = position;
            }
        });
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.with(|s| s.calls.clone())
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    /// How many times `op` was called.
    pub fn count(&self, op: DriverOp) -> usize {
        self.with(|s| s.calls.iter().filter(|c| c.operation() == op).count())
    }

    /// Whether the chain master is open.
    pub fn is_open(&self) -> bool {
        self.with(|s| s.chain_open)
    }

    /// Current position of the first axis at `address`.
    pub fn position_of(&self, address: ChainAddress) -> Option<f64> {
        self.with(|s| {
            let slot = usize::from(address.value()).checked_sub(1)?;
            s.slots.get(slot)?.as_ref()?.axes.first().map(|a| a.position)
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn with_device_at(&self, address: ChainAddress, f: impl FnOnce(&mut SimDevice)) {
        self.with(|s| {
            let slot = usize::from(address.value()).wrapping_sub(1);
            if let Some(Some(device)) = s.slots.get_mut(slot) {
                f(device);
            }
        });
    }
}

impl ChainDriver for SimulatedChain {
    fn enumerate(&mut self, mask: Option<&str>) -> DriverResult<BoundedVec<Descriptor, MAX_CONTROLLERS>> {
        self.with(|s| {
            s.record(DriverCall::Enumerate(mask.map(str::to_string)))?;
            Ok(s.descriptors
                .iter()
                .filter(|d| mask.map_or(true, |m| d.contains(m)))
                .take(MAX_CONTROLLERS)
                .map(|d| truncated(d))
                .collect())
        })
    }

    fn open_chain(&mut self, descriptor: &str) -> DriverResult<BoundedVec<ChainSlot, MAX_CHAIN_DEVICES>> {
        self.with(|s| {
            s.record(DriverCall::OpenChain(descriptor.to_string()))?;
            if !s.descriptors.iter().any(|d| d.starts_with(descriptor)) {
                return Err(DriverError::new(ERR_NOT_CONNECTED, "unknown controller"));
            }
            s.chain_open = true;
            Ok(s.slots
                .iter()
                .take(MAX_CHAIN_DEVICES)
                .map(|slot| match slot {
                    Some(device) => ChainSlot::Connected(truncated(&device.description)),
                    None => ChainSlot::NotConnected,
                })
                .collect())
        })
    }

    fn connect(&mut self, address: ChainAddress) -> DriverResult<()> {
        self.with(|s| {
            s.record(DriverCall::Connect(address))?;
            s.device(address)?.connected = true;
            Ok(())
        })
    }

    fn close_chain(&mut self) -> DriverResult<()> {
        self.with(|s| {
            s.record(DriverCall::CloseChain)?;
            if !s.chain_open {
                return Err(DriverError::new(ERR_NOT_CONNECTED, "daisy chain not open"));
            }
            s.chain_open = false;
            for device in s.slots.iter_mut().flatten() {
                device.connected = false;
            }
            Ok(())
        })
    }

    fn axes(&mut self, address: ChainAddress) -> DriverResult<BoundedVec<AxisId, MAX_AXES>> {
        self.with(|s| {
            s.record(DriverCall::Axes(address))?;
            Ok(s.connected_device(address)?
                .axes
                .iter()
                .take(MAX_AXES)
                .map(|a| a.id.clone())
                .collect())
        })
    }

    fn travel_range(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<TravelRange> {
        self.with(|s| {
            s.record(DriverCall::TravelRange(address, axis.to_string()))?;
            Ok(s.axis(address, axis)?.range)
        })
    }

    fn enable_servo(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<()> {
        self.with(|s| {
            s.record(DriverCall::EnableServo(address, axis.to_string()))?;
            s.axis(address, axis)?.servo = true;
            Ok(())
        })
    }

    fn home(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<()> {
        self.with(|s| {
            s.record(DriverCall::Home(address, axis.to_string()))?;
            let settle = s.settle_polls;
            let device = s.connected_device(address)?;
            let skip_reference = device.skip_reference;
            let a = device
                .axes
                .iter_mut()
                .find(|a| &a.id == axis)
                .ok_or_else(|| DriverError::new(ERR_INVALID_AXIS, "invalid axis identifier"))?;
            if !a.servo {
                return Err(DriverError::new(ERR_SERVO_OFF, "servo is off"));
            }
            let reference = if a.range.contains(Millimeters(0.0)) { 0.0 } else { a.range.min.0 };
            a.target = reference;
            a.reference_pending = !skip_reference;
            start_motion(a, settle);
            Ok(())
        })
    }

    fn is_referenced(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<bool> {
        self.with(|s| {
            s.record(DriverCall::IsReferenced(address, axis.to_string()))?;
            Ok(s.axis(address, axis)?.referenced)
        })
    }

    fn move_absolute(
        &mut self,
        address: ChainAddress,
        axis: &AxisId,
        target: Millimeters,
    ) -> DriverResult<()> {
        self.with(|s| {
            s.record(DriverCall::MoveAbsolute(address, axis.to_string(), target.0))?;
            let settle = s.settle_polls;
            let a = s.axis(address, axis)?;
            if !a.servo {
                return Err(DriverError::new(ERR_SERVO_OFF, "servo is off"));
            }
            if !a.referenced {
                return Err(DriverError::new(ERR_UNREFERENCED, "unallowable move on unreferenced axis"));
            }
            if !a.range.contains(target) {
                return Err(DriverError::new(ERR_OUT_OF_LIMITS, "position out of limits"));
            }
            a.target = target.0;
            start_motion(a, settle);
            Ok(())
        })
    }

    fn position(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<Millimeters> {
        self.with(|s| {
            s.record(DriverCall::Position(address, axis.to_string()))?;
            Ok(Millimeters(s.axis(address, axis)?.position))
        })
    }

    fn on_target(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<bool> {
        self.with(|s| {
            s.record(DriverCall::OnTarget(address, axis.to_string()))?;
            let stalled = s.connected_device(address)?.stalled;
            let a = s.axis(address, axis)?;
            if stalled {
                return Ok(false);
            }
            if a.remaining_polls == 0 {
                return Ok(true);
            }
            a.remaining_polls -= 1;
            if a.remaining_polls == 0 {
                arrive(a);
            }
            Ok(false)
        })
    }
}

fn start_motion(axis: &mut SimAxis, settle_polls: u32) {
    axis.remaining_polls = settle_polls;
    if settle_polls == 0 {
        arrive(axis);
    }
}

fn arrive(axis: &mut SimAxis) {
    axis.position = axis.target;
    if axis.reference_pending {
        axis.referenced = true;
        axis.reference_pending = false;
    }
}
