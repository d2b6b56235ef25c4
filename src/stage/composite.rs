//! Composite stage facade over a controller session.
//!
//! Presents X, Y and Z as named axes, each driven by one chained device.

use embedded_hal::delay::DelayNs;
use tracing::debug;

use crate::config::units::Millimeters;
use crate::config::StageConfig;
use crate::driver::ChainDriver;
use crate::error::{Error, Result};
use crate::session::ControllerSession;

use super::axis::{AxisMap, StageAxis};
use super::position::Position3D;

/// A 3-axis virtual stage built from single-axis chained devices.
///
/// Each logical axis uses its device's default axis, so every bound device
/// must have exactly one controllable axis.
///
/// # Example
///
/// ```rust,ignore
/// use chain_stage::{CompositeStage, ControllerSession, Position3D};
///
/// let session = ControllerSession::open(driver, delay, &config)?;
/// let mut stage = CompositeStage::from_config(session, &config.stage)?;
///
/// stage.move_absolute_3d(Position3D::new(20.0, 20.0, 20.0), true)?;
/// println!("{:?}", stage.position_3d()?);
/// ```
pub struct CompositeStage<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    /// The owned session.
    session: ControllerSession<D, DELAY>,
    /// Axis to device binding, fixed at construction.
    map: AxisMap,
}

impl<D, DELAY> CompositeStage<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    /// Create a stage over `session` with the given axis binding.
    ///
    /// On error the session is dropped, which releases the chain. Use
    /// [`try_new`](Self::try_new) to keep it.
    ///
    /// # Errors
    ///
    /// See [`check_binding`](Self::check_binding).
    pub fn new(session: ControllerSession<D, DELAY>, map: AxisMap) -> Result<Self> {
        Self::try_new(session, map).map_err(|(e, _session)| e)
    }

    /// Create a stage, handing the session back if the binding does not fit it.
    #[allow(clippy::type_complexity)]
    pub fn try_new(
        session: ControllerSession<D, DELAY>,
        map: AxisMap,
    ) -> core::result::Result<Self, (Error, ControllerSession<D, DELAY>)> {
        match Self::check_binding(&session, &map) {
            Ok(()) => Ok(Self { session, map }),
            Err(e) => Err((e, session)),
        }
    }

    /// Check that `map` can drive `session` without taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeviceIndex`] if a bound index has no device,
    /// or [`Error::InvalidAxis`] if a bound device does not have exactly one axis.
    pub fn check_binding(session: &ControllerSession<D, DELAY>, map: &AxisMap) -> Result<()> {
        if map.max_index() >= session.len() {
            return Err(Error::InvalidDeviceIndex {
                index: map.max_index(),
                count: session.len(),
            });
        }
        for (_, index) in map.iter() {
            session.travel_range(index, None)?;
        }
        Ok(())
    }

    /// Create a stage with the binding from configuration.
    pub fn from_config(session: ControllerSession<D, DELAY>, config: &StageConfig) -> Result<Self> {
        Self::new(session, AxisMap::from_bindings(&config.axes)?)
    }

    /// Create a stage with the default binding X→0, Y→1, Z→2.
    pub fn with_default_axes(session: ControllerSession<D, DELAY>) -> Result<Self> {
        Self::new(session, AxisMap::default())
    }

    /// Move one axis to an absolute position.
    pub fn move_absolute(&mut self, axis: StageAxis, target: Millimeters, wait: bool) -> Result<()> {
        let index = self.map.device_index(axis);
        self.session.move_absolute(index, target, None, wait)
    }

    /// Move one axis by a relative amount. Same caveat as
    /// [`ControllerSession::move_relative`].
    pub fn move_relative(&mut self, axis: StageAxis, delta: Millimeters, wait: bool) -> Result<()> {
        let index = self.map.device_index(axis);
        self.session.move_relative(index, delta, None, wait)
    }

    /// Current position of one axis.
    pub fn position(&mut self, axis: StageAxis) -> Result<Millimeters> {
        let index = self.map.device_index(axis);
        self.session.position(index, None)
    }

    /// Block until one axis is on target.
    pub fn wait(&mut self, axis: StageAxis) -> Result<()> {
        let index = self.map.device_index(axis);
        self.session.wait_for_idle(index)
    }

    /// Move all axes to `target`.
    ///
    /// All three moves are started, in X, Y, Z order, before any wait, so
    /// the stages travel at the same time. With `wait`, the call then blocks
    /// on X, Y and Z in turn.
    pub fn move_absolute_3d(&mut self, target: Position3D, wait: bool) -> Result<()> {
        debug!(x = target.x.0, y = target.y.0, z = target.z.0, wait, "move absolute 3d");
        for axis in StageAxis::ALL {
            self.move_absolute(axis, target.get(axis), false)?;
        }
        if wait {
            self.wait_all()?;
        }
        Ok(())
    }

    /// Move all axes by `delta` from the current position.
    ///
    /// The base is read with [`position_3d`](Self::position_3d) and carries
    /// the same non-atomic caveat.
    pub fn move_relative_3d(&mut self, delta: Position3D, wait: bool) -> Result<()> {
        let current = self.position_3d()?;
        self.move_absolute_3d(current + delta, wait)
    }

    /// Positions of X, Y and Z.
    ///
    /// Each axis is a separate query, so while the stage is moving the three
    /// values are from slightly different instants.
    pub fn position_3d(&mut self) -> Result<Position3D> {
        let mut position = Position3D::default();
        for axis in StageAxis::ALL {
            position.set(axis, self.position(axis)?);
        }
        Ok(position)
    }

    /// Block until X, Y and Z are on target, in that order.
    pub fn wait_all(&mut self) -> Result<()> {
        for axis in StageAxis::ALL {
            self.wait(axis)?;
        }
        Ok(())
    }

    /// The axis binding.
    #[inline]
    pub fn axis_map(&self) -> &AxisMap {
        &self.map
    }

    /// Device index driving `axis`.
    #[inline]
    pub fn device_index(&self, axis: StageAxis) -> usize {
        self.map.device_index(axis)
    }

    /// The underlying session.
    #[inline]
    pub fn session(&self) -> &ControllerSession<D, DELAY> {
        &self.session
    }

    /// Exclusive access to the underlying session.
    #[inline]
    pub fn session_mut(&mut self) -> &mut ControllerSession<D, DELAY> {
        &mut self.session
    }

    /// Release the chain. See [`ControllerSession::close`].
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    /// Give up the stage view and return the session.
    pub fn into_session(self) -> ControllerSession<D, DELAY> {
        self.session
    }
}

impl<D, DELAY> core::fmt::Debug for CompositeStage<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositeStage")
            .field("map", &self.map)
            .field("session", &self.session)
            .finish()
    }
}
