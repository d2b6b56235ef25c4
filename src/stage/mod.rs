//! Composite stage module for chain-stage.

mod axis;
mod composite;
mod position;

pub use axis::{AxisMap, StageAxis};
pub use composite::CompositeStage;
pub use position::Position3D;
