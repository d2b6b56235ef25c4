//! Example: three-axis move on a simulated daisy chain.
//!
//! This example demonstrates how to:
//! - Open a controller session from TOML configuration
//! - Wrap three chained linear stages into a composite X/Y/Z stage
//! - Issue a simultaneous 3D move and read back the position
//!
//! Run with: `RUST_LOG=debug cargo run --example move_3d`

use chain_stage::driver::sim::SimulatedChain;
use chain_stage::{parse_config, CompositeStage, ControllerSession, Position3D, Result};
use embedded_hal_mock::eh1::delay::StdSleep;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Composite Stage Example ===\n");

    let config = parse_config(
        r#"
[chain]
descriptor_filter = "C-863"

[wait]
poll_interval_ms = 5
timeout_ms = 5000

[stage.axes]
x = 0
y = 1
z = 2
"#,
    )?;

    // Three 50 mm stages that each take a few polls to settle.
    let chain = SimulatedChain::with_linear_stages(3).settle_polls(5);
    let session = ControllerSession::open(chain, StdSleep::new(), &config)?;

    println!("Master: {}", session.master_descriptor());
    for device in session.devices() {
        println!(
            "  [{}] address {} - {} ({})",
            device.index(),
            device.address(),
            device.description(),
            device.state()
        );
    }

    let mut stage = CompositeStage::from_config(session, &config.stage)?;

    let target = Position3D::new(20.0, 20.0, 20.0);
    println!("\nMoving to {:?}", target.to_array());
    stage.move_absolute_3d(target, true)?;
    println!("Position: {:?}", stage.position_3d()?.to_array());

    stage.move_relative_3d(Position3D::new(-5.0, 0.0, 2.5), true)?;
    println!("Position after relative move: {:?}", stage.position_3d()?.to_array());

    stage.close()?;
    println!("\nChain released");
    Ok(())
}
