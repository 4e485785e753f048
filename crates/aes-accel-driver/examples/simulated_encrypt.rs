//! Encrypt against the simulated accelerator
//!
//! Runs the full register protocol with no hardware attached.

use aes_accel_driver::{AesDevice, BlockCipherDriver, DriverConfig, Result, SimulatedAccelerator};
use std::time::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("aes_accel_driver=debug")
        .init();

    println!("🔐 AES_v1.0 simulated encryption\n");

    let sim = SimulatedAccelerator::new().with_busy_polls(3);
    let mut dev = AesDevice::with_gateway(sim)?;

    let driver =
        BlockCipherDriver::new(DriverConfig::default().with_poll_interval(Duration::from_millis(1)));

    let key = [b'A'; 32];
    let plaintext = [b'B'; 64];
    let result = driver.encrypt(&mut dev, 2, &key, &plaintext)?;

    println!("Blocks:     {}", result.blocks);
    println!("Polls:      {} ({:.1}/block)", result.poll_reads, result.polls_per_block());
    println!("Elapsed:    {:?}", result.elapsed);
    for (i, block) in result.ciphertext.chunks(16).enumerate() {
        let hex: String = block.iter().map(|b| format!("{b:02x}")).collect();
        println!("Block {}:    {hex}", i + 1);
    }
    println!("Accesses:   {}", dev.gateway().access_log().len());

    Ok(())
}
