#[cfg(target_os = "linux")]
use anyhow::{Context, Result};
#[cfg(target_os = "linux")]
use clothcap_backend_v4l2::V4l2Driver;
#[cfg(target_os = "linux")]
use clothcap_core::builder::{CameraConfig, Facing, Priority};
#[cfg(target_os = "linux")]
use clothcap_core::traits::Driver;

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> Result<()> {
    // 1. 初始化日志，以便看到驱动里埋下的 tracing::info!
    tracing_subscriber::fmt::init();

    println!("=== clothcap V4L2 probe ===");

    let driver = V4l2Driver::new();

    // 2. 枚举设备
    let devices = driver.list_devices()?;
    if devices.is_empty() {
        anyhow::bail!("No cameras found! Please plug in a USB camera.");
    }
    for (i, dev) in devices.iter().enumerate() {
        println!("  [{}] {} ({}) facing={:?}", i, dev.name, dev.id, dev.facing);
    }

    // 3. 依次尝试两个朝向
    for facing in [Facing::Rear, Facing::Front] {
        let config = CameraConfig::new()
            .facing(facing)
            .resolution(1280, 720, Priority::Medium);

        let (mut stream, controls) = match driver.open(&config).await {
            Ok(pair) => pair,
            Err(e) => {
                println!("{}: unavailable ({})", facing, e);
                continue;
            }
        };

        let (w, h) = stream.resolution();
        println!(
            "{}: {} granted {}x{}, capabilities {:?}",
            facing,
            stream.device().name,
            w,
            h,
            controls.capabilities()
        );

        stream.start().await.context("Failed to start stream")?;
        for _ in 0..5 {
            let frame = stream.next_frame().await?;
            println!(
                "  frame #{} {:?} {} bytes torch={}",
                frame.sequence,
                frame.format,
                frame.data.len(),
                frame.metadata.torch_active
            );
        }

        if controls.capabilities().has_torch() {
            controls.set_torch(true)?;
            println!("  torch on: {}", controls.torch()?);
            controls.set_torch(false)?;
        }

        println!("  state: {}", controls.export_state()?);
        stream.stop().await?;
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    println!("This example only runs on Linux.");
}
