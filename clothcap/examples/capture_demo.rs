// clothcap/examples/capture_demo.rs

use anyhow::Result;
use clothcap::prelude::*;

fn main() -> Result<()> {
    // 驱动里的 tracing 事件，以及 facade 的 log 记录
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    // 1. 打开摄像头 (有 V4L2 设备就用真机，否则用仿真手机)
    // 底层会自动启动后台 Tokio Runtime
    let mut station = CaptureStation::open_default(config.clone())?;

    if let Err(e) = station.start() {
        eprintln!("Camera unavailable: {}. Fix permissions or plug in a camera and retry.", e);
        return Ok(());
    }
    let status = station.status();
    println!(
        "Opened {} camera at {:?}, torch supported: {}",
        status.facing, status.resolution, status.illumination_supported
    );

    // 2. 第一件：后置 + 补光
    match station.toggle_torch() {
        Ok(()) => println!("Torch on"),
        Err(e) => println!("Torch: {}", e),
    }
    let still = station.capture()?;
    println!("Captured {:?} {:?}", still, still.dimensions()?);

    station.set_field("brand", "Nike")?;
    station.set_field("size", "M")?;
    station.set_field("genderAge", "Men")?;
    station.set_field("supplierId", "S100")?;
    station.save();

    // 3. 第二件：切到前置，不填尺码
    if let Err(e) = station.switch_camera() {
        eprintln!("Switch failed: {}", e);
        station.start_facing(Facing::Rear)?;
    }
    station.capture()?;
    station.set_field("brand", "Adidas")?;
    station.set_field("genderAge", "Kids")?;
    station.save();

    println!("Saved Entries: {}", station.catalog().len());
    for (i, entry) in station.catalog().iter().enumerate() {
        println!(
            "  #{} {:?} / {:?} / {:?} / {:?}",
            i + 1,
            entry.brand,
            entry.size,
            entry.gender_age,
            entry.supplier_id
        );
    }

    // 4. 导出到配置的目录
    let sink = DirectorySink::new(&config.output_dir);
    let doc = station.export(&sink)?;
    println!(
        "Exported {} ({} bytes)",
        sink.path_for(&doc).display(),
        doc.bytes.len()
    );

    station.close()?;
    Ok(())
}
