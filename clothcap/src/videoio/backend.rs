use std::sync::Arc;

#[allow(unused_imports)]
use anyhow::{anyhow, Result};
use clothcap_core::traits::Driver;

/// 后端枚举，用于标记当前使用的是哪个驱动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    V4L2,
    Simulation,
}

/// 按编译期 feature 与运行时设备情况创建驱动
///
/// 优先使用真实硬件；启用了 `simulation` 时，在没有任何设备的机器上回退到仿真手机。
#[allow(unreachable_code)]
pub fn create_driver() -> Result<(BackendType, Arc<dyn Driver>)> {
    #[cfg(all(feature = "linux-v4l2", target_os = "linux"))]
    {
        let driver: Arc<dyn Driver> = Arc::new(clothcap_backend_v4l2::V4l2Driver::new());
        match driver.list_devices() {
            Ok(devices) if !devices.is_empty() => {
                log::info!("using V4L2 backend ({} devices)", devices.len());
                return Ok((BackendType::V4L2, driver));
            }
            Ok(_) => log::warn!("V4L2 backend found no video devices"),
            Err(e) => log::warn!("V4L2 enumeration failed: {}", e),
        }

        #[cfg(not(feature = "simulation"))]
        return Ok((BackendType::V4L2, driver));
    }

    #[cfg(feature = "simulation")]
    {
        log::info!("using simulation backend");
        let driver: Arc<dyn Driver> = Arc::new(clothcap_simulation::SimDriver::phone());
        return Ok((BackendType::Simulation, driver));
    }

    Err(anyhow!(
        "No camera backend compiled in. Enable `linux-v4l2` or `simulation`."
    ))
}
