#![cfg(target_os = "linux")]

pub mod controls;
pub mod device;
pub mod pixel_map;
pub mod stream;

use async_trait::async_trait;
use clothcap_core::builder::{CameraConfig, Facing};
use clothcap_core::error::{CameraError, Result};
use clothcap_core::traits::{DeviceControls, DeviceInfo, Driver, Stream};
use std::collections::HashMap;
use std::sync::Arc;

/// V4L2 驱动
///
/// V4L2 本身不报告镜头朝向，默认按设备名称推断；
/// 可以通过 `assign_facing` 为具体节点指定朝向。
#[derive(Debug, Clone, Default)]
pub struct V4l2Driver {
    facing_overrides: HashMap<String, Facing>,
}

impl V4l2Driver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 手动指定某个节点 (如 "/dev/video2") 的朝向
    pub fn assign_facing(mut self, path: &str, facing: Facing) -> Self {
        self.facing_overrides.insert(path.to_string(), facing);
        self
    }
}

#[async_trait]
impl Driver for V4l2Driver {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices = device::list_devices()?;
        for dev in &mut devices {
            if let Some(facing) = self.facing_overrides.get(&dev.id) {
                dev.facing = Some(*facing);
            }
        }
        Ok(devices)
    }

    async fn open(
        &self,
        config: &CameraConfig,
    ) -> Result<(Box<dyn Stream>, Box<dyn DeviceControls>)> {
        let devices = self.list_devices()?;
        let config = config.clone();

        // ioctl 全部是阻塞调用，挪到阻塞线程池
        let (stream, controls) =
            tokio::task::spawn_blocking(move || device::open(&devices, &config))
                .await
                .map_err(|e| CameraError::Io(std::io::Error::other(e.to_string())))??;

        Ok((Box::new(stream), Box::new(controls)))
    }
}

// 为了方便直接使用，提供一个默认实例
pub fn default_driver() -> Arc<dyn Driver> {
    Arc::new(V4l2Driver::new())
}
