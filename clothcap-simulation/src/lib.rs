//! 仿真驱动
//!
//! 不依赖任何硬件，实现与真实后端相同的 `Driver` 契约：
//! 按朝向选择设备、尽力协商分辨率、能力集只在采集成功后可查、Drop 即释放。
//! 测试通过 [`SimProbe`] 观察打开/关闭事件。

mod controls;
mod probe;
mod stream;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clothcap_core::builder::{CameraConfig, Facing};
use clothcap_core::error::{CameraError, Result};
use clothcap_core::traits::{pick_device, DeviceControls, DeviceInfo, Driver, Stream};

use crate::controls::SimControls;
pub use crate::probe::{SimEvent, SimProbe};
pub use crate::stream::SimStream;

/// 仿真摄像头的 torch 支持方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchSupport {
    /// 没有补光灯
    None,
    /// 只能在采集时协商 (切换需要重新打开)
    OnOpen,
    /// 可在运行中的轨道上切换
    Live,
}

/// 一颗仿真摄像头
#[derive(Debug, Clone)]
pub struct SimCamera {
    pub name: String,
    pub facing: Facing,
    /// 支持的分辨率，第一个是原生分辨率
    pub modes: Vec<(u32, u32)>,
    pub torch: TorchSupport,
    /// 补光灯接受命令但不会真正点亮 (硬件故障)
    pub torch_jammed: bool,
}

impl SimCamera {
    pub fn new(name: &str, facing: Facing) -> Self {
        Self {
            name: name.to_string(),
            facing,
            modes: vec![(320, 240)],
            torch: TorchSupport::None,
            torch_jammed: false,
        }
    }

    pub fn modes(mut self, modes: &[(u32, u32)]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn torch(mut self, support: TorchSupport) -> Self {
        self.torch = support;
        self
    }

    pub fn jam_torch(mut self) -> Self {
        self.torch_jammed = true;
        self
    }

    /// 分辨率协商：精确匹配优先，否则回退到原生分辨率
    fn negotiate(&self, config: &CameraConfig) -> (u32, u32) {
        let native = self.modes.first().copied().unwrap_or((320, 240));
        config
            .preferred_resolution()
            .filter(|req| self.modes.contains(req))
            .unwrap_or(native)
    }
}

/// 仿真驱动
#[derive(Debug)]
pub struct SimDriver {
    cameras: Vec<SimCamera>,
    permission_denied: AtomicBool,
    open_latency: Mutex<Duration>,
    probe: SimProbe,
}

impl SimDriver {
    pub fn new(cameras: Vec<SimCamera>) -> Self {
        Self {
            cameras,
            permission_denied: AtomicBool::new(false),
            open_latency: Mutex::new(Duration::ZERO),
            probe: SimProbe::new(),
        }
    }

    /// 典型手机：后置带可实时切换的 torch，前置没有
    pub fn phone() -> Self {
        Self::new(vec![
            SimCamera::new("Sim Rear Camera", Facing::Rear).torch(TorchSupport::Live),
            SimCamera::new("Sim Front Camera", Facing::Front),
        ])
    }

    /// 典型笔记本：只有一颗前置摄像头
    pub fn laptop() -> Self {
        Self::new(vec![SimCamera::new("Sim Integrated Camera", Facing::Front)])
    }

    /// 之后的采集请求全部因权限被拒绝
    pub fn deny_permission(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    /// 模拟设备响应延迟
    pub fn set_open_latency(&self, latency: Duration) {
        *self.open_latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }

    fn device_info(index: usize, cam: &SimCamera) -> DeviceInfo {
        DeviceInfo {
            name: cam.name.clone(),
            id: format!("sim:{}", index),
            backend: "Simulation".to_string(),
            facing: Some(cam.facing),
        }
    }
}

#[async_trait]
impl Driver for SimDriver {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self
            .cameras
            .iter()
            .enumerate()
            .map(|(i, cam)| Self::device_info(i, cam))
            .collect())
    }

    async fn open(
        &self,
        config: &CameraConfig,
    ) -> Result<(Box<dyn Stream>, Box<dyn DeviceControls>)> {
        let latency = *self.open_latency.lock().unwrap_or_else(|e| e.into_inner());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.permission_denied.load(Ordering::SeqCst) {
            self.probe.record(SimEvent::Rejected {
                facing: config.facing,
            });
            return Err(CameraError::PermissionDenied(
                "simulated permission prompt dismissed".into(),
            ));
        }

        let devices = self.list_devices()?;
        let Some(info) = pick_device(&devices, config.facing).cloned() else {
            self.probe.record(SimEvent::Rejected {
                facing: config.facing,
            });
            return Err(CameraError::NotFound(format!(
                "no {} camera in simulation",
                config.facing
            )));
        };

        // id 形如 "sim:N"，N 即 cameras 下标
        let index = devices.iter().position(|d| d.id == info.id).unwrap_or(0);
        let cam = &self.cameras[index];
        let resolution = cam.negotiate(config);
        let torch_on = cam.torch == TorchSupport::OnOpen && config.torch && !cam.torch_jammed;
        let torch = Arc::new(AtomicBool::new(torch_on));

        self.probe.record_open(&info.id, cam.facing, torch_on);
        tracing::info!(
            target: "clothcap::sim",
            device = %info.id,
            facing = %cam.facing,
            "Camera opened: {}x{}",
            resolution.0,
            resolution.1
        );

        let controls = SimControls {
            device: info.id.clone(),
            torch_support: cam.torch,
            jammed: cam.torch_jammed,
            torch: torch.clone(),
            probe: self.probe.clone(),
        };
        let stream = SimStream::new(info, resolution, torch, self.probe.clone());

        Ok((Box::new(stream), Box::new(controls)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clothcap_core::builder::Priority;

    #[tokio::test]
    async fn opens_matching_facing() {
        let driver = SimDriver::phone();
        let (stream, controls) = driver
            .open(&CameraConfig::new().facing(Facing::Front))
            .await
            .unwrap();

        assert_eq!(stream.device().facing, Some(Facing::Front));
        assert!(!controls.capabilities().has_torch());
        assert_eq!(driver.probe().open_streams(), 1);

        drop(stream);
        assert_eq!(driver.probe().open_streams(), 0);
    }

    #[tokio::test]
    async fn missing_facing_is_not_found() {
        let driver = SimDriver::laptop();
        let err = driver.open(&CameraConfig::new()).await.err().unwrap();
        assert!(matches!(err, CameraError::NotFound(_)));
        assert_eq!(driver.probe().opens(), 0);
    }

    #[tokio::test]
    async fn permission_denial() {
        let driver = SimDriver::phone();
        driver.deny_permission(true);
        let err = driver.open(&CameraConfig::new()).await.err().unwrap();
        assert!(matches!(err, CameraError::PermissionDenied(_)));
        assert_eq!(driver.probe().open_streams(), 0);
    }

    #[tokio::test]
    async fn resolution_is_best_effort() {
        let driver = SimDriver::new(vec![
            SimCamera::new("rear", Facing::Rear).modes(&[(640, 480), (1280, 720)])
        ]);

        let cfg = CameraConfig::new().resolution(1280, 720, Priority::Medium);
        let (stream, _) = driver.open(&cfg).await.unwrap();
        assert_eq!(stream.resolution(), (1280, 720));
        drop(stream);

        let cfg = CameraConfig::new().resolution(1920, 1080, Priority::Medium);
        let (stream, _) = driver.open(&cfg).await.unwrap();
        assert_eq!(stream.resolution(), (640, 480));
    }

    #[tokio::test]
    async fn torch_negotiated_on_open() {
        let driver = SimDriver::new(vec![
            SimCamera::new("rear", Facing::Rear).torch(TorchSupport::OnOpen)
        ]);
        let (_stream, controls) = driver.open(&CameraConfig::new().torch(true)).await.unwrap();
        assert!(controls.torch().unwrap());
        assert!(controls.capabilities().torch_requires_reopen());
    }
}
