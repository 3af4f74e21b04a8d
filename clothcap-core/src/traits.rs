use crate::builder::{CameraConfig, Facing};
use crate::error::{CameraError, Result};
use crate::frame::Frame;
use async_trait::async_trait;
use bitflags::bitflags;

/// 设备基本信息
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// 对用户友好的显示名称 (e.g. "Integrated Camera")
    pub name: String,

    /// 唯一硬件 ID (e.g. "/dev/video0")
    pub id: String,

    /// 后端类型标识 (e.g. "V4L2", "Simulation")
    pub backend: String,

    /// 镜头朝向，驱动无法判断时为 None
    pub facing: Option<Facing>,
}

bitflags! {
    /// 轨道能力集
    /// 只有在采集成功之后才能查询到，每次重新采集都要重新查询。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct Capabilities: u32 {
        /// 有补光灯 (torch)
        const TORCH = 1 << 0;
        /// torch 可以在运行中的轨道上直接切换
        /// 没有这一位时，torch 只能在打开时协商，切换需要重新采集
        const TORCH_LIVE = 1 << 1;
        const ZOOM = 1 << 2;
        const FOCUS = 1 << 3;
        const EXPOSURE = 1 << 4;
    }
}

impl Capabilities {
    pub fn has_torch(self) -> bool {
        self.contains(Self::TORCH)
    }

    /// torch 切换是否必须重新采集
    pub fn torch_requires_reopen(self) -> bool {
        self.contains(Self::TORCH) && !self.contains(Self::TORCH_LIVE)
    }
}

/// 按朝向挑选设备
///
/// 优先选择明确标注了朝向的设备。
/// 如果整个列表都没有朝向信息，则退化为按顺序：0 号为前置，1 号为后置。
pub fn pick_device(devices: &[DeviceInfo], facing: Facing) -> Option<&DeviceInfo> {
    if let Some(dev) = devices.iter().find(|d| d.facing == Some(facing)) {
        return Some(dev);
    }
    if devices.iter().any(|d| d.facing.is_some()) {
        return None;
    }
    let index = match facing {
        Facing::Front => 0,
        Facing::Rear => 1,
    };
    devices.get(index)
}

// --- 核心 Trait 定义 ---

/// 1. 驱动入口：设备枚举与采集
#[async_trait]
pub trait Driver: Send + Sync {
    /// 扫描总线，返回设备列表
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// 按配置打开一颗摄像头
    /// 返回分离的 Stream (数据面) 和 Controls (控制面)
    ///
    /// 分辨率是尽力而为，实际结果通过 `Stream::resolution` 查询。
    /// 没有匹配朝向的设备时返回 `NotFound`，无权限时返回 `PermissionDenied`。
    async fn open(&self, config: &CameraConfig)
        -> Result<(Box<dyn Stream>, Box<dyn DeviceControls>)>;
}

/// 2. 数据面：流式获取
/// 必须是 Send，以便在 Tokio 任务中运行
///
/// Drop 时必须释放底层硬件，`stop` 只是优雅的提前释放。
#[async_trait]
pub trait Stream: Send {
    /// 启动采集 (Alloc buffers, Start DMA)
    async fn start(&mut self) -> Result<()>;

    /// 停止采集 (Release bandwidth)
    async fn stop(&mut self) -> Result<()>;

    /// 获取下一帧
    /// 注意：这里返回的 Frame 生命周期绑定到 self (Stream)
    async fn next_frame(&mut self) -> Result<Frame<'_>>;

    /// 协商后设备实际给出的分辨率
    fn resolution(&self) -> (u32, u32);

    /// 被打开的设备
    fn device(&self) -> &DeviceInfo;
}

/// 3. 控制面：能力查询与硬件控制
pub trait DeviceControls: Send + Sync {
    /// 当前轨道的能力集
    fn capabilities(&self) -> Capabilities;

    /// 在运行中的轨道上切换 torch
    fn set_torch(&self, _on: bool) -> Result<()> {
        Err(CameraError::ControlNotSupported("torch"))
    }

    /// 读取硬件上 torch 的实际状态
    fn torch(&self) -> Result<bool> {
        Ok(false)
    }

    /// 导出当前配置快照 (用于持久化)
    /// 返回值使用 serde_json::Value 以兼容不同后端的配置结构
    #[cfg(feature = "serialize")]
    fn export_state(&self) -> Result<serde_json::Value>;
}

// 为 Box<T> 实现 Stream，这样 Box<dyn Stream> 也能被当做 Stream 使用
#[async_trait]
impl<S: Stream + ?Sized + Send> Stream for Box<S> {
    async fn start(&mut self) -> Result<()> {
        (**self).start().await
    }

    async fn stop(&mut self) -> Result<()> {
        (**self).stop().await
    }

    async fn next_frame(&mut self) -> Result<Frame<'_>> {
        (**self).next_frame().await
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn device(&self) -> &DeviceInfo {
        (**self).device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(id: &str, facing: Option<Facing>) -> DeviceInfo {
        DeviceInfo {
            name: id.to_string(),
            id: id.to_string(),
            backend: "Test".to_string(),
            facing,
        }
    }

    #[test]
    fn pick_prefers_tagged_devices() {
        let devices = vec![dev("a", Some(Facing::Rear)), dev("b", Some(Facing::Front))];
        assert_eq!(pick_device(&devices, Facing::Front).unwrap().id, "b");
        assert_eq!(pick_device(&devices, Facing::Rear).unwrap().id, "a");
    }

    #[test]
    fn pick_fails_when_tagged_side_missing() {
        let devices = vec![dev("a", Some(Facing::Front)), dev("b", None)];
        assert!(pick_device(&devices, Facing::Rear).is_none());
    }

    #[test]
    fn pick_falls_back_to_order() {
        let devices = vec![dev("laptop", None)];
        assert_eq!(pick_device(&devices, Facing::Front).unwrap().id, "laptop");
        assert!(pick_device(&devices, Facing::Rear).is_none());
    }

    #[test]
    fn torch_flags() {
        assert!(!Capabilities::empty().has_torch());
        assert!(Capabilities::TORCH.torch_requires_reopen());
        assert!(!(Capabilities::TORCH | Capabilities::TORCH_LIVE).torch_requires_reopen());
        assert!(!Capabilities::TORCH_LIVE.torch_requires_reopen());
    }
}
