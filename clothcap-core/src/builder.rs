use crate::pixel_format::PixelFormat;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// 镜头朝向：决定打开哪一颗物理摄像头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum Facing {
    /// 前置 (自拍)
    Front,
    /// 后置 (环境)，默认
    #[default]
    Rear,
}

impl Facing {
    /// 另一侧的镜头
    pub fn flipped(self) -> Self {
        match self {
            Self::Front => Self::Rear,
            Self::Rear => Self::Front,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Rear => f.write_str("rear"),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CameraConfig {
    /// 请求的镜头朝向 (必须满足，否则 NotFound)
    pub facing: Facing,
    pub resolution_req: Vec<(u32, u32, Priority)>,
    pub fps_req: Option<(u32, Priority)>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub format_req: Vec<(PixelFormat, Priority)>,
    pub buffer_count: usize, // Ring Buffer 大小，默认 3
    /// 打开时即请求的 torch 状态
    /// 对于 torch 只能在采集协商时设定的驱动，这是唯一的生效途径
    pub torch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Priority {
    Low = 0,
    Medium = 50,
    High = 100,
    Required = 255, // 必须满足，否则报错
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraConfig {
    pub fn new() -> Self {
        Self {
            facing: Facing::default(),
            resolution_req: vec![],
            fps_req: None,
            format_req: vec![],
            buffer_count: 3,
            torch: false,
        }
    }

    /// 设置镜头朝向
    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// 添加分辨率要求
    pub fn resolution(mut self, w: u32, h: u32, p: Priority) -> Self {
        self.resolution_req.push((w, h, p));
        self
    }

    /// 添加帧率要求
    pub fn fps(mut self, fps: u32, p: Priority) -> Self {
        self.fps_req = Some((fps, p));
        self
    }

    /// 添加像素格式要求
    /// 支持传入 PixelFormat 或 FourCC (会自动转换)
    pub fn format<T: Into<PixelFormat>>(mut self, fmt: T, p: Priority) -> Self {
        self.format_req.push((fmt.into(), p));
        self
    }

    /// 设置缓冲区数量 (默认 3)
    pub fn buffer_count(mut self, count: usize) -> Self {
        self.buffer_count = count;
        self
    }

    /// 打开时的 torch 状态
    pub fn torch(mut self, on: bool) -> Self {
        self.torch = on;
        self
    }

    /// 最高优先级的分辨率请求
    pub fn preferred_resolution(&self) -> Option<(u32, u32)> {
        self.resolution_req
            .iter()
            .max_by_key(|(_, _, p)| *p)
            .map(|(w, h, _)| (*w, *h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_format::FourCC;

    #[test]
    fn builder_accumulates_requests() {
        let cfg = CameraConfig::new()
            .facing(Facing::Front)
            .resolution(640, 480, Priority::Low)
            .resolution(1280, 720, Priority::Medium)
            .format(FourCC::YUYV, Priority::High)
            .torch(true);

        assert_eq!(cfg.facing, Facing::Front);
        assert_eq!(cfg.resolution_req.len(), 2);
        assert_eq!(cfg.preferred_resolution(), Some((1280, 720)));
        assert_eq!(cfg.format_req[0].0, FourCC::YUYV);
        assert!(cfg.torch);
        assert_eq!(cfg.buffer_count, 3);
    }

    #[test]
    fn facing_defaults_to_rear_and_flips() {
        assert_eq!(Facing::default(), Facing::Rear);
        assert_eq!(Facing::Rear.flipped(), Facing::Front);
        assert_eq!(Facing::Front.flipped().flipped(), Facing::Front);
        assert_eq!(Facing::Front.to_string(), "front");
    }
}
