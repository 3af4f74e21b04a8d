use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clothcap_core::builder::{CameraConfig, Facing, Priority};
use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_EXPORT_NAME;

/// 会话配置
///
/// 所有字段都有默认值，配置文件里只需写想覆盖的部分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// 第一次 start 使用的镜头朝向
    pub initial_facing: Facing,
    /// 首选分辨率 (尽力而为，设备给多少用多少)
    pub preferred_resolution: (u32, u32),
    /// Ring Buffer 大小
    pub buffer_count: usize,
    /// 导出文件名
    pub export_file_name: String,
    /// DirectorySink 的目标目录
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_facing: Facing::Rear,
            preferred_resolution: (1280, 720),
            buffer_count: 3,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl SessionConfig {
    /// 从 JSON 文件加载
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 采集请求的基础配置 (朝向与 torch 由控制器在每次采集时填入)
    pub fn camera_config(&self) -> CameraConfig {
        let (w, h) = self.preferred_resolution;
        CameraConfig::new()
            .facing(self.initial_facing)
            .resolution(w, h, Priority::Medium)
            .buffer_count(self.buffer_count)
    }
}
