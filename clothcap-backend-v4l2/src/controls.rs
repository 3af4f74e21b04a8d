use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use v4l::control::{Control, Value};
use v4l::Device;

use clothcap_core::error::{CameraError, Result};
use clothcap_core::traits::{Capabilities, DeviceControls};

// --- 手动定义 V4L2 标准常量 (Linux ABI) ---
// 来源: /usr/include/linux/v4l2-controls.h

const V4L2_CID_CAMERA_CLASS_BASE: u32 = 0x009A0900;
const V4L2_CID_FLASH_CLASS_BASE: u32 = 0x009C0900;

const CID_EXPOSURE_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 2; // 0x009A0902
const CID_FOCUS_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 10; // 0x009A090A
const CID_ZOOM_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 13; // 0x009A090D

// 闪光灯 LED 模式 (menu)
const CID_FLASH_LED_MODE: u32 = V4L2_CID_FLASH_CLASS_BASE + 1; // 0x009C0901
const FLASH_LED_MODE_NONE: i64 = 0;
const FLASH_LED_MODE_TORCH: i64 = 2;

/// 查询设备暴露的控制项，转换为能力集
/// V4L2 的 flash LED 模式可以在流运行中切换，因此 TORCH 总是带 TORCH_LIVE
pub fn probe_capabilities(dev: &Device) -> Capabilities {
    let descriptions = match dev.query_controls() {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(target: "clothcap::v4l2", "VIDIOC_QUERYCTRL failed: {}", e);
            return Capabilities::empty();
        }
    };

    descriptions
        .iter()
        .fold(Capabilities::empty(), |caps, desc| match desc.id {
            CID_FLASH_LED_MODE => caps | Capabilities::TORCH | Capabilities::TORCH_LIVE,
            CID_ZOOM_ABSOLUTE => caps | Capabilities::ZOOM,
            CID_FOCUS_ABSOLUTE => caps | Capabilities::FOCUS,
            CID_EXPOSURE_ABSOLUTE => caps | Capabilities::EXPOSURE,
            _ => caps,
        })
}

fn torch_control(on: bool) -> Control {
    let mode = if on {
        FLASH_LED_MODE_TORCH
    } else {
        FLASH_LED_MODE_NONE
    };
    Control {
        id: CID_FLASH_LED_MODE,
        value: Value::Integer(mode),
    }
}

/// V4L2 控制面
pub struct V4l2Controls {
    dev: Arc<Device>,
    caps: Capabilities,
    torch: Arc<AtomicBool>,
}

impl V4l2Controls {
    pub(crate) fn new(dev: Arc<Device>, caps: Capabilities, torch: Arc<AtomicBool>) -> Self {
        Self { dev, caps, torch }
    }

    pub(crate) fn apply_torch(&self, on: bool) -> Result<()> {
        self.dev
            .set_control(torch_control(on))
            .map_err(CameraError::Io)?;
        self.torch.store(on, Ordering::SeqCst);
        tracing::debug!(target: "clothcap::v4l2", on, "torch applied");
        Ok(())
    }
}

impl DeviceControls for V4l2Controls {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn set_torch(&self, on: bool) -> Result<()> {
        if !self.caps.has_torch() {
            return Err(CameraError::ControlNotSupported("torch"));
        }
        self.apply_torch(on)
    }

    fn torch(&self) -> Result<bool> {
        if !self.caps.has_torch() {
            return Ok(false);
        }
        let ctrl = self.dev.control(CID_FLASH_LED_MODE).map_err(CameraError::Io)?;
        Ok(matches!(ctrl.value, Value::Integer(FLASH_LED_MODE_TORCH)))
    }

    fn export_state(&self) -> Result<serde_json::Value> {
        use serde_json::json;

        let exp = self.dev.control(CID_EXPOSURE_ABSOLUTE).ok();

        Ok(json!({
            "backend": "v4l2",
            "capabilities": format!("{:?}", self.caps),
            "torch": self.torch.load(Ordering::SeqCst),
            // Value 实现了 Debug，可以直接 format!
            "exposure": exp.map(|v| format!("{:?}", v.value)),
        }))
    }
}

impl Drop for V4l2Controls {
    fn drop(&mut self) {
        // 释放轨道时熄灭补光灯
        if self.torch.load(Ordering::SeqCst) {
            if let Err(e) = self.apply_torch(false) {
                tracing::warn!(
                    target: "clothcap::v4l2",
                    "turning torch off on release failed: {}",
                    e
                );
            }
        }
    }
}
