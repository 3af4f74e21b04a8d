use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use v4l::capability::Flags;
use v4l::video::Capture;

use clothcap_core::builder::{CameraConfig, Facing};
use clothcap_core::error::{CameraError, Result};
use clothcap_core::pixel_format::{FourCC, PixelFormat};
use clothcap_core::traits::{pick_device, DeviceInfo};

use crate::controls::{probe_capabilities, V4l2Controls};
use crate::pixel_map;
use crate::stream::V4l2Stream;

/// 枚举系统中的摄像头设备
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let mut devices = Vec::new();

    // 遍历 /dev/video* 节点
    for node in v4l::context::enum_devices() {
        let path = node.path().to_string_lossy().to_string();
        if let Ok(dev) = v4l::Device::with_path(&path) {
            if let Ok(caps) = dev.query_caps() {
                // 过滤：必须支持 Video Capture，忽略 Metadata 节点
                if caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                    let name = node.name().unwrap_or_else(|| "Unknown Camera".into());
                    devices.push(DeviceInfo {
                        facing: infer_facing(&name),
                        name,
                        id: path, // /dev/video0
                        backend: "V4L2".to_string(),
                    });
                }
            }
        }
    }

    Ok(devices)
}

/// 从设备名称推断朝向
/// 手机/平板的 V4L2 驱动常在名称里带 front/back 字样
pub fn infer_facing(name: &str) -> Option<Facing> {
    let name = name.to_ascii_lowercase();
    if ["front", "user", "selfie"].iter().any(|k| name.contains(k)) {
        Some(Facing::Front)
    } else if ["rear", "back", "world", "environment"]
        .iter()
        .any(|k| name.contains(k))
    {
        Some(Facing::Rear)
    } else {
        None
    }
}

fn map_open_error(path: &str, e: io::Error) -> CameraError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(path.to_string()),
        io::ErrorKind::NotFound => CameraError::NotFound(path.to_string()),
        _ if e.raw_os_error() == Some(16) => CameraError::DeviceBusy, // EBUSY
        _ => CameraError::Io(e),
    }
}

/// 打开设备并初始化流 (阻塞调用)
pub fn open(devices: &[DeviceInfo], config: &CameraConfig) -> Result<(V4l2Stream, V4l2Controls)> {
    // 1. 按朝向挑选节点
    let info = pick_device(devices, config.facing)
        .cloned()
        .ok_or_else(|| CameraError::NotFound(format!("no {} camera", config.facing)))?;

    // 2. 打开设备句柄
    let dev = v4l::Device::with_path(&info.id).map_err(|e| map_open_error(&info.id, e))?;

    // 3. 格式协商
    let negotiated = negotiate_format(&dev, config)?;

    // 4. 应用格式设置 (ioctl: VIDIOC_S_FMT)
    // 驱动可能会修改请求的分辨率，以 applied 为准
    let mut fmt = dev.format().map_err(CameraError::Io)?;
    fmt.width = negotiated.width;
    fmt.height = negotiated.height;
    fmt.fourcc =
        pixel_map::to_v4l_fourcc(negotiated.format).ok_or(CameraError::FormatNotSupported)?;
    let applied_fmt = dev.set_format(&fmt).map_err(CameraError::Io)?;

    tracing::info!(
        target: "clothcap::v4l2",
        device = %info.id,
        facing = ?info.facing,
        "Camera opened: {}x{} @ {}",
        applied_fmt.width,
        applied_fmt.height,
        applied_fmt.fourcc
    );

    // 5. 共享句柄：Stream 和 Controls 访问同一个 fd
    let dev_arc = Arc::new(dev);
    let caps = probe_capabilities(&dev_arc);
    let torch = Arc::new(AtomicBool::new(false));
    let controls = V4l2Controls::new(dev_arc.clone(), caps, torch.clone());

    // 6. 打开时请求的 torch 状态
    if config.torch && caps.has_torch() {
        controls.apply_torch(true)?;
    }

    // 7. 初始化流 (申请 Buffer, mmap)
    let stream = V4l2Stream::new(dev_arc, info, &applied_fmt, config.buffer_count, torch)?;

    Ok((stream, controls))
}

/// 协商结果
struct NegotiatedFormat {
    width: u32,
    height: u32,
    format: PixelFormat,
}

/// 遍历硬件支持的所有格式，计算得分，返回最佳配置
/// 只考虑静帧编码器能解码的格式
fn negotiate_format(dev: &v4l::Device, config: &CameraConfig) -> Result<NegotiatedFormat> {
    let mut best_score = -1;
    let mut best_fmt = None;

    let supported_formats = dev.enum_formats().map_err(CameraError::Io)?;

    for v4l_fmt in supported_formats {
        let core_fmt = pixel_map::from_v4l_fourcc(v4l_fmt.fourcc);
        if !core_fmt.is_decodable() {
            continue;
        }

        let resolutions = dev.enum_framesizes(v4l_fmt.fourcc).unwrap_or_default();

        for res in resolutions {
            // 只处理 Discrete 分辨率，Stepwise 暂略
            for size in res.size.to_discrete() {
                let current_score = calculate_score(config, size.width, size.height, core_fmt);

                if current_score > best_score {
                    best_score = current_score;
                    best_fmt = Some(NegotiatedFormat {
                        width: size.width,
                        height: size.height,
                        format: core_fmt,
                    });
                }
            }
        }
    }

    best_fmt.ok_or(CameraError::FormatNotSupported)
}

fn calculate_score(config: &CameraConfig, w: u32, h: u32, fmt: PixelFormat) -> i32 {
    let mut score = 0;

    // 1. 匹配分辨率
    for (req_w, req_h, prio) in &config.resolution_req {
        if w == *req_w && h == *req_h {
            score += *prio as i32 * 10;
        }
    }

    // 2. 匹配格式
    for (req_fmt, prio) in &config.format_req {
        if fmt == *req_fmt {
            score += *prio as i32 * 10;
        }
    }

    // 3. 没有显式格式要求时，高分辨率下偏好 MJPEG (USB 2.0 带宽)
    if config.format_req.is_empty() && fmt == FourCC::MJPEG && w * h >= 1280 * 720 {
        score += 5;
    }

    // 4. 越接近首选分辨率越好 (Tie-breaker)，否则分辨率越大越好
    match config.preferred_resolution() {
        Some((pw, ph)) => {
            let dist = (w as i64 - pw as i64).abs() + (h as i64 - ph as i64).abs();
            score -= (dist / 100) as i32;
        }
        None => score += (w / 100) as i32,
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use clothcap_core::builder::Priority;

    #[test]
    fn facing_from_name() {
        assert_eq!(infer_facing("Back Camera (imx363)"), Some(Facing::Rear));
        assert_eq!(infer_facing("front camera"), Some(Facing::Front));
        assert_eq!(infer_facing("Integrated Camera: Integrated C"), None);
    }

    #[test]
    fn preferred_resolution_wins() {
        let cfg = CameraConfig::new().resolution(1280, 720, Priority::Medium);
        let yuyv = PixelFormat::from(FourCC::YUYV);
        assert!(calculate_score(&cfg, 1280, 720, yuyv) > calculate_score(&cfg, 1920, 1080, yuyv));
        assert!(calculate_score(&cfg, 1280, 720, yuyv) > calculate_score(&cfg, 640, 480, yuyv));
    }

    #[test]
    fn closest_resolution_breaks_ties() {
        let cfg = CameraConfig::new().resolution(1280, 720, Priority::Medium);
        let yuyv = PixelFormat::from(FourCC::YUYV);
        assert!(calculate_score(&cfg, 960, 540, yuyv) > calculate_score(&cfg, 320, 240, yuyv));
    }

    #[test]
    fn permission_errors_map() {
        let e = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            map_open_error("/dev/video0", e),
            CameraError::PermissionDenied(_)
        ));
        let e = io::Error::from_raw_os_error(16);
        assert!(matches!(map_open_error("/dev/video0", e), CameraError::DeviceBusy));
    }
}
