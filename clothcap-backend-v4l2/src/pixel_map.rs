use clothcap_core::pixel_format::{FourCC, PixelFormat};
use v4l::format::fourcc::FourCC as V4lFourCC;

/// 将 v4l crate 的 FourCC 转换为 clothcap-core 的 PixelFormat
pub fn from_v4l_fourcc(cc: V4lFourCC) -> PixelFormat {
    // 提取 u32 原始值
    let code: u32 = cc.into();

    match PixelFormat::from(code) {
        PixelFormat::Unknown(code) => {
            tracing::debug!(target: "clothcap::v4l2", "Unsupported V4L2 pixel format: {}", FourCC(code));
            PixelFormat::Unknown(code)
        }
        known => known,
    }
}

/// 将 clothcap-core 的格式转换为 v4l 的 FourCC
/// 用于请求设备设置格式
pub fn to_v4l_fourcc(fmt: PixelFormat) -> Option<V4lFourCC> {
    match fmt {
        PixelFormat::Known(cc) => Some(V4lFourCC::new(&cc.0.to_le_bytes())),
        PixelFormat::Unknown(_) => None, // 无法主动请求未知的格式
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_both_ways() {
        let v4l_cc = V4lFourCC::new(b"YUYV");
        let fmt = from_v4l_fourcc(v4l_cc);
        assert_eq!(fmt, FourCC::YUYV);
        assert_eq!(to_v4l_fourcc(fmt), Some(v4l_cc));
    }

    #[test]
    fn unknown_formats_cannot_be_requested() {
        let fmt = from_v4l_fourcc(V4lFourCC::new(b"NV12"));
        assert!(matches!(fmt, PixelFormat::Unknown(_)));
        assert_eq!(to_v4l_fourcc(fmt), None);
    }
}
