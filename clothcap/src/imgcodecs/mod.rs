use std::fmt;
use std::io::{self, Cursor};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use clothcap_core::error::CameraError;
use clothcap_core::frame::Frame;
use clothcap_core::pixel_format::FourCC;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, RgbImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SessionError};

pub const PNG_MEDIA_TYPE: &str = "image/png";

/// 把一帧 (任意支持的像素格式) 转换为 RGB8
///
/// 保持帧的原生尺寸，不缩放。
/// 支持 RGB3 / BGR3 / YUYV (按 stride 逐行读取) 和 MJPEG。
pub fn frame_to_rgb(frame: &Frame<'_>) -> Result<RgbImage> {
    let (w, h) = (frame.width, frame.height);

    if frame.format == FourCC::MJPEG {
        let img = image::load_from_memory_with_format(frame.data, ImageFormat::Jpeg)?;
        return Ok(img.to_rgb8());
    }

    let convert: fn(&[u8], u32, &mut Vec<u8>) = match frame.format {
        f if f == FourCC::RGB3 => |row, _, out| out.extend_from_slice(row),
        f if f == FourCC::BGR3 => |row, _, out| {
            for px in row.chunks_exact(3) {
                out.extend_from_slice(&[px[2], px[1], px[0]]);
            }
        },
        f if f == FourCC::YUYV => yuyv_row_to_rgb,
        _ => return Err(CameraError::FormatNotSupported.into()),
    };

    let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
    for y in 0..h {
        let row = frame.row(y).ok_or_else(|| {
            CameraError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("frame #{} truncated at row {}", frame.sequence, y),
            ))
        })?;
        convert(row, w, &mut rgb);
    }

    RgbImage::from_raw(w, h, rgb).ok_or_else(|| CameraError::FormatNotSupported.into())
}

/// YUYV 4:2:2 -> RGB (BT.601, limited range)
fn yuyv_row_to_rgb(row: &[u8], width: u32, out: &mut Vec<u8>) {
    for x in 0..width as usize {
        let pair = (x / 2) * 4;
        let y = row.get(x * 2).copied().unwrap_or(16) as i32;
        let u = row.get(pair + 1).copied().unwrap_or(128) as i32;
        let v = row.get(pair + 3).copied().unwrap_or(128) as i32;

        let c = y - 16;
        let d = u - 128;
        let e = v - 128;
        let clamp = |x: i32| x.clamp(0, 255) as u8;

        out.push(clamp((298 * c + 409 * e + 128) >> 8));
        out.push(clamp((298 * c - 100 * d - 208 * e + 128) >> 8));
        out.push(clamp((298 * c + 516 * d + 128) >> 8));
    }
}

/// 一张编码后的静帧
///
/// 导出文档里以 data URI 形式内嵌，解析回来时字节完全一致。
#[derive(Clone, PartialEq, Eq)]
pub struct StillImage {
    media_type: String,
    bytes: Vec<u8>,
}

impl StillImage {
    /// 编码为 PNG (无损)
    pub fn encode_png(img: &RgbImage) -> Result<Self> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ColorType::Rgb8,
        )?;
        Ok(Self {
            media_type: PNG_MEDIA_TYPE.to_string(),
            bytes,
        })
    }

    /// 冻结一帧
    pub fn from_frame(frame: &Frame<'_>) -> Result<Self> {
        Self::encode_png(&frame_to_rgb(frame)?)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 读取编码数据头部得到像素尺寸
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let reader = image::io::Reader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(image::ImageError::from)?;
        Ok(reader.into_dimensions()?)
    }

    /// 完整解码 (用于显示)
    pub fn decode(&self) -> Result<RgbImage> {
        Ok(image::load_from_memory(&self.bytes)?.to_rgb8())
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| SessionError::DataUri("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SessionError::DataUri("missing ',' separator".into()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| SessionError::DataUri("only base64 payloads are supported".into()))?;
        if media_type.is_empty() {
            return Err(SessionError::DataUri("missing media type".into()));
        }

        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| SessionError::DataUri(e.to_string()))?;

        Ok(Self {
            media_type: media_type.to_string(),
            bytes,
        })
    }
}

impl fmt::Debug for StillImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StillImage")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for StillImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for StillImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Self::from_data_uri(&uri).map_err(serde::de::Error::custom)
    }
}
