use std::fmt;

/// 四字符代码，小端存放 (与 V4L2 的 `v4l2_fourcc` 一致)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FourCC(pub u32);

impl FourCC {
    pub const fn from_bytes(code: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(code))
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const YUYV: Self = Self::from_bytes(*b"YUYV");
    /// 24 位，内存顺序 B-G-R
    pub const BGR3: Self = Self::from_bytes(*b"BGR3");
    /// 24 位，内存顺序 R-G-B
    pub const RGB3: Self = Self::from_bytes(*b"RGB3");
    pub const MJPEG: Self = Self::from_bytes(*b"MJPG");

    /// 静帧编码器能够解码的全部格式
    pub const DECODABLE: [Self; 4] = [Self::YUYV, Self::BGR3, Self::RGB3, Self::MJPEG];
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            let c = if b.is_ascii_graphic() { b as char } else { '.' };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

/// 帧的像素格式
///
/// 驱动可能上报任意私有格式，只有编码器认识的才是 `Known`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Known(FourCC),
    Unknown(u32),
}

impl PixelFormat {
    /// 原始代码
    pub fn code(&self) -> u32 {
        match self {
            Self::Known(cc) => cc.0,
            Self::Unknown(code) => *code,
        }
    }

    pub fn is_compressed(&self) -> bool {
        *self == FourCC::MJPEG
    }

    /// 静帧编码器能否处理这种格式
    pub fn is_decodable(&self) -> bool {
        matches!(self, Self::Known(cc) if FourCC::DECODABLE.contains(cc))
    }

    /// 紧凑排列时每像素字节数，压缩格式返回 None
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            Self::Known(FourCC::YUYV) => Some(2),
            Self::Known(FourCC::BGR3 | FourCC::RGB3) => Some(3),
            _ => None,
        }
    }
}

impl From<u32> for PixelFormat {
    fn from(code: u32) -> Self {
        let cc = FourCC(code);
        if FourCC::DECODABLE.contains(&cc) {
            Self::Known(cc)
        } else {
            Self::Unknown(code)
        }
    }
}

impl From<FourCC> for PixelFormat {
    fn from(cc: FourCC) -> Self {
        Self::Known(cc)
    }
}

impl PartialEq<FourCC> for PixelFormat {
    fn eq(&self, other: &FourCC) -> bool {
        self.code() == other.0
    }
}

impl PartialEq<PixelFormat> for FourCC {
    fn eq(&self, other: &PixelFormat) -> bool {
        other == self
    }
}
