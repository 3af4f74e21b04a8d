use crate::pixel_format::PixelFormat;

/// 核心帧结构体
/// 使用生命周期 'a 绑定到底层 Ring Buffer，实现零拷贝。
/// 需要跨越 await 或保存时，由调用方自行拷贝。
#[derive(Debug)]
pub struct Frame<'a> {
    /// 原始图像数据切片
    pub data: &'a [u8],

    /// 图像宽度 (Pixels)
    pub width: u32,

    /// 图像高度 (Pixels)
    pub height: u32,

    /// 跨距/步长 (Bytes per line)
    /// 可能大于 width * bpp；压缩格式下无意义，填 0
    pub stride: usize,

    /// 像素格式
    pub format: PixelFormat,

    /// 帧序号 (用于丢帧统计)
    pub sequence: u64,

    /// 帧级元数据
    pub metadata: FrameMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMetadata {
    /// 曝光这一帧时 torch 是否点亮 (驱动不报告则为 false)
    pub torch_active: bool,
}

impl Frame<'_> {
    /// 取第 y 行的有效像素字节 (去掉行尾 Padding)
    /// 压缩格式或越界返回 None
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let bpp = self.format.bytes_per_pixel()?;
        if y >= self.height {
            return None;
        }
        let stride = if self.stride == 0 {
            self.width as usize * bpp
        } else {
            self.stride
        };
        let start = y as usize * stride;
        let end = start + self.width as usize * bpp;
        self.data.get(start..end)
    }
}
