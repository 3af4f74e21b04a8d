use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use v4l::buffer::Type;

use v4l::io::traits::{CaptureStream, Stream as V4lStream};

use clothcap_core::error::{CameraError, Result};
use clothcap_core::frame::{Frame, FrameMetadata};
use clothcap_core::pixel_format::PixelFormat;
use clothcap_core::traits::{DeviceInfo, Stream};

/// V4L2 数据面：mmap 环形缓冲区
///
/// Drop 时 mmap::Stream 发出 STREAMOFF 并解除映射，设备句柄随最后一个 Arc 关闭。
pub struct V4l2Stream {
    inner: v4l::io::mmap::Stream<'static>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    /// 每行字节数，压缩格式为 0
    stride: usize,
    info: DeviceInfo,
    torch: Arc<AtomicBool>,
    is_streaming: bool,
    _dev: Arc<v4l::Device>,
}

unsafe impl Send for V4l2Stream {}

impl V4l2Stream {
    pub fn new(
        dev: Arc<v4l::Device>,
        info: DeviceInfo,
        fmt: &v4l::Format,
        buf_count: usize,
        torch: Arc<AtomicBool>,
    ) -> Result<Self> {
        let stream =
            v4l::io::mmap::Stream::with_buffers(&dev, Type::VideoCapture, buf_count as u32)
                .map_err(CameraError::Io)?;

        let pixel_format = crate::pixel_map::from_v4l_fourcc(fmt.fourcc);
        let stride = if pixel_format.is_compressed() {
            0
        } else {
            fmt.stride as usize
        };

        Ok(Self {
            inner: stream,
            width: fmt.width,
            height: fmt.height,
            pixel_format,
            stride,
            info,
            torch,
            is_streaming: false,
            _dev: dev,
        })
    }
}

#[async_trait]
impl Stream for V4l2Stream {
    async fn start(&mut self) -> Result<()> {
        V4lStream::start(&mut self.inner).map_err(CameraError::Io)?;
        self.is_streaming = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        V4lStream::stop(&mut self.inner).map_err(CameraError::Io)?;
        self.is_streaming = false;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame<'_>> {
        if !self.is_streaming {
            return Err(CameraError::Io(io::Error::other("Stream not started")));
        }

        let (buf, meta) = self.inner.next().map_err(CameraError::Io)?;

        // MJPEG 的有效载荷只有 bytesused 这么长
        let used = (meta.bytesused as usize).min(buf.len());

        Ok(Frame {
            data: &buf[..used],
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.pixel_format,
            sequence: meta.sequence as u64,
            metadata: FrameMetadata {
                torch_active: self.torch.load(Ordering::SeqCst),
            },
        })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn device(&self) -> &DeviceInfo {
        &self.info
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        tracing::debug!(target: "clothcap::v4l2", device = %self.info.id, "stream released");
    }
}
