use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use clothcap_core::error::{CameraError, Result};
use clothcap_core::frame::{Frame, FrameMetadata};
use clothcap_core::pixel_format::FourCC;
use clothcap_core::traits::{DeviceInfo, Stream};

use crate::probe::SimProbe;

/// 仿真数据面：按需生成 RGB3 测试图
///
/// 图案是对角渐变，亮度随帧序号滚动；torch 点亮时整体提亮。
#[derive(Debug)]
pub struct SimStream {
    device: DeviceInfo,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
    sequence: u64,
    is_streaming: bool,
    torch: Arc<AtomicBool>,
    probe: SimProbe,
}

impl SimStream {
    pub(crate) fn new(
        device: DeviceInfo,
        (width, height): (u32, u32),
        torch: Arc<AtomicBool>,
        probe: SimProbe,
    ) -> Self {
        Self {
            device,
            width,
            height,
            buffer: vec![0; width as usize * height as usize * 3],
            sequence: 0,
            is_streaming: false,
            torch,
            probe,
        }
    }

    fn render(&mut self, lit: bool) {
        let w = self.width as usize;
        let h = self.height.max(1) as usize;
        let shift = (self.sequence % 256) as usize;
        let boost: u8 = if lit { 64 } else { 0 };

        for (i, px) in self.buffer.chunks_exact_mut(3).enumerate() {
            let (x, y) = (i % w, i / w);
            px[0] = ((x * 255 / w.max(1) + shift) % 256) as u8;
            px[1] = (y * 255 / h) as u8;
            px[2] = boost.saturating_add(((x + y) % 64) as u8);
        }
    }
}

#[async_trait]
impl Stream for SimStream {
    async fn start(&mut self) -> Result<()> {
        self.is_streaming = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.is_streaming = false;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame<'_>> {
        if !self.is_streaming {
            return Err(CameraError::Io(io::Error::other("Stream not started")));
        }

        let lit = self.torch.load(Ordering::SeqCst);
        self.sequence += 1;
        self.render(lit);

        Ok(Frame {
            data: &self.buffer,
            width: self.width,
            height: self.height,
            stride: self.width as usize * 3,
            format: FourCC::RGB3.into(),
            sequence: self.sequence,
            metadata: FrameMetadata { torch_active: lit },
        })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn device(&self) -> &DeviceInfo {
        &self.device
    }
}

impl Drop for SimStream {
    fn drop(&mut self) {
        // 释放"硬件"：熄灭 torch 并通知探针
        self.torch.store(false, Ordering::SeqCst);
        self.probe.record_close(&self.device.id);
        tracing::debug!(target: "clothcap::sim", device = %self.device.id, "stream released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clothcap_core::builder::Facing;

    fn stream(torch: bool) -> (SimStream, SimProbe) {
        let probe = SimProbe::new();
        let device = DeviceInfo {
            name: "Sim".into(),
            id: "sim:0".into(),
            backend: "Simulation".into(),
            facing: Some(Facing::Rear),
        };
        probe.record_open(&device.id, Facing::Rear, torch);
        let s = SimStream::new(
            device,
            (8, 4),
            Arc::new(AtomicBool::new(torch)),
            probe.clone(),
        );
        (s, probe)
    }

    #[tokio::test]
    async fn frames_require_start() {
        let (mut s, _probe) = stream(false);
        assert!(s.next_frame().await.is_err());

        s.start().await.unwrap();
        let frame = s.next_frame().await.unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.data.len(), 8 * 4 * 3);
        assert_eq!(frame.sequence, 1);
        assert!(!frame.metadata.torch_active);
    }

    #[tokio::test]
    async fn torch_marks_frames() {
        let (mut s, _probe) = stream(true);
        s.start().await.unwrap();
        let frame = s.next_frame().await.unwrap();
        assert!(frame.metadata.torch_active);
        assert!(frame.data[2] >= 64);
    }

    #[tokio::test]
    async fn drop_releases() {
        let (s, probe) = stream(false);
        assert_eq!(probe.open_streams(), 1);
        drop(s);
        assert_eq!(probe.open_streams(), 0);
        assert_eq!(probe.closes(), 1);
    }
}
