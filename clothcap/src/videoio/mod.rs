pub mod backend;

use std::fmt;
use std::sync::Arc;

use clothcap_core::builder::{CameraConfig, Facing};
use clothcap_core::traits::{Capabilities, DeviceControls, Driver, Stream};
use image::RgbImage;
use tokio::sync::{watch, Mutex};

use crate::error::{Result, SessionError};
use crate::imgcodecs::{self, StillImage};

/// 流的生命周期状态
///
/// `Closed -> Opening -> Open` (start)，
/// `Open -> Opening -> Open` (切换朝向或需要重新采集的 torch 变化)，
/// `Opening -> Closed` (采集失败)，`Open -> Closed` (stop)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Closed,
    Opening,
    Open,
}

/// 控制器状态快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerStatus {
    pub state: StreamState,
    pub facing: Facing,
    /// 操作员期望的 torch 状态，与硬件是否支持无关
    pub illumination_requested: bool,
    /// 由当前轨道的能力集推导，CLOSED 时为 false
    pub illumination_supported: bool,
    /// 设备实际给出的分辨率
    pub resolution: Option<(u32, u32)>,
}

/// 当前唯一打开的流 (数据面 + 控制面)
///
/// Drop 即释放硬件；`release` 在此之前先尝试优雅的 stop。
struct ActiveStream {
    stream: Box<dyn Stream>,
    controls: Box<dyn DeviceControls>,
}

impl ActiveStream {
    async fn release(mut self) {
        let id = self.stream.device().id.clone();
        if let Err(e) = self.stream.stop().await {
            log::warn!("stopping {} failed, dropping anyway: {}", id, e);
        }
        log::debug!("released {}", id);
    }
}

struct ControllerInner {
    facing: Facing,
    torch_requested: bool,
    caps: Capabilities,
    active: Option<ActiveStream>,
}

/// 摄像头会话控制器
///
/// 独占当前的流及其控制面，任意时刻最多一条打开的流。
/// 所有重新配置 (start / switch_facing / set_illumination / stop) 都在同一把异步锁下
/// 完成完整的 stop-and-reacquire，后来的请求会等前一个结束后才开始。
pub struct CameraController {
    driver: Arc<dyn Driver>,
    base: CameraConfig,
    inner: Mutex<ControllerInner>,
    status_tx: watch::Sender<ControllerStatus>,
}

impl fmt::Debug for CameraController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraController")
            .field("status", &*self.status_tx.borrow())
            .finish()
    }
}

impl CameraController {
    /// `base` 提供分辨率等偏好，其中的 facing 作为初始朝向
    pub fn new(driver: Arc<dyn Driver>, base: CameraConfig) -> Self {
        let facing = base.facing;
        let (status_tx, _) = watch::channel(ControllerStatus {
            facing,
            ..Default::default()
        });
        Self {
            driver,
            base,
            inner: Mutex::new(ControllerInner {
                facing,
                torch_requested: false,
                caps: Capabilities::empty(),
                active: None,
            }),
            status_tx,
        }
    }

    /// 当前状态快照 (不需要等待进行中的重新配置)
    pub fn status(&self) -> ControllerStatus {
        self.status_tx.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<ControllerStatus> {
        self.status_tx.subscribe()
    }

    /// 当前轨道协商出的能力集，CLOSED 时为空
    pub async fn capabilities(&self) -> Capabilities {
        self.inner.lock().await.caps
    }

    /// 按指定朝向打开流
    ///
    /// 已有流时先完整释放，再发起新的请求。
    /// 失败时返回 `DeviceUnavailable`，状态为 CLOSED，不自动重试。
    pub async fn start(&self, facing: Facing) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.facing = facing;
        self.reacquire(&mut inner).await
    }

    /// 切换前后镜头
    ///
    /// 朝向是"打开哪颗摄像头"的属性，只能通过完整的重新采集来切换。
    pub async fn switch_facing(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.facing = inner.facing.flipped();
        log::info!("switching camera to {}", inner.facing);
        self.reacquire(&mut inner).await
    }

    /// 设置 torch
    ///
    /// 能力集不含 torch (或者根本没有打开的轨道) 时返回 `CapabilityUnsupported`，
    /// 请求状态保持不变。轨道支持实时切换则原地应用，否则带着新状态重新采集。
    pub async fn set_illumination(&self, on: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if !inner.caps.has_torch() || inner.active.is_none() {
            return Err(SessionError::CapabilityUnsupported("torch"));
        }

        let previous = inner.torch_requested;
        if inner.caps.torch_requires_reopen() {
            inner.torch_requested = on;
            if let Err(e) = self.reacquire(&mut inner).await {
                inner.torch_requested = previous;
                self.publish(&inner, StreamState::Closed);
                return Err(e);
            }
        } else if let Some(active) = inner.active.as_ref() {
            active.controls.set_torch(on)?;
        }

        // 以硬件回读为准：驱动没有真正切换时，请求状态保持原样
        let actual = inner
            .active
            .as_ref()
            .map(|a| a.controls.torch())
            .transpose()?
            .unwrap_or(false);
        if actual != on {
            log::warn!("torch requested {} but hardware reports {}", on, actual);
            inner.torch_requested = previous;
            self.publish(&inner, StreamState::Open);
            return Err(SessionError::CapabilityUnsupported("torch"));
        }

        inner.torch_requested = on;
        log::info!("torch {}", if on { "on" } else { "off" });
        self.publish(&inner, StreamState::Open);
        Ok(())
    }

    /// 冻结当前帧为静帧 (原生尺寸)
    pub async fn capture(&self) -> Result<StillImage> {
        let mut inner = self.inner.lock().await;
        let active = inner.active.as_mut().ok_or(SessionError::NoActiveStream)?;

        let frame = active.stream.next_frame().await?;
        let still = StillImage::from_frame(&frame)?;
        log::info!(
            "captured frame #{} ({}x{}, {} bytes png)",
            frame.sequence,
            frame.width,
            frame.height,
            still.as_bytes().len()
        );
        Ok(still)
    }

    /// 下一帧实时预览
    pub async fn preview_frame(&self) -> Result<RgbImage> {
        let mut inner = self.inner.lock().await;
        let active = inner.active.as_mut().ok_or(SessionError::NoActiveStream)?;

        let frame = active.stream.next_frame().await?;
        imgcodecs::frame_to_rgb(&frame)
    }

    /// 释放流和底层硬件，重复调用无副作用
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(active) = inner.active.take() {
            active.release().await;
            log::info!("camera stopped");
        }
        inner.caps = Capabilities::empty();
        self.publish(&inner, StreamState::Closed);
    }

    /// 完整的 stop-and-reacquire
    /// 调用方必须持有 inner 锁
    async fn reacquire(&self, inner: &mut ControllerInner) -> Result<()> {
        // 1. 先释放旧流，保证任何时刻最多一条
        if let Some(old) = inner.active.take() {
            old.release().await;
        }
        inner.caps = Capabilities::empty();
        self.publish(inner, StreamState::Opening);

        // 2. 发起新的采集请求
        let config = self
            .base
            .clone()
            .facing(inner.facing)
            .torch(inner.torch_requested);
        let facing = inner.facing;

        let unavailable = |source| SessionError::DeviceUnavailable { facing, source };

        let (mut stream, controls) = match self.driver.open(&config).await {
            Ok(pair) => pair,
            Err(e) => {
                if e.is_unavailable() {
                    log::warn!("{} camera unavailable: {}", facing, e);
                } else {
                    log::error!("opening {} camera failed: {}", facing, e);
                }
                self.publish(inner, StreamState::Closed);
                return Err(unavailable(e));
            }
        };

        // 3. 启动采集；失败时 stream 在这里被 Drop，硬件随之释放
        if let Err(e) = stream.start().await {
            log::warn!("starting {} camera failed: {}", facing, e);
            self.publish(inner, StreamState::Closed);
            return Err(unavailable(e));
        }

        // 4. 重新查询能力集，把请求的 torch 状态应用到新轨道
        let caps = controls.capabilities();
        if caps.contains(Capabilities::TORCH | Capabilities::TORCH_LIVE) {
            if let Err(e) = controls.set_torch(inner.torch_requested) {
                log::warn!("applying torch to new track failed: {}", e);
                ActiveStream { stream, controls }.release().await;
                self.publish(inner, StreamState::Closed);
                return Err(unavailable(e));
            }
        }

        let (w, h) = stream.resolution();
        log::info!(
            "{} camera open: {} {}x{} caps={:?}",
            facing,
            stream.device().name,
            w,
            h,
            caps
        );

        inner.caps = caps;
        inner.active = Some(ActiveStream { stream, controls });
        self.publish(inner, StreamState::Open);
        Ok(())
    }

    fn publish(&self, inner: &ControllerInner, state: StreamState) {
        let resolution = inner.active.as_ref().map(|a| a.stream.resolution());
        self.status_tx.send_replace(ControllerStatus {
            state,
            facing: inner.facing,
            illumination_requested: inner.torch_requested,
            illumination_supported: inner.caps.has_torch(),
            resolution,
        });
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        // 无法在 Drop 里 await stop，直接 Drop 流即可释放硬件
        if let Some(active) = self.inner.get_mut().active.take() {
            log::debug!("releasing {} on teardown", active.stream.device().id);
        }
    }
}
