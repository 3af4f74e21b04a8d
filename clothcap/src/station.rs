use std::sync::Arc;

use clothcap_core::builder::Facing;
use clothcap_core::error::CameraError;
use clothcap_core::traits::Driver;
use image::RgbImage;

use crate::catalog::{Catalog, CatalogEntry, DocumentSink, ExportDocument};
use crate::config::SessionConfig;
use crate::draft::DraftMetadata;
use crate::error::Result;
use crate::imgcodecs::StillImage;
use crate::internal::runtime;
use crate::session::CaptureSession;
use crate::videoio::{backend, ControllerStatus};

/// 同步版本的拍摄台
///
/// 内部在后台 Runtime 上驱动 `CaptureSession`，
/// 适合没有异步运行时的宿主 (GUI 事件循环、脚本)。不能在 tokio 上下文里调用。
pub struct CaptureStation {
    session: CaptureSession,
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    runtime::block_on(future).map_err(|e| CameraError::Io(e).into())
}

impl CaptureStation {
    pub fn new(driver: Arc<dyn Driver>, config: SessionConfig) -> Self {
        Self {
            session: CaptureSession::new(driver, config),
        }
    }

    /// 使用自动选择的后端
    pub fn open_default(config: SessionConfig) -> anyhow::Result<Self> {
        let (kind, driver) = backend::create_driver()?;
        log::info!("capture station on {:?} backend", kind);
        Ok(Self::new(driver, config))
    }

    pub fn status(&self) -> ControllerStatus {
        self.session.status()
    }

    pub fn start(&self) -> Result<()> {
        block_on(self.session.start_camera())?
    }

    pub fn start_facing(&self, facing: Facing) -> Result<()> {
        block_on(self.session.start_facing(facing))?
    }

    pub fn switch_camera(&self) -> Result<()> {
        block_on(self.session.switch_camera())?
    }

    pub fn set_torch(&self, on: bool) -> Result<()> {
        block_on(self.session.set_torch(on))?
    }

    pub fn toggle_torch(&self) -> Result<()> {
        block_on(self.session.toggle_torch())?
    }

    pub fn preview(&self) -> Result<RgbImage> {
        block_on(self.session.controller().preview_frame())?
    }

    pub fn capture(&mut self) -> Result<&StillImage> {
        block_on(self.session.capture_photo())?
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        self.session.set_field(field, value)
    }

    pub fn draft(&self) -> &DraftMetadata {
        self.session.draft()
    }

    pub fn pending(&self) -> Option<&StillImage> {
        self.session.pending()
    }

    pub fn discard(&mut self) {
        self.session.discard_capture()
    }

    pub fn save(&mut self) -> &CatalogEntry {
        self.session.save_entry()
    }

    pub fn catalog(&self) -> &Catalog {
        self.session.catalog()
    }

    pub fn export(&self, sink: &dyn DocumentSink) -> Result<ExportDocument> {
        self.session.export(sink)
    }

    pub fn stop(&self) -> Result<()> {
        block_on(self.session.stop_camera())
    }

    pub fn close(self) -> Result<Catalog> {
        block_on(self.session.close())
    }
}
