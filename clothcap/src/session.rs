use std::future::Future;
use std::sync::Arc;

use clothcap_core::builder::Facing;
use clothcap_core::traits::Driver;

use crate::catalog::{Catalog, CatalogEntry, DocumentSink, ExportDocument};
use crate::config::SessionConfig;
use crate::draft::{DraftMetadata, PendingCapture};
use crate::error::{Result, SessionError};
use crate::imgcodecs::StillImage;
use crate::videoio::{CameraController, ControllerStatus};

/// 一次拍摄会话
///
/// 把操作员能看到的全部可变状态 (镜头、草稿、待提交静帧、已保存条目) 收拢到一个结构里，
/// 每个操作都是一次明确的状态转移。会话结束时目录随之销毁，不做持久化。
///
/// 摄像头操作返回的 Future 不借用会话：采集进行中，表单和目录照常可改。
pub struct CaptureSession {
    controller: Arc<CameraController>,
    config: SessionConfig,
    draft: DraftMetadata,
    pending: PendingCapture,
    catalog: Catalog,
}

impl CaptureSession {
    pub fn new(driver: Arc<dyn Driver>, config: SessionConfig) -> Self {
        let controller = Arc::new(CameraController::new(driver, config.camera_config()));
        Self {
            controller,
            config,
            draft: DraftMetadata::new(),
            pending: PendingCapture::new(),
            catalog: Catalog::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    pub fn status(&self) -> ControllerStatus {
        self.controller.status()
    }

    // --- 摄像头 ---

    /// 按配置里的初始朝向打开摄像头
    pub fn start_camera(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        self.start_facing(self.config.initial_facing)
    }

    pub fn start_facing(&self, facing: Facing) -> impl Future<Output = Result<()>> + Send + 'static {
        let controller = self.controller.clone();
        async move { controller.start(facing).await }
    }

    pub fn switch_camera(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let controller = self.controller.clone();
        async move { controller.switch_facing().await }
    }

    pub fn set_torch(&self, on: bool) -> impl Future<Output = Result<()>> + Send + 'static {
        let controller = self.controller.clone();
        async move { controller.set_illumination(on).await }
    }

    /// 翻转 torch 请求状态 (以调用时的状态为准)
    pub fn toggle_torch(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        self.set_torch(!self.controller.status().illumination_requested)
    }

    pub fn stop_camera(&self) -> impl Future<Output = ()> + Send + 'static {
        let controller = self.controller.clone();
        async move { controller.stop().await }
    }

    /// 拍照：成功后替换待提交静帧；失败时原有静帧保持不变
    ///
    /// 关闭摄像头不会清空待提交静帧，操作员仍然可以把它保存为条目。
    pub async fn capture_photo(&mut self) -> Result<&StillImage> {
        let still = self.controller.capture().await?;
        if !self.pending.is_empty() {
            log::debug!("replacing uncommitted capture");
        }
        Ok(self.pending.replace(still))
    }

    // --- 草稿 ---

    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        self.draft.set_field(field, value)
    }

    pub fn draft(&self) -> &DraftMetadata {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftMetadata {
        &mut self.draft
    }

    pub fn pending(&self) -> Option<&StillImage> {
        self.pending.image()
    }

    pub fn discard_capture(&mut self) {
        self.pending.discard();
    }

    // --- 目录 ---

    /// 保存当前草稿和静帧为一个条目，然后清空两者
    pub fn save_entry(&mut self) -> &CatalogEntry {
        self.catalog.commit(&mut self.draft, &mut self.pending)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 序列化目录并交给 sink，不修改目录
    pub fn export(&self, sink: &dyn DocumentSink) -> Result<ExportDocument> {
        let doc = self
            .catalog
            .export_document(&self.config.export_file_name)?;
        sink.deliver(&doc).map_err(SessionError::Delivery)?;
        log::info!(
            "exported {} entries as {}",
            self.catalog.len(),
            doc.file_name
        );
        Ok(doc)
    }

    /// 结束会话：释放摄像头并返回目录
    pub async fn close(self) -> Catalog {
        self.controller.stop().await;
        let Self { catalog, .. } = self;
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemorySink;
    use crate::draft::Brand;
    use crate::videoio::StreamState;
    use anyhow::anyhow;
    use clothcap_simulation::SimDriver;

    struct FailingSink;

    impl DocumentSink for FailingSink {
        fn deliver(&self, _doc: &ExportDocument) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    fn session() -> CaptureSession {
        CaptureSession::new(Arc::new(SimDriver::phone()), SessionConfig::default())
    }

    #[tokio::test]
    async fn toggle_flips_requested_state() {
        let s = session();
        s.start_camera().await.unwrap();

        s.toggle_torch().await.unwrap();
        assert!(s.status().illumination_requested);
        s.toggle_torch().await.unwrap();
        assert!(!s.status().illumination_requested);
    }

    #[tokio::test]
    async fn stopping_camera_keeps_pending_still() {
        let mut s = session();
        s.start_camera().await.unwrap();
        s.capture_photo().await.unwrap();
        let before = s.pending().cloned();

        s.stop_camera().await;
        assert!(matches!(
            s.capture_photo().await,
            Err(SessionError::NoActiveStream)
        ));
        assert_eq!(s.pending().cloned(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn form_stays_editable_while_opening() {
        let driver = SimDriver::phone();
        driver.set_open_latency(std::time::Duration::from_millis(50));
        let mut s = CaptureSession::new(Arc::new(driver), SessionConfig::default());

        let opening = s.start_camera();
        let (started, saved) = tokio::join!(opening, async {
            assert_eq!(s.status().state, StreamState::Opening);
            s.set_field("brand", "Nike").unwrap();
            s.set_field("supplierId", "S7").unwrap();
            s.save_entry().clone()
        });

        started.unwrap();
        assert_eq!(saved.brand, Some(Brand::Nike));
        assert_eq!(s.catalog().len(), 1);
        assert_eq!(s.status().state, StreamState::Open);
    }

    #[tokio::test]
    async fn discard_clears_pending_only() {
        let mut s = session();
        s.start_camera().await.unwrap();
        s.set_field("brand", "Adidas").unwrap();
        s.capture_photo().await.unwrap();

        s.discard_capture();
        assert!(s.pending().is_none());
        assert!(!s.draft().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_reported() {
        let mut s = session();
        s.save_entry();

        let err = s.export(&FailingSink).unwrap_err();
        assert!(matches!(err, SessionError::Delivery(_)));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(s.catalog().len(), 1);

        let sink = MemorySink::new();
        let doc = s.export(&sink).unwrap();
        assert_eq!(doc.file_name, "clothing-data.json");
        assert_eq!(sink.delivered(), vec![doc]);
    }

    #[tokio::test]
    async fn close_releases_camera() {
        let driver = SimDriver::phone();
        let probe = driver.probe();
        let mut s = CaptureSession::new(Arc::new(driver), SessionConfig::default());
        s.start_camera().await.unwrap();
        s.save_entry();

        let catalog = s.close().await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(probe.open_streams(), 0);
    }
}
