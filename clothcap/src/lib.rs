//! 服装拍照建档
//!
//! 打开一颗摄像头 (前置/后置，可选补光灯)，给衣物拍照，填写品牌/尺码/人群/供应商编号，
//! 保存为条目，最后把整个目录导出成一个 JSON 文档。

pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod imgcodecs;
pub(crate) mod internal;
pub mod session;
pub mod station;
pub mod videoio;

pub use clothcap_core::builder::Facing;
pub use clothcap_core::traits::Capabilities;

/// 预置模块，宿主可以通过 `use clothcap::prelude::*;` 导入常用项
pub mod prelude {
    pub use crate::catalog::{
        parse_document, Catalog, CatalogEntry, DirectorySink, DocumentSink, ExportDocument,
        MemorySink,
    };
    pub use crate::config::SessionConfig;
    pub use crate::draft::{Brand, DraftMetadata, GenderAge, Size};
    pub use crate::error::SessionError;
    pub use crate::imgcodecs::StillImage;
    pub use crate::session::CaptureSession;
    pub use crate::station::CaptureStation;
    pub use crate::videoio::{CameraController, ControllerStatus, StreamState};
    pub use clothcap_core::builder::Facing;
}
