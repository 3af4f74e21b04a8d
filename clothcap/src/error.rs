use clothcap_core::builder::Facing;
use clothcap_core::error::CameraError;
use thiserror::Error;

/// 面向操作员的错误
///
/// 所有错误都同步返回给触发它的操作，不会被吞掉，也不会自动重试。
/// 没有哪种错误会终结整个会话，操作员总是可以重新 start。
#[derive(Error, Debug)]
pub enum SessionError {
    /// 没有匹配朝向的摄像头，或者权限被拒绝
    /// 流保持 CLOSED，需要操作员手动重试
    #[error("{facing} camera unavailable: {source}")]
    DeviceUnavailable {
        facing: Facing,
        #[source]
        source: CameraError,
    },

    /// 当前轨道不具备所请求的硬件控制
    #[error("{0} control is not supported by the current camera")]
    CapabilityUnsupported(&'static str),

    /// 没有打开的流 (capture / preview 只在 OPEN 状态有效)
    #[error("No active camera stream")]
    NoActiveStream,

    /// 表单字段名或取值不在固定集合内
    #[error("Invalid value {value:?} for field {field:?}")]
    InvalidField { field: String, value: String },

    /// 运行中的流出错 (读帧失败等)
    #[error("Camera error: {0}")]
    Device(#[from] CameraError),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Malformed image data URI: {0}")]
    DataUri(String),

    #[error("Export document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Delivery failed: {0:#}")]
    Delivery(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
