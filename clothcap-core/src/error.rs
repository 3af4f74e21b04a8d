use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    /// 没有任何设备满足请求 (例如请求后置摄像头，但只有前置)
    #[error("No camera matches the request: {0}")]
    NotFound(String),

    /// 操作系统或用户拒绝了设备访问
    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Device busy: Exclusive access required")]
    DeviceBusy,

    #[error("Format negotiation failed: No hardware support for requested constraints")]
    FormatNotSupported,

    /// 当前轨道不支持该硬件控制 (如 torch)
    #[error("Control not supported by this track: {0}")]
    ControlNotSupported(&'static str),

    #[error("Simulation backend error: {0}")]
    SimulationError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// 是否属于"设备不可用"一类错误 (打开阶段的失败)
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::PermissionDenied(_) | Self::DeviceBusy | Self::Disconnected(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CameraError>;
