use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clothcap_core::error::{CameraError, Result};
use clothcap_core::traits::{Capabilities, DeviceControls};

use crate::probe::{SimEvent, SimProbe};
use crate::TorchSupport;

/// 仿真控制面
pub(crate) struct SimControls {
    pub(crate) device: String,
    pub(crate) torch_support: TorchSupport,
    pub(crate) jammed: bool,
    pub(crate) torch: Arc<AtomicBool>,
    pub(crate) probe: SimProbe,
}

impl DeviceControls for SimControls {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::ZOOM | Capabilities::FOCUS;
        match self.torch_support {
            TorchSupport::None => {}
            TorchSupport::OnOpen => caps |= Capabilities::TORCH,
            TorchSupport::Live => caps |= Capabilities::TORCH | Capabilities::TORCH_LIVE,
        }
        caps
    }

    fn set_torch(&self, on: bool) -> Result<()> {
        if self.torch_support != TorchSupport::Live {
            return Err(CameraError::ControlNotSupported("torch"));
        }
        if !self.jammed {
            self.torch.store(on, Ordering::SeqCst);
        }
        self.probe.record(SimEvent::TorchSet {
            device: self.device.clone(),
            on,
        });
        Ok(())
    }

    fn torch(&self) -> Result<bool> {
        Ok(self.torch.load(Ordering::SeqCst))
    }

    fn export_state(&self) -> Result<serde_json::Value> {
        use serde_json::json;

        Ok(json!({
            "backend": "simulation",
            "device": self.device,
            "torch": self.torch.load(Ordering::SeqCst),
            "capabilities": format!("{:?}", self.capabilities()),
        }))
    }
}
