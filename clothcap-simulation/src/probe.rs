use std::sync::{Arc, Mutex, MutexGuard};

use clothcap_core::builder::Facing;

/// 仿真设备上发生过的硬件事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// 一条流被成功采集
    Opened {
        device: String,
        facing: Facing,
        torch: bool,
    },
    /// 采集被拒绝 (无设备或无权限)
    Rejected { facing: Facing },
    /// 一条流被释放 (Drop)
    Closed { device: String },
    /// torch 在运行中的轨道上被切换
    TorchSet { device: String, on: bool },
}

#[derive(Debug, Default)]
struct ProbeState {
    open_now: usize,
    peak_open: usize,
    events: Vec<SimEvent>,
}

/// 观测探针
///
/// 与 SimDriver 共享，测试通过它断言"任意时刻最多一条打开的流"。
#[derive(Debug, Clone, Default)]
pub struct SimProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl SimProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ProbeState> {
        // 测试线程 panic 导致的中毒不影响计数本身
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn record_open(&self, device: &str, facing: Facing, torch: bool) {
        let mut state = self.state();
        state.open_now += 1;
        state.peak_open = state.peak_open.max(state.open_now);
        state.events.push(SimEvent::Opened {
            device: device.to_string(),
            facing,
            torch,
        });
    }

    pub(crate) fn record_close(&self, device: &str) {
        let mut state = self.state();
        state.open_now = state.open_now.saturating_sub(1);
        state.events.push(SimEvent::Closed {
            device: device.to_string(),
        });
    }

    pub(crate) fn record(&self, event: SimEvent) {
        self.state().events.push(event);
    }

    /// 当前打开的流数量
    pub fn open_streams(&self) -> usize {
        self.state().open_now
    }

    /// 历史上同时打开的流的峰值
    pub fn peak_open_streams(&self) -> usize {
        self.state().peak_open
    }

    /// 成功采集的总次数
    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, SimEvent::Opened { .. }))
    }

    /// 释放的总次数
    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, SimEvent::Closed { .. }))
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.state().events.clone()
    }

    /// 清空事件记录 (不影响 open_now)
    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.state().events.iter().filter(|e| pred(e)).count()
    }
}
