use std::io;
use std::sync::OnceLock;

use tokio::runtime::Runtime;

// 全局单例 Runtime
static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// 获取全局 Runtime，如果不存在则创建
/// 这允许宿主不写 #[tokio::main] 也能驱动异步的摄像头会话
pub fn get_runtime() -> io::Result<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2) // 只有设备 I/O 和编码，2 个线程足够
        .thread_name("clothcap-bg-worker")
        .build()?;
    // 并发初始化时只保留先到的那个，后到的被丢弃
    Ok(RUNTIME.get_or_init(|| rt))
}

/// 在后台 Runtime 上运行 Future 并阻塞等待结果
///
/// 不能在异步上下文里调用。
pub fn block_on<F: std::future::Future>(future: F) -> io::Result<F::Output> {
    Ok(get_runtime()?.block_on(future))
}
