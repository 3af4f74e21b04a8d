use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::ExportDocument;

/// 交付机制：把导出文档交给宿主环境保存
pub trait DocumentSink: Send + Sync {
    fn deliver(&self, doc: &ExportDocument) -> Result<()>;
}

/// 写入到目录 (桌面宿主的"下载")
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, doc: &ExportDocument) -> PathBuf {
        self.dir.join(&doc.file_name)
    }
}

impl DocumentSink for DirectorySink {
    fn deliver(&self, doc: &ExportDocument) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(doc);
        fs::write(&path, &doc.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("delivered {} ({} bytes)", path.display(), doc.bytes.len());
        Ok(())
    }
}

/// 保存在内存里，交给宿主自行处理 (例如通过 IPC 发给 UI 层)
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<ExportDocument>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<ExportDocument> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl DocumentSink for MemorySink {
    fn deliver(&self, doc: &ExportDocument) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EXPORT_MEDIA_TYPE;

    fn doc() -> ExportDocument {
        ExportDocument {
            file_name: "clothing-data.json".into(),
            media_type: EXPORT_MEDIA_TYPE,
            bytes: b"[]".to_vec(),
        }
    }

    #[test]
    fn directory_sink_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("exports"));

        sink.deliver(&doc()).unwrap();

        let written = fs::read(tmp.path().join("exports/clothing-data.json")).unwrap();
        assert_eq!(written, b"[]");
    }

    #[test]
    fn directory_sink_reports_unwritable_target() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = DirectorySink::new(&blocker).deliver(&doc()).unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }

    #[test]
    fn memory_sink_keeps_documents() {
        let sink = MemorySink::new();
        sink.deliver(&doc()).unwrap();
        sink.deliver(&doc()).unwrap();
        assert_eq!(sink.delivered().len(), 2);
    }
}
