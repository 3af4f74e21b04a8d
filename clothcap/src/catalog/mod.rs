pub mod sink;

use serde::{Deserialize, Serialize};

use crate::draft::{Brand, DraftMetadata, GenderAge, PendingCapture, Size};
use crate::error::Result;
use crate::imgcodecs::StillImage;

pub use sink::{DirectorySink, DocumentSink, MemorySink};

/// 导出文件的默认名称
pub const DEFAULT_EXPORT_NAME: &str = "clothing-data.json";
pub const EXPORT_MEDIA_TYPE: &str = "application/json";

/// 目录中的一个条目
///
/// 追加后不可修改：Catalog 只对外提供共享引用。
/// 序列化形状即导出文档的形状：未选择的字段是 `""`，没有图片是 `null`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogEntry {
    #[serde(with = "blank")]
    pub brand: Option<Brand>,
    #[serde(with = "blank")]
    pub size: Option<Size>,
    #[serde(with = "blank")]
    pub gender_age: Option<GenderAge>,
    #[serde(with = "blank")]
    pub supplier_id: Option<String>,
    pub image: Option<StillImage>,
}

impl CatalogEntry {
    /// 空的 supplier_id 与未填写等价，统一为 None
    pub fn new(metadata: DraftMetadata, image: Option<StillImage>) -> Self {
        Self {
            brand: metadata.brand,
            size: metadata.size,
            gender_age: metadata.gender_age,
            supplier_id: metadata.supplier_id.filter(|s| !s.is_empty()),
            image,
        }
    }
}

/// `Option<T>` <-> 字符串，`None` 对应空字符串
mod blank {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Display,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some).map_err(de::Error::custom)
    }
}

/// 一份待交付的导出文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// 会话目录：只追加，顺序即保存顺序
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提交草稿
    ///
    /// 用当前元数据和待提交静帧构造条目并追加，然后清空草稿与静帧。
    /// 不做完整性校验，没有图片的条目同样允许。
    pub fn commit(&mut self, draft: &mut DraftMetadata, pending: &mut PendingCapture) -> &CatalogEntry {
        let entry = CatalogEntry::new(std::mem::take(draft), pending.take());
        if entry.image.is_none() {
            log::warn!("committing catalog entry #{} without an image", self.entries.len() + 1);
        }
        self.entries.push(entry);
        log::info!("catalog now holds {} entries", self.entries.len());
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 序列化全部条目 (保持插入顺序)，不修改目录
    pub fn export_document(&self, file_name: &str) -> Result<ExportDocument> {
        let bytes = serde_json::to_vec(&self.entries)?;
        log::debug!("exported {} entries into {} bytes", self.entries.len(), bytes.len());
        Ok(ExportDocument {
            file_name: file_name.to_string(),
            media_type: EXPORT_MEDIA_TYPE,
            bytes,
        })
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// 解析导出文档
pub fn parse_document(bytes: &[u8]) -> Result<Vec<CatalogEntry>> {
    Ok(serde_json::from_slice(bytes)?)
}
