//! 草稿：尚未提交的元数据与静帧
//!
//! 表单只能产生固定集合内的取值，空字符串表示"未选择"。
//! 这里不做完整性校验，允许提交任意字段为空的条目。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::imgcodecs::StillImage;

/// 定义固定取值集合的枚举，字符串形式即表单 option 的 value
macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(format!(
                        "{:?} is not one of {:?}",
                        other,
                        $name::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>()
                    )),
                }
            }
        }
    };
}

closed_set!(
    /// 品牌
    Brand { Nike, Adidas }
);

closed_set!(
    /// 尺码
    Size { S, M, L }
);

closed_set!(
    /// 性别/年龄段
    GenderAge { Men, Women, Kids }
);

/// 草稿元数据 (表单协作方的状态快照)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftMetadata {
    pub brand: Option<Brand>,
    pub size: Option<Size>,
    pub gender_age: Option<GenderAge>,
    pub supplier_id: Option<String>,
}

/// 空字符串 = 未选择
fn parse_choice<T: FromStr>(field: &str, value: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| SessionError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        })
}

impl DraftMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按表单字段名更新一个字段
    ///
    /// 字段名与导出文档一致：`brand`、`size`、`genderAge`、`supplierId`。
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "brand" => self.brand = parse_choice(field, value)?,
            "size" => self.size = parse_choice(field, value)?,
            "genderAge" => self.gender_age = parse_choice(field, value)?,
            "supplierId" => {
                self.supplier_id = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {
                return Err(SessionError::InvalidField {
                    field: field.to_string(),
                    value: value.to_string(),
                })
            }
        }
        Ok(())
    }

    /// 所有字段回到未选择
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 待提交的静帧
///
/// 每次成功 capture 整体替换；提交或丢弃时清空。
#[derive(Debug, Clone, Default)]
pub struct PendingCapture {
    image: Option<StillImage>,
}

impl PendingCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&StillImage> {
        self.image.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    /// 替换为新的静帧，丢弃旧的未提交静帧
    pub fn replace(&mut self, image: StillImage) -> &StillImage {
        self.image.insert(image)
    }

    pub fn take(&mut self) -> Option<StillImage> {
        self.image.take()
    }

    pub fn discard(&mut self) {
        self.image = None;
    }
}
