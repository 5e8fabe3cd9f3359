//! Section 数据结构
//!
//! - String Pool: 全局字符串去重存储
//! - 类型编码: 8 字节，类型码 + 具名类型的名字索引
//! - [`ByteCursor`]: 表解析用的小端读取游标

use super::section::{SectionData, SectionError, SectionKind};
use crate::value::{TypeTag, Visibility};

// ==================== String Pool ====================

/// 字符串池
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPool {
    /// 字符串数据（每个字符串后跟一个 null）
    data: Vec<u8>,
    /// 字符串偏移映射：索引 -> 偏移
    offsets: Vec<u32>,
}

impl StringPool {
    /// 创建空的字符串池
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// 添加字符串，返回索引；已存在时返回原索引
    pub fn add(&mut self, s: &str) -> u32 {
        let bytes = s.as_bytes();

        for idx in 0..self.offsets.len() {
            if self.bytes_of(idx) == Some(bytes) {
                return idx as u32;
            }
        }

        let idx = self.offsets.len() as u32;
        self.offsets.push(self.data.len() as u32);
        self.data.extend_from_slice(bytes);
        self.data.push(0); // null 终止

        idx
    }

    /// 获取字符串
    pub fn get(&self, idx: u32) -> Option<&str> {
        std::str::from_utf8(self.bytes_of(idx as usize)?).ok()
    }

    /// 获取字符串，越界时报错
    pub fn resolve(&self, idx: u32) -> Result<&str, SectionError> {
        self.get(idx).ok_or(SectionError::InvalidStringIndex(idx))
    }

    /// 第 `idx` 个字符串的字节，不含终止符
    ///
    /// 字符串的边界由相邻偏移决定，而不是第一个 `\0`，字符串本身可以包含 `\0`。
    fn bytes_of(&self, idx: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(idx)? as usize;
        let end = match self.offsets.get(idx + 1) {
            Some(&next) => next as usize,
            None => self.data.len(),
        };
        // 每个字符串至少占一个终止符
        if start >= end || end > self.data.len() {
            return None;
        }
        Some(&self.data[start..end - 1])
    }

    /// 获取字符串数量
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionData for StringPool {
    fn serialize(&self) -> Vec<u8> {
        // 格式：
        // - count: u32 (字符串数量)
        // - offsets: [u32; count] (偏移数组)
        // - data_len: u32 (数据长度)
        // - data: [u8; data_len] (字符串数据)
        let mut result = Vec::with_capacity(8 + self.offsets.len() * 4 + self.data.len());

        result.extend_from_slice(&(self.offsets.len() as u32).to_le_bytes());
        for &offset in &self.offsets {
            result.extend_from_slice(&offset.to_le_bytes());
        }
        result.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        result.extend_from_slice(&self.data);

        result
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, SectionError> {
        let mut cursor = ByteCursor::new(bytes);

        let count = cursor.u32()? as usize;
        let mut offsets = Vec::with_capacity(count.min(bytes.len() / 4));
        for _ in 0..count {
            offsets.push(cursor.u32()?);
        }

        let data_len = cursor.u32()? as usize;
        let data = cursor.take(data_len)?.to_vec();
        cursor.finish()?;

        // 偏移从 0 开始严格递增，每段以终止符结尾，数据恰好被覆盖
        let mut expected_start = 0usize;
        for (i, &offset) in offsets.iter().enumerate() {
            let start = offset as usize;
            let end = match offsets.get(i + 1) {
                Some(&next) => next as usize,
                None => data.len(),
            };
            if start != expected_start || start >= end || end > data.len() || data[end - 1] != 0 {
                return Err(SectionError::InvalidSize);
            }
            expected_start = end;
        }
        if expected_start != data.len() {
            return Err(SectionError::InvalidSize);
        }

        Ok(Self { data, offsets })
    }

    fn section_kind() -> SectionKind {
        SectionKind::StringPool
    }
}

// ==================== 类型编码 ====================

/// 编码后的类型大小
pub const TYPE_SIZE: usize = 8;

/// 具名类型以外的类型不带名字
const NO_NAME: u32 = u32::MAX;

/// 写入类型：code u8, padding [u8; 3], name index u32
pub fn write_type(out: &mut Vec<u8>, ty: &TypeTag, pool: &mut StringPool) {
    let name_idx = match ty {
        TypeTag::Named(name) => pool.add(name),
        _ => NO_NAME,
    };
    out.push(ty.code());
    out.extend_from_slice(&[0u8; 3]);
    out.extend_from_slice(&name_idx.to_le_bytes());
}

/// 读取类型
pub fn read_type(cursor: &mut ByteCursor<'_>, pool: &StringPool) -> Result<TypeTag, SectionError> {
    let code = cursor.u8()?;
    cursor.skip(3)?;
    let name_idx = cursor.u32()?;

    let name = if name_idx == NO_NAME {
        None
    } else {
        Some(pool.resolve(name_idx)?)
    };
    TypeTag::from_code(code, name).ok_or(SectionError::InvalidTypeCode(code))
}

/// 读取可见性
pub fn read_visibility(cursor: &mut ByteCursor<'_>) -> Result<Visibility, SectionError> {
    let raw = cursor.u8()?;
    Visibility::from_u8(raw).ok_or(SectionError::InvalidVisibility(raw))
}

// ==================== ByteCursor ====================

/// 小端读取游标
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], SectionError> {
        if self.remaining() < n {
            return Err(SectionError::TooShort);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), SectionError> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, SectionError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, SectionError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, SectionError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32, SectionError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// 要求数据已全部消费
    pub fn finish(&self) -> Result<(), SectionError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SectionError::TrailingBytes(n)),
        }
    }
}
