//! 二进制文件读取器

use super::code::CodeDecodeError;
use super::header::{FileHeader, HeaderError, HEADER_SIZE};
use super::section::{SectionDirectory, SectionEntry, SectionError, SectionKind};

/// 二进制读取器，借用原始数据
pub struct BinaryReader<'a> {
    /// 原始数据
    data: &'a [u8],
    /// 文件头
    header: FileHeader,
    /// Section directory
    sections: SectionDirectory,
}

/// 读取错误
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// 文件头错误
    Header(HeaderError),
    /// Section 错误
    Section(SectionError),
    /// 指令解码错误
    Code(CodeDecodeError),
    /// 数据太短
    TooShort,
    /// 无效的偏移
    InvalidOffset,
    /// Section 未找到
    SectionNotFound(SectionKind),
    /// 表内容与模块其余部分不一致
    Inconsistent(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Header(e) => write!(f, "Header error: {}", e),
            ReadError::Section(e) => write!(f, "Section error: {}", e),
            ReadError::Code(e) => write!(f, "Code error: {}", e),
            ReadError::TooShort => write!(f, "Data too short"),
            ReadError::InvalidOffset => write!(f, "Invalid offset"),
            ReadError::SectionNotFound(k) => write!(f, "Section not found: {:?}", k),
            ReadError::Inconsistent(msg) => write!(f, "Inconsistent module: {}", msg),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Header(e) => Some(e),
            ReadError::Section(e) => Some(e),
            ReadError::Code(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeaderError> for ReadError {
    fn from(e: HeaderError) -> Self {
        ReadError::Header(e)
    }
}

impl From<SectionError> for ReadError {
    fn from(e: SectionError) -> Self {
        ReadError::Section(e)
    }
}

impl From<CodeDecodeError> for ReadError {
    fn from(e: CodeDecodeError) -> Self {
        ReadError::Code(e)
    }
}

impl<'a> BinaryReader<'a> {
    /// 从字节数组创建读取器，校验文件头与 section 边界
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, ReadError> {
        if data.len() < HEADER_SIZE {
            return Err(ReadError::TooShort);
        }

        let header = FileHeader::from_bytes(&data[..HEADER_SIZE])?;
        header.validate()?;

        let dir_start = header.section_dir_offset as usize;
        let dir_end = dir_start + header.section_dir_size as usize;
        if dir_start < HEADER_SIZE || dir_end > data.len() {
            return Err(ReadError::InvalidOffset);
        }

        let sections = SectionDirectory::from_bytes(&data[dir_start..dir_end])?;
        if sections.count() != header.section_count as usize {
            return Err(ReadError::Inconsistent(format!(
                "header declares {} sections, directory has {}",
                header.section_count,
                sections.count()
            )));
        }
        if sections.entries.iter().any(|e| e.end() > dir_start as u64) {
            return Err(ReadError::InvalidOffset);
        }

        Ok(Self {
            data,
            header,
            sections,
        })
    }

    /// 获取文件头
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// 获取 section directory
    pub fn sections(&self) -> &SectionDirectory {
        &self.sections
    }

    /// 获取所有 section 条目
    pub fn section_entries(&self) -> &[SectionEntry] {
        &self.sections.entries
    }

    /// 读取 section 原始数据
    pub fn read_section(&self, kind: SectionKind) -> Result<&'a [u8], ReadError> {
        let entry = self
            .sections
            .find(kind)
            .ok_or(ReadError::SectionNotFound(kind))?;
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        self.data.get(start..end).ok_or(ReadError::InvalidOffset)
    }

    /// 检查 section 是否存在
    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections.find(kind).is_some()
    }

    /// 原始数据长度
    pub fn total_size(&self) -> usize {
        self.data.len()
    }
}
