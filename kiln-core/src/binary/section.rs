//! Section 定义和管理
//!
//! Section Directory 位于文件末尾，记录每个 section 的偏移和大小

/// Section 类型
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// 字符串池
    StringPool = 0x01,
    /// 类型信息
    TypeInfo = 0x02,
    /// 字段表
    FieldTable = 0x03,
    /// 构造器表
    ConstructorTable = 0x04,
    /// 方法表
    MethodTable = 0x05,
    /// 指令数据
    CodeData = 0x06,
}

impl SectionKind {
    /// 从 u8 转换
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(SectionKind::StringPool),
            0x02 => Some(SectionKind::TypeInfo),
            0x03 => Some(SectionKind::FieldTable),
            0x04 => Some(SectionKind::ConstructorTable),
            0x05 => Some(SectionKind::MethodTable),
            0x06 => Some(SectionKind::CodeData),
            _ => None,
        }
    }
}

/// Section Directory 条目 (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    /// Section 类型 (1 byte)
    pub kind: SectionKind,
    /// 对齐填充 (1 byte)
    pub padding: u8,
    /// 标志 (2 bytes)，当前未使用
    pub flags: u16,
    /// 在文件中的偏移 (4 bytes)
    pub offset: u32,
    /// 数据大小 (4 bytes)
    pub size: u32,
    /// 预留 (4 bytes)
    pub reserved: u32,
}

impl SectionEntry {
    /// 条目大小: 16 bytes
    pub const ENTRY_SIZE: usize = 16;

    /// 创建新的 section 条目
    pub fn new(kind: SectionKind, offset: u32, size: u32) -> Self {
        Self {
            kind,
            padding: 0,
            flags: 0,
            offset,
            size,
            reserved: 0,
        }
    }

    /// 序列化为字节数组
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0] = self.kind as u8;
        bytes[1] = self.padding;
        bytes[2..4].copy_from_slice(&self.flags.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.offset.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.size.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    /// 从字节数组反序列化
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() < 16 {
            return Err(SectionError::TooShort);
        }

        let kind = SectionKind::from_u8(bytes[0]).ok_or(SectionError::InvalidKind(bytes[0]))?;

        Ok(Self {
            kind,
            padding: bytes[1],
            flags: u16::from_le_bytes([bytes[2], bytes[3]]),
            offset: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            size: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            reserved: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    /// 数据结束位置
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}

/// Section Directory
#[derive(Debug, Clone, Default)]
pub struct SectionDirectory {
    /// Section 条目列表
    pub entries: Vec<SectionEntry>,
}

impl SectionDirectory {
    /// 创建空的 Section Directory
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 添加 section 条目
    pub fn add(&mut self, entry: SectionEntry) {
        self.entries.push(entry);
    }

    /// 查找指定类型的 section
    pub fn find(&self, kind: SectionKind) -> Option<&SectionEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// 获取 section 数量
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// 计算序列化后的大小
    pub fn serialized_size(&self) -> usize {
        self.entries.len() * SectionEntry::ENTRY_SIZE
    }

    /// 序列化为字节数组
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes
    }

    /// 从字节数组反序列化
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() % SectionEntry::ENTRY_SIZE != 0 {
            return Err(SectionError::InvalidSize);
        }

        let entries = bytes
            .chunks_exact(SectionEntry::ENTRY_SIZE)
            .map(SectionEntry::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }
}

/// Section 错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    /// 数据太短
    TooShort,
    /// 无效的 section 类型
    InvalidKind(u8),
    /// 无效的数据大小
    InvalidSize,
    /// 无效的类型码
    InvalidTypeCode(u8),
    /// 无效的可见性
    InvalidVisibility(u8),
    /// 字符串索引越界或不是合法 UTF-8
    InvalidStringIndex(u32),
    /// 解析完毕后仍有多余字节
    TrailingBytes(usize),
}

impl std::fmt::Display for SectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionError::TooShort => write!(f, "Section data too short"),
            SectionError::InvalidKind(k) => write!(f, "Invalid section kind: {}", k),
            SectionError::InvalidSize => write!(f, "Invalid section data size"),
            SectionError::InvalidTypeCode(c) => write!(f, "Invalid type code: {}", c),
            SectionError::InvalidVisibility(v) => write!(f, "Invalid visibility: {}", v),
            SectionError::InvalidStringIndex(i) => write!(f, "Invalid string index: {}", i),
            SectionError::TrailingBytes(n) => write!(f, "{} trailing byte(s) in section", n),
        }
    }
}

impl std::error::Error for SectionError {}

/// Section 数据 trait
///
/// 所有 section 数据类型需要实现这个 trait 来支持序列化和反序列化
pub trait SectionData: Sized {
    /// 序列化为字节数组
    fn serialize(&self) -> Vec<u8>;
    /// 从字节数组反序列化
    fn deserialize(bytes: &[u8]) -> Result<Self, SectionError>;
    /// 获取 section 类型
    fn section_kind() -> SectionKind;
}
