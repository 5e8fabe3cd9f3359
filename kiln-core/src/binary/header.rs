//! 文件头定义
//!
//! 32 字节定长文件头，不含时间戳等可变字段，保证同一描述生成的字节完全一致。
//!
//! ```text
//! 0..4    magic "KILN"
//! 4..7    version major/minor/patch
//! 7       reserved
//! 8..12   flags (u32)
//! 12..14  section count (u16)
//! 14..16  reserved
//! 16..20  section directory offset (u32)
//! 20..24  section directory size (u32)
//! 24..32  reserved
//! ```

/// 魔数
pub const MAGIC: [u8; 4] = *b"KILN";

/// 文件头大小
pub const HEADER_SIZE: usize = 32;

/// 当前格式版本；主版本不同即不兼容
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;
pub const VERSION_PATCH: u8 = 0;

/// 文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version_major: u8,
    pub version_minor: u8,
    pub version_patch: u8,
    pub flags: u32,
    pub section_count: u16,
    pub section_dir_offset: u32,
    pub section_dir_size: u32,
}

impl FileHeader {
    /// 当前版本的空文件头
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            version_patch: VERSION_PATCH,
            flags: 0,
            section_count: 0,
            section_dir_offset: 0,
            section_dir_size: 0,
        }
    }

    pub fn version(&self) -> (u8, u8, u8) {
        (self.version_major, self.version_minor, self.version_patch)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version_major;
        bytes[5] = self.version_minor;
        bytes[6] = self.version_patch;
        bytes[8..12].copy_from_slice(&self.flags.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.section_count.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.section_dir_offset.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.section_dir_size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::TooShort);
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);

        Ok(Self {
            magic,
            version_major: bytes[4],
            version_minor: bytes[5],
            version_patch: bytes[6],
            flags: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            section_count: u16::from_le_bytes([bytes[12], bytes[13]]),
            section_dir_offset: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            section_dir_size: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
        })
    }

    /// 校验魔数与主版本
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.magic != MAGIC {
            return Err(HeaderError::InvalidMagic(self.magic));
        }
        if self.version_major != VERSION_MAJOR {
            return Err(HeaderError::UnsupportedVersion {
                found: self.version(),
                supported: VERSION_MAJOR,
            });
        }
        Ok(())
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// 文件头错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// 数据太短
    TooShort,
    /// 魔数不匹配
    InvalidMagic([u8; 4]),
    /// 主版本不受支持
    UnsupportedVersion { found: (u8, u8, u8), supported: u8 },
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderError::TooShort => write!(f, "Header too short"),
            HeaderError::InvalidMagic(m) => write!(f, "Invalid magic: {:02x?}", m),
            HeaderError::UnsupportedVersion { found, supported } => write!(
                f,
                "Unsupported format version {}.{}.{} (supported major version: {})",
                found.0, found.1, found.2, supported
            ),
        }
    }
}

impl std::error::Error for HeaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut header = FileHeader::new();
        header.section_count = 6;
        header.section_dir_offset = 512;
        header.section_dir_size = 96;

        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"KILN");

        let parsed = FileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_header_too_short() {
        assert_eq!(FileHeader::from_bytes(&[0u8; 16]), Err(HeaderError::TooShort));
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = FileHeader::new().to_bytes();
        bytes[0] = b'X';
        let header = FileHeader::from_bytes(&bytes).unwrap();
        assert!(matches!(header.validate(), Err(HeaderError::InvalidMagic(_))));
    }

    #[test]
    fn test_major_version_mismatch() {
        let mut header = FileHeader::new();
        header.version_major = VERSION_MAJOR + 1;
        assert!(matches!(
            header.validate(),
            Err(HeaderError::UnsupportedVersion { .. })
        ));

        // 次版本差异可接受
        let mut header = FileHeader::new();
        header.version_minor = VERSION_MINOR + 3;
        assert!(header.validate().is_ok());
    }
}
