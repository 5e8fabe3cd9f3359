//! 模块摘要信息，供 `kiln inspect` 使用

use super::image::ModuleImage;
use super::reader::{BinaryReader, ReadError};
use super::section::SectionKind;

/// 模块摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    pub magic: [u8; 4],
    pub version: (u8, u8, u8),
    pub type_name: String,
    pub total_size: usize,
    /// (类型, 偏移, 大小)
    pub sections: Vec<(SectionKind, u32, u32)>,
    /// 形如 `private int id`
    pub fields: Vec<String>,
    /// 构造器签名；隐式构造器带 `(implicit)` 后缀
    pub constructor: String,
    /// 形如 `void test()`
    pub methods: Vec<String>,
    pub code_size: usize,
}

impl ModuleInfo {
    /// 解析模块字节并提取摘要
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReadError> {
        let reader = BinaryReader::from_bytes(bytes)?;
        let image = ModuleImage::decode(bytes)?;
        let header = reader.header();

        let mut constructor = image.constructor.signature();
        if !image.explicit_constructor {
            constructor.push_str(" (implicit)");
        }

        Ok(Self {
            magic: header.magic,
            version: header.version(),
            type_name: image.name.clone(),
            total_size: reader.total_size(),
            sections: reader
                .section_entries()
                .iter()
                .map(|e| (e.kind, e.offset, e.size))
                .collect(),
            fields: image
                .fields
                .iter()
                .map(|f| format!("{} {} {}", f.visibility, f.ty, f.name))
                .collect(),
            constructor,
            methods: image
                .methods
                .iter()
                .map(|m| format!("{} {}", m.return_type, m.signature()))
                .collect(),
            code_size: reader
                .read_section(SectionKind::CodeData)
                .map(|code| code.len())
                .unwrap_or(0),
        })
    }
}

impl std::fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Kiln Binary Module")?;
        writeln!(
            f,
            "  Magic: {}",
            std::str::from_utf8(&self.magic).unwrap_or("INVALID")
        )?;
        writeln!(
            f,
            "  Version: {}.{}.{}",
            self.version.0, self.version.1, self.version.2
        )?;
        writeln!(f, "  Type: {}", self.type_name)?;
        writeln!(f, "  Total Size: {} bytes", self.total_size)?;
        writeln!(f, "  Sections: {}", self.sections.len())?;
        for (kind, offset, size) in &self.sections {
            writeln!(f, "    {:?} @ {} ({} bytes)", kind, offset, size)?;
        }
        writeln!(f, "  Fields: {}", self.fields.len())?;
        for field in &self.fields {
            writeln!(f, "    {}", field)?;
        }
        writeln!(f, "  Constructor: {}", self.constructor)?;
        writeln!(f, "  Methods: {}", self.methods.len())?;
        for method in &self.methods {
            writeln!(f, "    {}", method)?;
        }
        write!(f, "  Code Size: {} bytes", self.code_size)
    }
}
