//! 二进制文件写入器
//!
//! 负责将各 section 拼装为完整的模块字节序列：文件头 + 8 字节对齐的 section
//! 数据 + 末尾的 section directory。

use super::header::{FileHeader, HEADER_SIZE};
use super::section::{SectionDirectory, SectionEntry, SectionKind};

/// 二进制写入器
pub struct BinaryWriter {
    /// 文件头
    header: FileHeader,
    /// Section directory
    sections: SectionDirectory,
    /// 当前写入位置
    current_offset: u32,
    /// 缓冲区
    buffer: Vec<u8>,
}

impl BinaryWriter {
    /// 创建新的二进制写入器
    pub fn new() -> Self {
        let mut buffer = Vec::with_capacity(1024);
        // 预留文件头空间
        buffer.resize(HEADER_SIZE, 0);

        Self {
            header: FileHeader::new(),
            sections: SectionDirectory::new(),
            current_offset: HEADER_SIZE as u32,
            buffer,
        }
    }

    /// 获取当前写入位置
    pub fn current_offset(&self) -> u32 {
        self.current_offset
    }

    /// 对齐到指定边界
    pub fn align_to(&mut self, alignment: u32) {
        let rem = self.current_offset % alignment;
        if rem != 0 {
            let padding = alignment - rem;
            self.buffer.resize(self.buffer.len() + padding as usize, 0);
            self.current_offset += padding;
        }
    }

    /// 写入 section 数据
    ///
    /// 返回 section 在文件中的偏移
    pub fn write_section(&mut self, kind: SectionKind, data: &[u8]) -> u32 {
        self.align_to(8);

        let offset = self.current_offset;
        let size = data.len() as u32;

        self.sections.add(SectionEntry::new(kind, offset, size));
        self.buffer.extend_from_slice(data);
        self.current_offset += size;

        offset
    }

    /// 写入 section directory 并回填文件头
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to(8);

        let dir_bytes = self.sections.to_bytes();
        self.header.section_count = self.sections.count() as u16;
        self.header.section_dir_offset = self.current_offset;
        self.header.section_dir_size = dir_bytes.len() as u32;

        self.buffer.extend_from_slice(&dir_bytes);
        self.buffer[..HEADER_SIZE].copy_from_slice(&self.header.to_bytes());

        self.buffer
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}
