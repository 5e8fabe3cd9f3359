//! 二进制模块格式
//!
//! ```text
//! +------------------+  0
//! | FileHeader (32B) |
//! +------------------+  32
//! | StringPool       |  各 section 8 字节对齐
//! | TypeInfo         |
//! | FieldTable       |
//! | ConstructorTable |
//! | MethodTable      |
//! | CodeData         |
//! +------------------+
//! | SectionDirectory |  16 字节/条目
//! +------------------+
//! ```

pub mod code;
pub mod data;
pub mod header;
pub mod image;
pub mod info;
pub mod reader;
pub mod section;
pub mod writer;

pub use code::{CodeDecodeError, Instr, OpCode};
pub use data::StringPool;
pub use header::{FileHeader, HeaderError, HEADER_SIZE, MAGIC};
pub use image::{FieldImage, MemberImage, ModuleImage, CONSTRUCTOR_NAME};
pub use info::ModuleInfo;
pub use reader::{BinaryReader, ReadError};
pub use section::{SectionDirectory, SectionEntry, SectionError, SectionKind};
pub use writer::BinaryWriter;
