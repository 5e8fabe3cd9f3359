//! 指令集与编码
//!
//! 栈式指令，操作数小端编码：
//!
//! | opcode | 助记符          | 操作数          |
//! |--------|-----------------|-----------------|
//! | 0x01   | LOAD_PARAM      | u8  参数序号     |
//! | 0x02   | LOAD_FIELD      | u16 字段序号     |
//! | 0x03   | STORE_FIELD     | u16 字段序号     |
//! | 0x10   | PUSH_STR        | u32 字符串索引   |
//! | 0x11   | PUSH_INT        | i32             |
//! | 0x20   | CONCAT          | u8  项数         |
//! | 0x30   | CALL_EXTERNAL   | u32 名字, u8 参数数 |
//! | 0x40   | RETURN          |                 |
//! | 0x41   | RETURN_VOID     |                 |

use std::fmt;

/// 操作码
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    LoadParam = 0x01,
    LoadField = 0x02,
    StoreField = 0x03,
    PushStr = 0x10,
    PushInt = 0x11,
    Concat = 0x20,
    CallExternal = 0x30,
    Return = 0x40,
    ReturnVoid = 0x41,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(OpCode::LoadParam),
            0x02 => Some(OpCode::LoadField),
            0x03 => Some(OpCode::StoreField),
            0x10 => Some(OpCode::PushStr),
            0x11 => Some(OpCode::PushInt),
            0x20 => Some(OpCode::Concat),
            0x30 => Some(OpCode::CallExternal),
            0x40 => Some(OpCode::Return),
            0x41 => Some(OpCode::ReturnVoid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpCode::LoadParam => "LOAD_PARAM",
            OpCode::LoadField => "LOAD_FIELD",
            OpCode::StoreField => "STORE_FIELD",
            OpCode::PushStr => "PUSH_STR",
            OpCode::PushInt => "PUSH_INT",
            OpCode::Concat => "CONCAT",
            OpCode::CallExternal => "CALL_EXTERNAL",
            OpCode::Return => "RETURN",
            OpCode::ReturnVoid => "RETURN_VOID",
        }
    }
}

/// 解码后的指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    LoadParam(u8),
    LoadField(u16),
    StoreField(u16),
    PushStr(u32),
    PushInt(i32),
    Concat(u8),
    CallExternal { name: u32, argc: u8 },
    Return,
    ReturnVoid,
}

impl Instr {
    pub fn opcode(&self) -> OpCode {
        match self {
            Instr::LoadParam(_) => OpCode::LoadParam,
            Instr::LoadField(_) => OpCode::LoadField,
            Instr::StoreField(_) => OpCode::StoreField,
            Instr::PushStr(_) => OpCode::PushStr,
            Instr::PushInt(_) => OpCode::PushInt,
            Instr::Concat(_) => OpCode::Concat,
            Instr::CallExternal { .. } => OpCode::CallExternal,
            Instr::Return => OpCode::Return,
            Instr::ReturnVoid => OpCode::ReturnVoid,
        }
    }

    /// 是否结束执行
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instr::Return | Instr::ReturnVoid)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().name();
        match self {
            Instr::LoadParam(i) => write!(f, "{} {}", name, i),
            Instr::LoadField(i) | Instr::StoreField(i) => write!(f, "{} {}", name, i),
            Instr::PushStr(i) => write!(f, "{} #{}", name, i),
            Instr::PushInt(n) => write!(f, "{} {}", name, n),
            Instr::Concat(n) => write!(f, "{} {}", name, n),
            Instr::CallExternal { name: idx, argc } => write!(f, "{} #{} {}", name, idx, argc),
            Instr::Return | Instr::ReturnVoid => f.write_str(name),
        }
    }
}

/// 编码指令序列
pub fn encode(code: &[Instr]) -> Vec<u8> {
    let mut out = Vec::with_capacity(code.len() * 3);
    for instr in code {
        out.push(instr.opcode() as u8);
        match *instr {
            Instr::LoadParam(i) | Instr::Concat(i) => out.push(i),
            Instr::LoadField(i) | Instr::StoreField(i) => out.extend_from_slice(&i.to_le_bytes()),
            Instr::PushStr(i) => out.extend_from_slice(&i.to_le_bytes()),
            Instr::PushInt(n) => out.extend_from_slice(&n.to_le_bytes()),
            Instr::CallExternal { name, argc } => {
                out.extend_from_slice(&name.to_le_bytes());
                out.push(argc);
            }
            Instr::Return | Instr::ReturnVoid => {}
        }
    }
    out
}

/// 解码指令序列
pub fn decode(bytes: &[u8]) -> Result<Vec<Instr>, CodeDecodeError> {
    let mut code = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let at = pos;
        let op = OpCode::from_u8(bytes[pos]).ok_or(CodeDecodeError::UnknownOpcode {
            opcode: bytes[pos],
            offset: at,
        })?;
        pos += 1;

        let instr = match op {
            OpCode::LoadParam => Instr::LoadParam(operand(bytes, &mut pos, 1, at)?[0]),
            OpCode::Concat => Instr::Concat(operand(bytes, &mut pos, 1, at)?[0]),
            OpCode::LoadField => {
                let b = operand(bytes, &mut pos, 2, at)?;
                Instr::LoadField(u16::from_le_bytes([b[0], b[1]]))
            }
            OpCode::StoreField => {
                let b = operand(bytes, &mut pos, 2, at)?;
                Instr::StoreField(u16::from_le_bytes([b[0], b[1]]))
            }
            OpCode::PushStr => {
                let b = operand(bytes, &mut pos, 4, at)?;
                Instr::PushStr(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            OpCode::PushInt => {
                let b = operand(bytes, &mut pos, 4, at)?;
                Instr::PushInt(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            OpCode::CallExternal => {
                let b = operand(bytes, &mut pos, 5, at)?;
                Instr::CallExternal {
                    name: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
                    argc: b[4],
                }
            }
            OpCode::Return => Instr::Return,
            OpCode::ReturnVoid => Instr::ReturnVoid,
        };
        code.push(instr);
    }

    Ok(code)
}

/// 读取 `n` 字节操作数；`at` 为所属指令的起始偏移
fn operand<'a>(
    bytes: &'a [u8],
    pos: &mut usize,
    n: usize,
    at: usize,
) -> Result<&'a [u8], CodeDecodeError> {
    let slice = bytes
        .get(*pos..*pos + n)
        .ok_or(CodeDecodeError::Truncated { offset: at })?;
    *pos += n;
    Ok(slice)
}

/// 指令解码错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeDecodeError {
    /// 未知操作码
    UnknownOpcode { opcode: u8, offset: usize },
    /// 操作数不完整
    Truncated { offset: usize },
}

impl fmt::Display for CodeDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeDecodeError::UnknownOpcode { opcode, offset } => {
                write!(f, "Unknown opcode 0x{:02x} at offset {}", opcode, offset)
            }
            CodeDecodeError::Truncated { offset } => {
                write!(f, "Truncated instruction at offset {}", offset)
            }
        }
    }
}

impl std::error::Error for CodeDecodeError {}
