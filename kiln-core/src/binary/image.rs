//! 模块映像：二进制模块的结构化视图
//!
//! Section 布局：
//! - TypeInfo: name u32, field_count u32, method_count u32, flags u32
//! - FieldTable: 每项 name u32, visibility u8, padding [u8; 3], type [u8; 8]
//! - ConstructorTable / MethodTable: count u32，随后每项
//!   name u32, return type [u8; 8], param_count u32, code_offset u32,
//!   code_len u32, params [[u8; 8]; param_count]
//! - CodeData: 所有成员的指令，按表顺序拼接

use super::code::{self, Instr};
use super::data::{read_type, read_visibility, write_type, ByteCursor, StringPool};
use super::reader::{BinaryReader, ReadError};
use super::section::{SectionData, SectionKind};
use super::writer::BinaryWriter;
use crate::value::{signature, TypeTag, Visibility};

/// 构造器在成员表中的名字
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// TypeInfo.flags: 构造器由用户显式声明
pub const FLAG_EXPLICIT_CONSTRUCTOR: u32 = 0x0001;

/// 字段表项
#[derive(Debug, Clone, PartialEq)]
pub struct FieldImage {
    pub name: String,
    pub ty: TypeTag,
    pub visibility: Visibility,
}

/// 构造器或方法
#[derive(Debug, Clone, PartialEq)]
pub struct MemberImage {
    pub name: String,
    pub return_type: TypeTag,
    pub params: Vec<TypeTag>,
    pub code: Vec<Instr>,
}

impl MemberImage {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.params)
    }
}

/// 单个类型的完整模块内容
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleImage {
    pub name: String,
    pub fields: Vec<FieldImage>,
    pub explicit_constructor: bool,
    pub constructor: MemberImage,
    pub methods: Vec<MemberImage>,
    /// 指令中 `PUSH_STR` / `CALL_EXTERNAL` 引用的字符串
    pub strings: StringPool,
}

impl ModuleImage {
    /// 序列化为模块字节；相同映像总是得到相同字节
    pub fn encode(&self) -> Vec<u8> {
        let mut pool = self.strings.clone();

        let mut type_info = Vec::with_capacity(16);
        put_u32(&mut type_info, pool.add(&self.name));
        put_u32(&mut type_info, self.fields.len() as u32);
        put_u32(&mut type_info, self.methods.len() as u32);
        let flags = if self.explicit_constructor {
            FLAG_EXPLICIT_CONSTRUCTOR
        } else {
            0
        };
        put_u32(&mut type_info, flags);

        let mut field_table = Vec::with_capacity(self.fields.len() * 16);
        for field in &self.fields {
            put_u32(&mut field_table, pool.add(&field.name));
            field_table.push(field.visibility as u8);
            field_table.extend_from_slice(&[0u8; 3]);
            write_type(&mut field_table, &field.ty, &mut pool);
        }

        let mut code_data = Vec::new();
        let ctor_table = encode_members(
            std::slice::from_ref(&self.constructor),
            &mut pool,
            &mut code_data,
        );
        let method_table = encode_members(&self.methods, &mut pool, &mut code_data);

        let mut writer = BinaryWriter::new();
        writer.write_section(SectionKind::StringPool, &pool.serialize());
        writer.write_section(SectionKind::TypeInfo, &type_info);
        writer.write_section(SectionKind::FieldTable, &field_table);
        writer.write_section(SectionKind::ConstructorTable, &ctor_table);
        writer.write_section(SectionKind::MethodTable, &method_table);
        writer.write_section(SectionKind::CodeData, &code_data);
        writer.finish()
    }

    /// 从模块字节还原，并校验指令中的所有索引
    pub fn decode(bytes: &[u8]) -> Result<Self, ReadError> {
        let reader = BinaryReader::from_bytes(bytes)?;
        let strings = StringPool::deserialize(reader.read_section(SectionKind::StringPool)?)?;

        let mut cursor = ByteCursor::new(reader.read_section(SectionKind::TypeInfo)?);
        let name = strings.resolve(cursor.u32()?)?.to_string();
        let field_count = cursor.u32()? as usize;
        let method_count = cursor.u32()? as usize;
        let flags = cursor.u32()?;
        cursor.finish()?;

        let mut cursor = ByteCursor::new(reader.read_section(SectionKind::FieldTable)?);
        let mut fields = Vec::new();
        for _ in 0..field_count {
            let field_name = strings.resolve(cursor.u32()?)?.to_string();
            let visibility = read_visibility(&mut cursor)?;
            cursor.skip(3)?;
            let ty = read_type(&mut cursor, &strings)?;
            fields.push(FieldImage {
                name: field_name,
                ty,
                visibility,
            });
        }
        cursor.finish()?;

        let code_data = reader.read_section(SectionKind::CodeData)?;
        let mut ctors = decode_members(
            reader.read_section(SectionKind::ConstructorTable)?,
            &strings,
            code_data,
        )?;
        let methods = decode_members(
            reader.read_section(SectionKind::MethodTable)?,
            &strings,
            code_data,
        )?;

        if ctors.len() != 1 {
            return Err(ReadError::Inconsistent(format!(
                "expected exactly one constructor, found {}",
                ctors.len()
            )));
        }
        if methods.len() != method_count {
            return Err(ReadError::Inconsistent(format!(
                "type info declares {} methods, table has {}",
                method_count,
                methods.len()
            )));
        }

        let image = Self {
            name,
            fields,
            explicit_constructor: flags & FLAG_EXPLICIT_CONSTRUCTOR != 0,
            constructor: ctors.remove(0),
            methods,
            strings,
        };
        image.verify()?;
        Ok(image)
    }

    /// 按名字和参数类型查找方法
    pub fn method(&self, name: &str, params: &[TypeTag]) -> Option<&MemberImage> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }

    /// 校验指令引用的字段、参数和字符串都存在，且每段代码以返回结束
    fn verify(&self) -> Result<(), ReadError> {
        for member in std::iter::once(&self.constructor).chain(&self.methods) {
            let bad = |what: String| {
                ReadError::Inconsistent(format!("{}: {}", member.signature(), what))
            };

            match member.code.last() {
                Some(last) if last.is_terminator() => {}
                _ => return Err(bad("code does not end with a return".to_string())),
            }

            for instr in &member.code {
                match *instr {
                    Instr::LoadField(i) | Instr::StoreField(i) if i as usize >= self.fields.len() => {
                        return Err(bad(format!("field index {} out of range", i)));
                    }
                    Instr::LoadParam(i) if i as usize >= member.params.len() => {
                        return Err(bad(format!("parameter index {} out of range", i)));
                    }
                    Instr::PushStr(i) | Instr::CallExternal { name: i, .. }
                        if self.strings.get(i).is_none() =>
                    {
                        return Err(bad(format!("string index {} out of range", i)));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn encode_members(members: &[MemberImage], pool: &mut StringPool, code_data: &mut Vec<u8>) -> Vec<u8> {
    let mut table = Vec::new();
    put_u32(&mut table, members.len() as u32);

    for member in members {
        let code = code::encode(&member.code);

        put_u32(&mut table, pool.add(&member.name));
        write_type(&mut table, &member.return_type, pool);
        put_u32(&mut table, member.params.len() as u32);
        put_u32(&mut table, code_data.len() as u32);
        put_u32(&mut table, code.len() as u32);
        for param in &member.params {
            write_type(&mut table, param, pool);
        }

        code_data.extend_from_slice(&code);
    }

    table
}

fn decode_members(
    table: &[u8],
    strings: &StringPool,
    code_data: &[u8],
) -> Result<Vec<MemberImage>, ReadError> {
    let mut cursor = ByteCursor::new(table);
    let count = cursor.u32()? as usize;
    let mut members = Vec::new();

    for _ in 0..count {
        let name = strings.resolve(cursor.u32()?)?.to_string();
        let return_type = read_type(&mut cursor, strings)?;
        let param_count = cursor.u32()? as usize;
        let code_offset = cursor.u32()? as usize;
        let code_len = cursor.u32()? as usize;

        if param_count > u8::MAX as usize {
            return Err(ReadError::Inconsistent(format!(
                "{} declares {} parameters",
                name, param_count
            )));
        }
        let mut params = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            params.push(read_type(&mut cursor, strings)?);
        }

        let bytes = code_data
            .get(code_offset..code_offset + code_len)
            .ok_or(ReadError::InvalidOffset)?;
        members.push(MemberImage {
            name,
            return_type,
            params,
            code: code::decode(bytes)?,
        });
    }
    cursor.finish()?;

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModuleImage {
        let mut strings = StringPool::new();
        let space = strings.add(" ");
        let println = strings.add("println");

        ModuleImage {
            name: "com.lee.demo.Foo".to_string(),
            fields: vec![
                FieldImage {
                    name: "id".to_string(),
                    ty: TypeTag::Int,
                    visibility: Visibility::Private,
                },
                FieldImage {
                    name: "name".to_string(),
                    ty: TypeTag::Str,
                    visibility: Visibility::Protected,
                },
            ],
            explicit_constructor: true,
            constructor: MemberImage {
                name: CONSTRUCTOR_NAME.to_string(),
                return_type: TypeTag::Void,
                params: vec![TypeTag::Int, TypeTag::Str],
                code: vec![
                    Instr::LoadParam(0),
                    Instr::StoreField(0),
                    Instr::LoadParam(1),
                    Instr::StoreField(1),
                    Instr::ReturnVoid,
                ],
            },
            methods: vec![MemberImage {
                name: "test".to_string(),
                return_type: TypeTag::Void,
                params: vec![],
                code: vec![
                    Instr::LoadField(0),
                    Instr::PushStr(space),
                    Instr::LoadField(1),
                    Instr::Concat(3),
                    Instr::CallExternal {
                        name: println,
                        argc: 1,
                    },
                    Instr::ReturnVoid,
                ],
            }],
            strings,
        }
    }

    #[test]
    fn test_decode_restores_image() {
        let image = sample();
        let bytes = image.encode();
        let decoded = ModuleImage::decode(&bytes).unwrap();

        assert_eq!(decoded.name, image.name);
        assert_eq!(decoded.fields, image.fields);
        assert_eq!(decoded.constructor, image.constructor);
        assert_eq!(decoded.methods, image.methods);
        assert!(decoded.explicit_constructor);
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn test_method_lookup() {
        let image = sample();
        assert!(image.method("test", &[]).is_some());
        assert!(image.method("test", &[TypeTag::Int]).is_none());
    }

    #[test]
    fn test_rejects_field_index_out_of_range() {
        let mut image = sample();
        image.methods[0].code = vec![Instr::LoadField(9), Instr::Return];
        let err = ModuleImage::decode(&image.encode()).unwrap_err();
        assert!(matches!(err, ReadError::Inconsistent(_)));
    }

    #[test]
    fn test_rejects_missing_return() {
        let mut image = sample();
        image.methods[0].code = vec![Instr::LoadField(0)];
        let err = ModuleImage::decode(&image.encode()).unwrap_err();
        assert!(matches!(err, ReadError::Inconsistent(_)));
    }

    #[test]
    fn test_rejects_corrupt_code() {
        let image = sample();
        let mut bytes = image.encode();
        let reader = BinaryReader::from_bytes(&bytes).unwrap();
        let code_offset = reader.sections().find(SectionKind::CodeData).unwrap().offset as usize;
        bytes[code_offset] = 0xee;

        let err = ModuleImage::decode(&bytes).unwrap_err();
        assert!(matches!(err, ReadError::Code(_)));
    }
}
