//! 代码生成器
//!
//! 将 [`FrozenType`] 确定性地降级为 [`BinaryModule`]：字段表按声明顺序输出，
//! 构造器体降级为 `LOAD_PARAM`/`STORE_FIELD` 序列，方法体降级为读取字段、
//! 拼接、调用外部 `println` 的指令序列。同一描述总是生成完全相同的字节。

use crate::binary::code::Instr;
use crate::binary::image::{FieldImage, MemberImage, ModuleImage, CONSTRUCTOR_NAME};
use crate::binary::StringPool;
use crate::body::{Body, Operand, Stmt};
use crate::descriptor::{param_type, FrozenType};
use crate::error::BuildError;
use crate::value::{signature, TypeTag};
use tracing::{debug, instrument, trace};

/// 唯一绑定的外部函数
pub const PRINTLN: &str = "println";

/// 序列化后的模块：类型全限定名 + 不透明字节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryModule {
    name: String,
    bytes: Vec<u8>,
}

impl BinaryModule {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// 用作磁盘查找键的全限定名
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 将冻结的类型描述降级为二进制模块
#[instrument(target = "kiln::codegen", skip(ty), fields(type_name = %ty.name()))]
pub fn generate(ty: &FrozenType) -> Result<BinaryModule, BuildError> {
    let image = lower(ty)?;
    let bytes = image.encode();
    debug!(target: "kiln::codegen", size = bytes.len(), methods = image.methods.len(), "module generated");
    Ok(BinaryModule::new(ty.name(), bytes))
}

/// 降级为模块映像（不序列化）
pub fn lower(ty: &FrozenType) -> Result<ModuleImage, BuildError> {
    if ty.fields().len() > u16::MAX as usize {
        return Err(BuildError::SignatureMismatch {
            member: ty.name().to_string(),
            reason: format!("too many fields ({})", ty.fields().len()),
        });
    }

    let mut gen = CodeGenerator {
        ty,
        strings: StringPool::new(),
    };

    let constructor = match ty.constructor() {
        Some(ctor) => gen.lower_member(CONSTRUCTOR_NAME, &TypeTag::Void, &ctor.params, &ctor.body)?,
        None => MemberImage {
            name: CONSTRUCTOR_NAME.to_string(),
            return_type: TypeTag::Void,
            params: Vec::new(),
            code: vec![Instr::ReturnVoid],
        },
    };

    let mut methods = Vec::with_capacity(ty.methods().len());
    for method in ty.methods() {
        let label = gen.label(&method.name, &method.params);
        let stmts = flatten(&label, &method.body)?;
        methods.push(gen.lower_member(&method.name, &method.return_type, &method.params, &stmts)?);
    }

    Ok(ModuleImage {
        name: ty.name().to_string(),
        fields: ty
            .fields()
            .iter()
            .map(|f| FieldImage {
                name: f.name.clone(),
                ty: f.ty.clone(),
                visibility: f.visibility,
            })
            .collect(),
        explicit_constructor: ty.constructor().is_some(),
        constructor,
        methods,
        strings: gen.strings,
    })
}

/// 按顺序展开方法体片段（前导片段在前）
fn flatten(label: &str, segments: &[Body]) -> Result<Vec<Stmt>, BuildError> {
    let mut stmts = Vec::new();
    for segment in segments {
        stmts.extend(segment.statements(label)?);
    }
    Ok(stmts)
}

struct CodeGenerator<'a> {
    ty: &'a FrozenType,
    strings: StringPool,
}

impl CodeGenerator<'_> {
    fn label(&self, name: &str, params: &[TypeTag]) -> String {
        format!("{}.{}", self.ty.name(), signature(name, params))
    }

    fn lower_member(
        &mut self,
        name: &str,
        return_type: &TypeTag,
        params: &[TypeTag],
        stmts: &[Stmt],
    ) -> Result<MemberImage, BuildError> {
        let label = self.label(name, params);
        let mismatch = |reason: &str| BuildError::SignatureMismatch {
            member: label.clone(),
            reason: reason.to_string(),
        };

        let mut code = Vec::new();
        let mut returned = false;

        for stmt in stmts {
            if returned {
                return Err(BuildError::UnsupportedBodyConstruct {
                    member: label.clone(),
                    snippet: format!("unreachable statement after return: {:?}", stmt),
                });
            }

            match stmt {
                Stmt::Assign { field, param } => {
                    let (index, target) = self
                        .ty
                        .field(field)
                        .ok_or_else(|| mismatch(&format!("assigns unknown field '{}'", field)))?;
                    let source = param_type(params, *param)
                        .ok_or_else(|| mismatch(&format!("reads missing parameter ${}", param)))?;
                    if *source != target.ty {
                        return Err(mismatch(&format!(
                            "field '{}' is {} but ${} is {}",
                            field, target.ty, param, source
                        )));
                    }
                    code.push(Instr::LoadParam((*param - 1) as u8));
                    code.push(Instr::StoreField(index as u16));
                }
                Stmt::Print(parts) => {
                    match parts.len() {
                        0 => code.push(Instr::PushStr(self.strings.add(""))),
                        n if n > u8::MAX as usize => {
                            return Err(BuildError::UnsupportedBodyConstruct {
                                member: label.clone(),
                                snippet: format!("println with {} terms", n),
                            });
                        }
                        n => {
                            for part in parts {
                                self.push_operand(&label, params, part, &mut code)?;
                            }
                            if n > 1 {
                                code.push(Instr::Concat(n as u8));
                            }
                        }
                    }
                    code.push(Instr::CallExternal {
                        name: self.strings.add(PRINTLN),
                        argc: 1,
                    });
                }
                Stmt::Return(None) => {
                    if *return_type != TypeTag::Void {
                        return Err(mismatch(&format!("must return {}", return_type)));
                    }
                    code.push(Instr::ReturnVoid);
                    returned = true;
                }
                Stmt::Return(Some(operand)) => {
                    if *return_type == TypeTag::Void {
                        return Err(mismatch("void member cannot return a value"));
                    }
                    let found = self.push_operand(&label, params, operand, &mut code)?;
                    if found != *return_type {
                        return Err(mismatch(&format!(
                            "returns {} but is declared {}",
                            found, return_type
                        )));
                    }
                    code.push(Instr::Return);
                    returned = true;
                }
            }
        }

        if !returned {
            if *return_type != TypeTag::Void {
                return Err(mismatch(&format!("missing return of {}", return_type)));
            }
            code.push(Instr::ReturnVoid);
        }

        trace!(target: "kiln::codegen", member = %label, instructions = code.len(), "member lowered");
        Ok(MemberImage {
            name: name.to_string(),
            return_type: return_type.clone(),
            params: params.to_vec(),
            code,
        })
    }

    /// 压入一个操作数，返回其静态类型
    fn push_operand(
        &mut self,
        label: &str,
        params: &[TypeTag],
        operand: &Operand,
        code: &mut Vec<Instr>,
    ) -> Result<TypeTag, BuildError> {
        let mismatch = |reason: String| BuildError::SignatureMismatch {
            member: label.to_string(),
            reason,
        };

        match operand {
            Operand::Field(name) => {
                let (index, field) = self
                    .ty
                    .field(name)
                    .ok_or_else(|| mismatch(format!("reads unknown field '{}'", name)))?;
                code.push(Instr::LoadField(index as u16));
                Ok(field.ty.clone())
            }
            Operand::Param(n) => {
                let ty = param_type(params, *n)
                    .ok_or_else(|| mismatch(format!("reads missing parameter ${}", n)))?;
                code.push(Instr::LoadParam((*n - 1) as u8));
                Ok(ty.clone())
            }
            Operand::Str(s) => {
                code.push(Instr::PushStr(self.strings.add(s)));
                Ok(TypeTag::Str)
            }
            Operand::Int(n) => {
                code.push(Instr::PushInt(*n));
                Ok(TypeTag::Int)
            }
        }
    }
}
