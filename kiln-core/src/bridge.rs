//! 调用桥
//!
//! 后期绑定的构造与调用：按名字 + 参数个数 + 参数类型精确匹配成员，然后在一个
//! 极小的栈式解释器上执行模块中的指令。除精确匹配外不做任何重载评分。

use crate::binary::code::Instr;
use crate::binary::image::MemberImage;
use crate::codegen::PRINTLN;
use crate::error::InvokeError;
use crate::loader::{LoadedType, LoaderId};
use crate::value::{TypeTag, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// 已加载类型的实例；克隆共享同一对象
#[derive(Clone)]
pub struct Instance {
    ty: LoadedType,
    fields: Rc<RefCell<Vec<Value>>>,
}

impl Instance {
    pub fn type_of(&self) -> &LoadedType {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// 读取字段（不受可见性限制）
    pub fn field(&self, name: &str) -> Result<Value, InvokeError> {
        self.ty.ensure_open()?;
        let index = self
            .ty
            .field_index(name)
            .ok_or_else(|| InvokeError::FieldNotFound {
                type_name: self.type_name().to_string(),
                field: name.to_string(),
            })?;
        Ok(self.fields.borrow()[index].clone())
    }

    /// 等价于 [`invoke`]
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        invoke(self, method, args)
    }

    /// 是否为同一对象
    pub fn same_instance(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.type_name(), self.ty.loader_id())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name())
            .field("loader", &self.ty.loader_id())
            .finish()
    }
}

/// 用模块中记录的构造器创建实例
pub fn construct(ty: &LoadedType, args: &[Value]) -> Result<Instance, InvokeError> {
    ty.ensure_open()?;

    let ctor = ty.constructor();
    let label = format!("{}.{}", ty.name(), ctor.signature());
    if args.len() != ctor.params.len() {
        return Err(InvokeError::ArgumentArity {
            member: label,
            expected: ctor.params.len(),
            found: args.len(),
        });
    }
    if let Some(err) = type_mismatch(&label, &ctor.params, args, ty.loader_id()) {
        return Err(err);
    }

    let instance = Instance {
        ty: ty.clone(),
        fields: Rc::new(RefCell::new(
            ty.fields().iter().map(|f| f.ty.default_value()).collect(),
        )),
    };

    debug!(target: "kiln::bridge", member = %label, "construct");
    execute(&instance, &label, &ctor.code, args)?;
    Ok(instance)
}

/// 按名字调用实例方法
///
/// 候选为同名且参数个数相同的方法，其中必须恰好一个接受 `args`。
/// `null` 实参同时匹配多个重载时返回 [`InvokeError::AmbiguousCall`]。
/// void 方法返回 [`Value::Null`]。
pub fn invoke(instance: &Instance, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
    let ty = instance.type_of();
    ty.ensure_open()?;

    let candidates: Vec<&MemberImage> = ty.methods_with_arity(method, args.len()).collect();
    let first = candidates
        .first()
        .ok_or_else(|| InvokeError::MethodNotFound {
            type_name: ty.name().to_string(),
            method: method.to_string(),
            arity: args.len(),
        })?;

    let matching: Vec<&MemberImage> = candidates
        .iter()
        .copied()
        .filter(|m| m.params.iter().zip(args).all(|(p, a)| accepts(p, a, ty.loader_id())))
        .collect();
    if matching.len() > 1 {
        return Err(InvokeError::AmbiguousCall {
            type_name: ty.name().to_string(),
            method: method.to_string(),
            arity: args.len(),
            candidates: matching.iter().map(|m| m.signature()).collect(),
        });
    }

    match matching.first() {
        Some(member) => {
            let label = format!("{}.{}", ty.name(), member.signature());
            debug!(target: "kiln::bridge", member = %label, "invoke");
            execute(instance, &label, &member.code, args)
        }
        None => {
            let label = format!("{}.{}", ty.name(), first.signature());
            Err(type_mismatch(&label, &first.params, args, ty.loader_id()).unwrap_or(
                InvokeError::MethodNotFound {
                    type_name: ty.name().to_string(),
                    method: method.to_string(),
                    arity: args.len(),
                },
            ))
        }
    }
}

/// 参数类型是否接受该值
///
/// `null` 可传给 string 与具名类型；对象只能传给同名且同一加载器产生的类型。
fn accepts(param: &TypeTag, value: &Value, loader: LoaderId) -> bool {
    match (param, value) {
        (TypeTag::Bool, Value::Bool(_))
        | (TypeTag::Int, Value::Int(_))
        | (TypeTag::Long, Value::Long(_))
        | (TypeTag::Double, Value::Double(_))
        | (TypeTag::Str, Value::Str(_)) => true,
        (_, value) if value.is_null() => param.is_nullable(),
        (TypeTag::Named(name), Value::Object(obj)) => {
            obj.type_name() == name && obj.type_of().loader_id() == loader
        }
        _ => false,
    }
}

fn type_mismatch(
    label: &str,
    params: &[TypeTag],
    args: &[Value],
    loader: LoaderId,
) -> Option<InvokeError> {
    params
        .iter()
        .zip(args)
        .position(|(p, a)| !accepts(p, a, loader))
        .map(|index| {
            let found = match &args[index] {
                Value::Object(obj) if obj.type_of().loader_id() != loader => {
                    format!("{} from {}", obj.type_name(), obj.type_of().loader_id())
                }
                other => other.type_name(),
            };
            InvokeError::ArgumentType {
                member: label.to_string(),
                index,
                expected: params[index].to_string(),
                found,
            }
        })
}

/// 执行一段指令
fn execute(
    instance: &Instance,
    label: &str,
    code: &[Instr],
    args: &[Value],
) -> Result<Value, InvokeError> {
    let fail = |reason: String| InvokeError::Execution {
        member: label.to_string(),
        reason,
    };
    let mut stack: Vec<Value> = Vec::new();

    for instr in code {
        trace!(target: "kiln::bridge", instr = %instr, depth = stack.len());
        match *instr {
            Instr::LoadParam(i) => {
                let value = args
                    .get(i as usize)
                    .ok_or_else(|| fail(format!("missing argument {}", i)))?;
                stack.push(value.clone());
            }
            Instr::LoadField(i) => {
                let value = instance
                    .fields
                    .borrow()
                    .get(i as usize)
                    .cloned()
                    .ok_or_else(|| fail(format!("missing field {}", i)))?;
                stack.push(value);
            }
            Instr::StoreField(i) => {
                let value = stack.pop().ok_or_else(|| fail("stack underflow".to_string()))?;
                let mut fields = instance.fields.borrow_mut();
                let slot = fields
                    .get_mut(i as usize)
                    .ok_or_else(|| fail(format!("missing field {}", i)))?;
                *slot = value;
            }
            Instr::PushStr(i) => {
                let s = instance
                    .ty
                    .string(i)
                    .ok_or_else(|| fail(format!("missing string {}", i)))?;
                stack.push(Value::Str(s.to_string()));
            }
            Instr::PushInt(n) => stack.push(Value::Int(n)),
            Instr::Concat(n) => {
                let n = n as usize;
                if stack.len() < n {
                    return Err(fail("stack underflow".to_string()));
                }
                let joined: String = stack
                    .drain(stack.len() - n..)
                    .map(|v| v.to_string())
                    .collect();
                stack.push(Value::Str(joined));
            }
            Instr::CallExternal { name, argc } => {
                let external = instance.ty.string(name).unwrap_or_default();
                if external != PRINTLN || argc != 1 {
                    return Err(fail(format!("unbound external {}/{}", external, argc)));
                }
                let line = stack.pop().ok_or_else(|| fail("stack underflow".to_string()))?;
                instance.ty.sink().print_line(&line.to_string());
            }
            Instr::Return => {
                return stack.pop().ok_or_else(|| fail("stack underflow".to_string()));
            }
            Instr::ReturnVoid => return Ok(Value::Null),
        }
    }

    Err(fail("fell off the end of the code".to_string()))
}
