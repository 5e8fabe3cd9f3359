//! 类型描述模型
//!
//! [`TypeDescriptor`] 在生成期可变，成员必须按 字段 → 构造器 → 方法 的顺序添加；
//! [`TypeDescriptor::freeze`] 消耗构建器并返回只读的 [`FrozenType`]，之后没有
//! 回到构建状态的路径。
//!
//! 单线程使用，不提供内部加锁。

use crate::body::{Body, Operand, Stmt};
use crate::error::BuildError;
use crate::value::{signature, TypeTag, Visibility};
use tracing::{debug, trace};

/// 字段描述
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeTag,
    pub visibility: Visibility,
}

/// 构造器描述；构造器体在设置时已解析并校验
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    pub params: Vec<TypeTag>,
    pub body: Vec<Stmt>,
}

/// 方法描述
///
/// `body` 是按执行顺序排列的片段，`insert_before` 注入的前导片段位于最前。
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub return_type: TypeTag,
    pub params: Vec<TypeTag>,
    pub body: Vec<Body>,
}

impl MethodDescriptor {
    pub fn signature(&self) -> String {
        signature(&self.name, &self.params)
    }
}

/// 构建阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Fields,
    Constructor,
    Methods,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Fields => "fields",
            Stage::Constructor => "the constructor",
            Stage::Methods => "methods",
        }
    }
}

/// 构建中的类型描述
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    constructor: Option<ConstructorDescriptor>,
    methods: Vec<MethodDescriptor>,
    stage: Stage,
}

/// 以全限定名开始一个新的类型描述
pub fn new_type(name: impl Into<String>) -> TypeDescriptor {
    TypeDescriptor::new(name)
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            constructor: None,
            methods: Vec::new(),
            stage: Stage::Fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructor.as_ref()
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// 按名查找字段及其声明序号
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// 添加字段；重名时返回错误且描述保持不变
    pub fn add_field(
        &mut self,
        name: &str,
        ty: TypeTag,
        visibility: Visibility,
    ) -> Result<(), BuildError> {
        self.check_stage(Stage::Fields, || format!("field '{}'", name))?;
        check_identifier(name)?;

        if self.field(name).is_some() {
            return Err(BuildError::DuplicateField {
                type_name: self.name.clone(),
                field: name.to_string(),
            });
        }
        if ty == TypeTag::Void {
            return Err(BuildError::SignatureMismatch {
                member: format!("{}.{}", self.name, name),
                reason: "field cannot be void".to_string(),
            });
        }

        debug!(target: "kiln::descriptor", type_name = %self.name, field = name, ty = %ty, "field added");
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            ty,
            visibility,
        });
        Ok(())
    }

    /// 设置构造器
    ///
    /// 构造器体中的每条赋值都必须引用已声明的字段和存在的参数，且类型一致。
    pub fn set_constructor(
        &mut self,
        params: Vec<TypeTag>,
        body: impl Into<Body>,
    ) -> Result<(), BuildError> {
        if self.constructor.is_some() {
            return Err(BuildError::AlreadySet {
                type_name: self.name.clone(),
            });
        }
        self.check_stage(Stage::Constructor, || "the constructor".to_string())?;

        let member = format!("{}.{}", self.name, signature("<init>", &params));
        check_params(&member, &params)?;
        let stmts = body.into().statements(&member)?;
        self.check_constructor_body(&member, &params, &stmts)?;

        debug!(target: "kiln::descriptor", member = %member, statements = stmts.len(), "constructor set");
        self.constructor = Some(ConstructorDescriptor {
            params,
            body: stmts,
        });
        self.stage = Stage::Constructor;
        Ok(())
    }

    /// 添加方法；名字与参数列表都相同视为重复
    pub fn add_method(
        &mut self,
        name: &str,
        return_type: TypeTag,
        params: Vec<TypeTag>,
        body: impl Into<Body>,
    ) -> Result<(), BuildError> {
        self.check_stage(Stage::Methods, || format!("method '{}'", name))?;
        check_identifier(name)?;

        let sig = signature(name, &params);
        if self.find_method(name, &params).is_some() {
            return Err(BuildError::DuplicateMethod {
                type_name: self.name.clone(),
                signature: sig,
            });
        }
        check_params(&format!("{}.{}", self.name, sig), &params)?;

        debug!(target: "kiln::descriptor", type_name = %self.name, method = %sig, "method added");
        self.methods.push(MethodDescriptor {
            name: name.to_string(),
            return_type,
            params,
            body: vec![body.into()],
        });
        self.stage = Stage::Methods;
        Ok(())
    }

    /// 在已有方法体之前插入前导片段
    pub fn insert_before(
        &mut self,
        name: &str,
        params: &[TypeTag],
        body: impl Into<Body>,
    ) -> Result<(), BuildError> {
        let type_name = self.name.clone();
        let method = self
            .methods
            .iter_mut()
            .find(|m| m.name == name && m.params == params)
            .ok_or_else(|| BuildError::UnknownMethod {
                type_name,
                signature: signature(name, params),
            })?;

        trace!(target: "kiln::descriptor", method = %method.signature(), "prologue inserted");
        method.body.insert(0, body.into());
        Ok(())
    }

    /// 冻结描述，结束生成期
    pub fn freeze(self) -> Result<FrozenType, BuildError> {
        validate_qualified_name(&self.name).map_err(|reason| BuildError::InvalidName {
            name: self.name.clone(),
            reason,
        })?;

        debug!(
            target: "kiln::descriptor",
            type_name = %self.name,
            fields = self.fields.len(),
            methods = self.methods.len(),
            explicit_constructor = self.constructor.is_some(),
            "type frozen"
        );
        Ok(FrozenType { inner: self })
    }

    fn find_method(&self, name: &str, params: &[TypeTag]) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }

    fn check_stage(
        &self,
        wanted: Stage,
        member: impl FnOnce() -> String,
    ) -> Result<(), BuildError> {
        if self.stage > wanted {
            return Err(BuildError::OutOfOrder {
                type_name: self.name.clone(),
                member: member(),
                stage: self.stage.as_str(),
            });
        }
        Ok(())
    }

    fn check_constructor_body(
        &self,
        member: &str,
        params: &[TypeTag],
        stmts: &[Stmt],
    ) -> Result<(), BuildError> {
        let mismatch = |reason: String| BuildError::SignatureMismatch {
            member: member.to_string(),
            reason,
        };

        // $n → 被初始化字段的序号
        let mut targets: Vec<Option<usize>> = vec![None; params.len()];

        for stmt in stmts {
            match stmt {
                Stmt::Assign { field, param } => {
                    let (index, target) = self
                        .field(field)
                        .ok_or_else(|| mismatch(format!("assigns unknown field '{}'", field)))?;
                    let source = param_type(params, *param).ok_or_else(|| {
                        mismatch(format!(
                            "field '{}' is assigned from ${} but only {} parameter(s) exist",
                            field,
                            param,
                            params.len()
                        ))
                    })?;
                    if *source != target.ty {
                        return Err(mismatch(format!(
                            "field '{}' is {} but ${} is {}",
                            field, target.ty, param, source
                        )));
                    }
                    if targets.contains(&Some(index)) {
                        return Err(mismatch(format!("field '{}' is assigned more than once", field)));
                    }
                    let slot = &mut targets[*param - 1];
                    if slot.is_some() {
                        return Err(mismatch(format!("${} initializes more than one field", param)));
                    }
                    *slot = Some(index);
                }
                Stmt::Print(parts) => {
                    for part in parts {
                        self.check_operand(params, part).map_err(mismatch)?;
                    }
                }
                Stmt::Return(Some(_)) => {
                    return Err(mismatch("constructor cannot return a value".to_string()));
                }
                Stmt::Return(None) => {}
            }
        }

        let mut previous: Option<usize> = None;
        for (i, target) in targets.iter().enumerate() {
            let index = target.ok_or_else(|| {
                mismatch(format!("${} does not initialize any field", i + 1))
            })?;
            if matches!(previous, Some(p) if p > index) {
                return Err(mismatch(format!(
                    "${} initializes '{}', which is declared before the field of ${}",
                    i + 1,
                    self.fields[index].name,
                    i
                )));
            }
            previous = Some(index);
        }
        Ok(())
    }

    fn check_operand(&self, params: &[TypeTag], operand: &Operand) -> Result<(), String> {
        match operand {
            Operand::Field(name) if self.field(name).is_none() => {
                Err(format!("reads unknown field '{}'", name))
            }
            Operand::Param(n) if param_type(params, *n).is_none() => Err(format!(
                "reads ${} but only {} parameter(s) exist",
                n,
                params.len()
            )),
            _ => Ok(()),
        }
    }
}

/// `$n` 对应的参数类型
pub(crate) fn param_type(params: &[TypeTag], n: usize) -> Option<&TypeTag> {
    n.checked_sub(1).and_then(|i| params.get(i))
}

fn check_params(member: &str, params: &[TypeTag]) -> Result<(), BuildError> {
    if params.iter().any(|p| *p == TypeTag::Void) {
        return Err(BuildError::SignatureMismatch {
            member: member.to_string(),
            reason: "parameter cannot be void".to_string(),
        });
    }
    if params.len() > u8::MAX as usize {
        return Err(BuildError::SignatureMismatch {
            member: member.to_string(),
            reason: format!("too many parameters ({})", params.len()),
        });
    }
    Ok(())
}

fn check_identifier(name: &str) -> Result<(), BuildError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(BuildError::InvalidName {
            name: name.to_string(),
            reason: "not an identifier".to_string(),
        })
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// 校验点分名字，如 `com.lee.demo.Foo`
///
/// 每一段都必须是标识符，写入模块时各段会成为目录名。
pub fn validate_qualified_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    match name.split('.').find(|segment| !is_identifier(segment)) {
        Some(segment) => Err(format!("segment '{}' is not an identifier", segment)),
        None => Ok(()),
    }
}

/// 冻结后的类型描述，只读
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenType {
    inner: TypeDescriptor,
}

impl FrozenType {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.inner.fields
    }

    /// 显式构造器；`None` 表示使用隐式无参构造器
    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.inner.constructor.as_ref()
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.inner.methods
    }

    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.inner.field(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> TypeDescriptor {
        let mut ty = new_type("com.lee.demo.Foo");
        ty.add_field("id", TypeTag::Int, Visibility::Private).unwrap();
        ty.add_field("name", TypeTag::Str, Visibility::Protected)
            .unwrap();
        ty
    }

    #[test]
    fn test_duplicate_field_leaves_descriptor_unchanged() {
        let mut ty = foo();
        let before = ty.clone();

        let err = ty
            .add_field("id", TypeTag::Long, Visibility::Public)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateField {
                type_name: "com.lee.demo.Foo".to_string(),
                field: "id".to_string(),
            }
        );
        assert_eq!(ty, before);
    }

    #[test]
    fn test_set_constructor_from_snippet() {
        let mut ty = foo();
        ty.set_constructor(
            vec![TypeTag::Int, TypeTag::Str],
            "{ this.id = $1; this.name = $2; }",
        )
        .unwrap();

        let ctor = ty.constructor().unwrap();
        assert_eq!(ctor.params, vec![TypeTag::Int, TypeTag::Str]);
        assert_eq!(ctor.body.len(), 2);
    }

    #[test]
    fn test_constructor_already_set() {
        let mut ty = foo();
        ty.set_constructor(vec![TypeTag::Int], "{ this.id = $1; }")
            .unwrap();
        let err = ty
            .set_constructor(vec![TypeTag::Int], "{ this.id = $1; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::AlreadySet { .. }));
    }

    #[test]
    fn test_constructor_signature_mismatch() {
        let mut ty = foo();

        // 未声明的字段
        let err = ty
            .set_constructor(vec![TypeTag::Int], "{ this.age = $1; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { .. }));

        // 参数不足
        let err = ty
            .set_constructor(vec![TypeTag::Int], "{ this.id = $1; this.name = $2; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { .. }));

        // 类型不一致
        let err = ty
            .set_constructor(vec![TypeTag::Str, TypeTag::Int], "{ this.id = $1; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { .. }));

        // 失败的设置不会留下构造器
        assert!(ty.constructor().is_none());
    }

    #[test]
    fn test_constructor_parameters_align_with_fields() {
        let mut ty = foo();

        // $2 没有初始化任何字段
        let err = ty
            .set_constructor(vec![TypeTag::Int, TypeTag::Str], "{ this.id = $1; }")
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::SignatureMismatch {
                member: "com.lee.demo.Foo.<init>(int,string)".to_string(),
                reason: "$2 does not initialize any field".to_string(),
            }
        );

        // 同一字段赋值两次
        let err = ty
            .set_constructor(vec![TypeTag::Int, TypeTag::Int], "{ this.id = $1; this.id = $2; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { ref reason, .. } if reason.contains("more than once")));

        // 同一参数初始化两个字段
        let mut pair = new_type("com.lee.demo.Pair");
        pair.add_field("a", TypeTag::Int, Visibility::Public).unwrap();
        pair.add_field("b", TypeTag::Int, Visibility::Public).unwrap();
        let err = pair
            .set_constructor(vec![TypeTag::Int], "{ this.a = $1; this.b = $1; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { ref reason, .. } if reason.contains("more than one field")));

        // 参数顺序与字段声明顺序相反
        let err = pair
            .set_constructor(vec![TypeTag::Int, TypeTag::Int], "{ this.b = $1; this.a = $2; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { ref reason, .. } if reason.contains("declared before")));

        // 无字段类型不能声明参数
        let mut empty = new_type("com.lee.demo.Empty");
        let err = empty.set_constructor(vec![TypeTag::Int], Body::empty()).unwrap_err();
        assert!(matches!(err, BuildError::SignatureMismatch { .. }));

        assert!(ty.constructor().is_none());
        assert!(pair.constructor().is_none());
        assert!(empty.constructor().is_none());
    }

    #[test]
    fn test_constructor_may_initialize_a_prefix_of_fields() {
        let mut ty = foo();
        // 语句顺序无关，参数与字段的对应顺序一致即可
        ty.set_constructor(
            vec![TypeTag::Int, TypeTag::Str],
            "{ this.name = $2; this.id = $1; }",
        )
        .unwrap();

        let mut partial = foo();
        partial
            .set_constructor(vec![TypeTag::Str], "{ this.name = $1; }")
            .unwrap();
    }

    #[test]
    fn test_constructor_unsupported_body() {
        let mut ty = foo();
        let err = ty
            .set_constructor(vec![TypeTag::Int], "{ this.id = $1 * 2; }")
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedBodyConstruct { .. }));
    }

    #[test]
    fn test_duplicate_method_by_signature() {
        let mut ty = foo();
        ty.add_method("test", TypeTag::Void, vec![], Body::empty())
            .unwrap();
        ty.add_method("test", TypeTag::Void, vec![TypeTag::Int], Body::empty())
            .unwrap();

        let err = ty
            .add_method("test", TypeTag::Int, vec![], Body::empty())
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateMethod {
                type_name: "com.lee.demo.Foo".to_string(),
                signature: "test()".to_string(),
            }
        );
        assert_eq!(ty.methods().len(), 2);
    }

    #[test]
    fn test_member_order_enforced() {
        let mut ty = foo();
        ty.add_method("test", TypeTag::Void, vec![], Body::empty())
            .unwrap();

        let err = ty
            .add_field("extra", TypeTag::Int, Visibility::Public)
            .unwrap_err();
        assert!(matches!(err, BuildError::OutOfOrder { stage: "methods", .. }));

        let err = ty.set_constructor(vec![], Body::empty()).unwrap_err();
        assert!(matches!(err, BuildError::OutOfOrder { .. }));
    }

    #[test]
    fn test_insert_before() {
        let mut ty = foo();
        ty.add_method("test", TypeTag::Void, vec![], Body::empty())
            .unwrap();
        ty.insert_before("test", &[], r#"println(id + " " + name);"#)
            .unwrap();

        let method = &ty.methods()[0];
        assert_eq!(method.body.len(), 2);
        assert!(matches!(method.body[0], Body::Source(_)));

        let err = ty
            .insert_before("test", &[TypeTag::Int], Body::empty())
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownMethod {
                type_name: "com.lee.demo.Foo".to_string(),
                signature: "test(int)".to_string(),
            }
        );
    }

    #[test]
    fn test_void_rejected() {
        let mut ty = foo();
        assert!(ty
            .add_field("nothing", TypeTag::Void, Visibility::Public)
            .is_err());
        assert!(ty
            .add_method("m", TypeTag::Void, vec![TypeTag::Void], Body::empty())
            .is_err());
    }

    #[test]
    fn test_freeze() {
        let frozen = foo().freeze().unwrap();
        assert_eq!(frozen.name(), "com.lee.demo.Foo");
        assert_eq!(frozen.fields().len(), 2);
        assert!(frozen.constructor().is_none());
        assert_eq!(frozen.field("name").map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_freeze_rejects_bad_names() {
        for name in ["", "com..Foo", "com.1abc.Foo", "com/lee/Foo", ".Foo"] {
            let err = new_type(name).freeze().unwrap_err();
            assert!(matches!(err, BuildError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn test_invalid_member_names() {
        let mut ty = new_type("Foo");
        assert!(ty.add_field("a.b", TypeTag::Int, Visibility::Public).is_err());
        assert!(ty.add_method("", TypeTag::Void, vec![], Body::empty()).is_err());
    }
}
