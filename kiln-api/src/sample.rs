//! 内置示例类型
//!
//! `kiln demo` 与集成测试共用的 `com.lee.demo.Foo`：
//!
//! ```text
//! class Foo {
//!     private int id;
//!     protected string name;
//!     Foo(int, string) { this.id = $1; this.name = $2; }
//!     void test() { System.out.println(id + " " + name); }
//! }
//! ```

use crate::error::KilnError;
use kiln_core::{TypeDescriptor, TypeTag, Visibility};

pub const SAMPLE_TYPE: &str = "com.lee.demo.Foo";

/// `new Foo(24, "sample").test()` 打印的行
pub const SAMPLE_OUTPUT: &str = "24 sample";

/// 构建示例类型描述；`test()` 初始为空体，打印语句通过
/// [`TypeDescriptor::insert_before`] 插入。
pub fn sample_descriptor() -> Result<TypeDescriptor, KilnError> {
    let mut ty = TypeDescriptor::new(SAMPLE_TYPE);
    ty.add_field("id", TypeTag::Int, Visibility::Private)?;
    ty.add_field("name", TypeTag::Str, Visibility::Protected)?;
    ty.set_constructor(
        vec![TypeTag::Int, TypeTag::Str],
        "{ this.id = $1; this.name = $2; }",
    )?;
    ty.add_method("test", TypeTag::Void, vec![], "{}")?;
    ty.insert_before("test", &[], r#"{ System.out.println(id + " " + name); }"#)?;
    Ok(ty)
}
