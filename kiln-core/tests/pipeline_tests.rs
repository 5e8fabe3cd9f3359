//! 端到端流水线测试：描述 → 生成 → 写入 → 加载 → 调用

mod common;

use common::*;
use kiln_core::binary::ModuleInfo;
use kiln_core::{construct, invoke, BuildError, InvokeError, LoadError, TypeTag, Value, Visibility};
use kiln_vfs::{NativeFileSystem, VirtualFileSystem};
use std::sync::Arc;

#[test]
fn test_foo_scenario_from_disk() {
    let dir = temp_dir("foo");
    let native: Arc<dyn VirtualFileSystem> = Arc::new(NativeFileSystem::new());

    let path = kiln_core::ModuleWriter::new(native.clone())
        .write(&foo_module(), &dir)
        .unwrap();
    assert_eq!(path, dir.join("com/lee/demo/Foo.kmod"));
    assert!(path.is_file());

    // 新的加载器，只凭名字和目录
    let (loader, sink) = open_loader(&dir, native);
    let foo = loader.load(FOO).unwrap();
    let instance = construct(&foo, &[Value::Int(24), Value::from("sample")]).unwrap();
    let result = invoke(&instance, "test", &[]).unwrap();

    assert_eq!(result, Value::Null);
    assert_eq!(sink.lines(), vec!["24 sample"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_fields_equal_constructor_arguments() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (loader, _sink) = open_loader("/out", Arc::new(fs));
    let foo = loader.load(FOO).unwrap();

    for (id, name) in [(0, ""), (-5, "neg"), (i32::MAX, "max")] {
        let obj = construct(&foo, &[Value::Int(id), Value::from(name)]).unwrap();
        assert_eq!(obj.field("id").unwrap(), Value::Int(id));
        assert_eq!(obj.field("name").unwrap(), Value::from(name));
    }
}

#[test]
fn test_generation_is_byte_identical() {
    let a = foo_module();
    let b = foo_module();
    assert_eq!(a.bytes(), b.bytes());

    let fs = write_to_memory(&a, "/one");
    let written = fs
        .read_file(std::path::Path::new("/one/com/lee/demo/Foo.kmod"))
        .unwrap();
    assert_eq!(written, b.bytes());
}

#[test]
fn test_invoke_is_idempotent() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (loader, sink) = open_loader("/out", Arc::new(fs));
    let obj = construct(
        &loader.load(FOO).unwrap(),
        &[Value::Int(24), Value::from("sample")],
    )
    .unwrap();

    obj.invoke("test", &[]).unwrap();
    let first = sink.take();
    obj.invoke("test", &[]).unwrap();
    let second = sink.take();

    assert_eq!(first, second);
    assert_eq!(first, vec!["24 sample"]);
}

#[test]
fn test_duplicate_field_leaves_descriptor_unchanged() {
    let mut ty = kiln_core::descriptor::new_type(FOO);
    ty.add_field("id", TypeTag::Int, Visibility::Private).unwrap();
    let before = ty.clone();

    let err = ty
        .add_field("id", TypeTag::Str, Visibility::Public)
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateField { .. }));
    assert_eq!(ty, before);
}

#[test]
fn test_wrong_arity_constructs_nothing() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (loader, sink) = open_loader("/out", Arc::new(fs));
    let foo = loader.load(FOO).unwrap();

    let err = construct(&foo, &[Value::Int(24)]).unwrap_err();
    assert!(matches!(
        err,
        InvokeError::ArgumentArity {
            expected: 2,
            found: 1,
            ..
        }
    ));
    assert!(sink.lines().is_empty());
}

#[test]
fn test_invoke_after_close_fails() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (loader, sink) = open_loader("/out", Arc::new(fs));
    let obj = construct(
        &loader.load(FOO).unwrap(),
        &[Value::Int(24), Value::from("sample")],
    )
    .unwrap();

    loader.close();

    assert_eq!(
        invoke(&obj, "test", &[]).unwrap_err(),
        InvokeError::UseAfterClose {
            type_name: FOO.to_string()
        }
    );
    assert!(sink.lines().is_empty());
}

#[test]
fn test_two_loaders_are_isolated() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (first, first_sink) = open_loader("/out", Arc::new(fs.clone()));
    let (second, second_sink) = open_loader("/out", Arc::new(fs));

    let a = first.load(FOO).unwrap();
    let b = second.load(FOO).unwrap();
    assert!(!a.same_type(&b));

    let obj = construct(&b, &[Value::Int(7), Value::from("seven")]).unwrap();
    first.close();

    // 关闭第一个加载器不影响第二个
    obj.invoke("test", &[]).unwrap();
    assert_eq!(second_sink.lines(), vec!["7 seven"]);
    assert!(first_sink.lines().is_empty());
}

#[test]
fn test_missing_module() {
    let fs = write_to_memory(&foo_module(), "/out");
    let (loader, _sink) = open_loader("/elsewhere", Arc::new(fs));
    assert!(matches!(
        loader.load(FOO),
        Err(LoadError::ModuleNotFound { .. })
    ));
}

#[test]
fn test_module_info() {
    let info = ModuleInfo::from_bytes(foo_module().bytes()).unwrap();
    assert_eq!(info.type_name, FOO);
    assert_eq!(info.version, (1, 0, 0));
    assert_eq!(info.sections.len(), 6);
    assert_eq!(info.fields, vec!["private int id", "protected string name"]);
    assert_eq!(info.constructor, "<init>(int,string)");
    assert_eq!(info.methods, vec!["void test()"]);

    let text = info.to_string();
    assert!(text.starts_with("Kiln Binary Module"));
    assert!(text.contains("Type: com.lee.demo.Foo"));
}
