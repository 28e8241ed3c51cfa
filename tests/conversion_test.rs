//! End-to-end conversions through the public API

use bp2bazel::config::{DirectoryDefault, RuleSchema};
use bp2bazel::{Bp2BuildConfig, ConversionContext, ConversionResult, Converter, FsWorkspace, InMemoryWorkspace, ModuleGraph, PackageBoundaries};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn enabled() -> Bp2BuildConfig {
    Bp2BuildConfig::new().with_directory(".", DirectoryDefault::EnabledRecursive)
}

fn graph(modules: serde_json::Value) -> ModuleGraph {
    ModuleGraph::from_json(&json!({ "modules": modules }).to_string()).unwrap()
}

fn convert(graph: ModuleGraph, config: Bp2BuildConfig, boundaries: Arc<dyn PackageBoundaries>) -> ConversionResult {
    Converter::new(ConversionContext::new(graph, config, boundaries))
        .run()
        .unwrap()
}

#[test]
fn test_plain_scalars_render_without_select() {
    let config: Bp2BuildConfig = Bp2BuildConfig::from_json(
        &json!({
            "directories": {".": "enabled_recursive"},
            "rules": {
                "custom_module": {
                    "rule_class": "custom_rule",
                    "attributes": {
                        "flag": {"kind": "bool"},
                        "label": {"kind": "string"}
                    }
                }
            }
        })
        .to_string(),
    )
    .unwrap();
    let modules = graph(json!([
        {"name": "foo", "type": "custom_module", "dir": "pkg",
         "properties": {"flag": true, "label": ""}}
    ]));

    let result = convert(modules, config, Arc::new(InMemoryWorkspace::new()));

    assert_eq!(result.files.len(), 1);
    assert_eq!(
        result.files["pkg"],
        "custom_rule(\n    name = \"foo\",\n    flag = True,\n    label = \"\",\n)\n"
    );
    assert!(!result.files["pkg"].contains("select("));
}

#[test]
fn test_two_arch_srcs_render_one_select() {
    let modules = graph(json!([
        {"name": "foo", "type": "filegroup", "dir": "pkg",
         "properties": {"arch": {"arm": {"srcs": ["arm.c"]}, "x86": {"srcs": ["x86_a.c", "x86_b.c"]}}}}
    ]));
    let ws = InMemoryWorkspace::new().with_files(["pkg/arm.c", "pkg/x86_a.c", "pkg/x86_b.c"]);

    let result = convert(modules, enabled(), Arc::new(ws));

    assert_snapshot!(result.files["pkg"], @r#"
    filegroup(
        name = "foo",
        srcs = select({
            "//build/bazel/platforms/arch:arm": ["arm.c"],
            "//build/bazel/platforms/arch:x86": [
                "x86_a.c",
                "x86_b.c",
            ],
            "//conditions:default": [],
        }),
    )
    "#);
}

#[test]
fn test_dependency_on_disabled_module_produces_nothing() {
    let modules = graph(json!([
        {"name": "a", "type": "filegroup", "dir": "x", "deps": ["b"]},
        {"name": "b", "type": "filegroup", "dir": "x",
         "bazel_module": {"bp2build_available": false}}
    ]));

    let result = convert(modules, enabled(), Arc::new(InMemoryWorkspace::new()));

    assert!(result.files.is_empty());
    assert_eq!(result.metrics.generated_targets, 0);
    assert_eq!(result.metrics.dropped_modules["a"].kind, "unconverted_dependency");
}

#[test]
fn test_chain_drop_spares_independent_dependent() {
    // m1 -> m2 -> {m3 (disabled), m4}; m4 -> m5
    let modules = graph(json!([
        {"name": "m1", "type": "filegroup", "dir": "a", "deps": ["m2"]},
        {"name": "m2", "type": "filegroup", "dir": "a", "deps": ["m3", "m4"]},
        {"name": "m3", "type": "filegroup", "dir": "off"},
        {"name": "m4", "type": "filegroup", "dir": "b",
         "properties": {"srcs": [":m5"]}, "deps": ["m5"]},
        {"name": "m5", "type": "filegroup", "dir": "b"}
    ]));
    let config = enabled().with_directory("off", DirectoryDefault::Disabled);

    let result = convert(modules, config, Arc::new(InMemoryWorkspace::new()));

    assert!(!result.files.contains_key("a"));
    assert!(result.files["b"].contains("name = \"m4\""));
    assert!(!result.files["b"].contains("m2"));
    assert_eq!(
        result.metrics.dropped_modules.keys().collect::<Vec<_>>(),
        vec!["m1", "m2"]
    );
}

#[test]
fn test_loads_grouped_per_location() {
    let config = Bp2BuildConfig::from_json(
        &json!({
            "directories": {".": "enabled_recursive"},
            "rules": {
                "java_binary_host": {
                    "rule_class": "java_binary",
                    "load": "//build/bazel/rules/java:rules.bzl"
                },
                "cc_test_host": {
                    "rule_class": "cc_library",
                    "load": "//build/bazel/rules/cc:rules.bzl"
                },
                "cc_tool": {
                    "rule_class": "cc_binary",
                    "load": "//build/bazel/rules/cc:rules.bzl"
                }
            }
        })
        .to_string(),
    )
    .unwrap();
    let modules = graph(json!([
        {"name": "j", "type": "java_binary_host", "dir": "p"},
        {"name": "l", "type": "cc_test_host", "dir": "p"},
        {"name": "b", "type": "cc_tool", "dir": "p"}
    ]));

    let result = convert(modules, config, Arc::new(InMemoryWorkspace::new()));

    let header: Vec<&str> = result.files["p"].lines().take(3).collect();
    assert_eq!(
        header,
        vec![
            r#"load("//build/bazel/rules/cc:rules.bzl", "cc_binary", "cc_library")"#,
            r#"load("//build/bazel/rules/java:rules.bzl", "java_binary")"#,
            "",
        ]
    );
}

#[test]
fn test_conversion_is_deterministic() {
    let modules = json!([
        {"name": "libz", "type": "cc_library", "dir": "external/zlib",
         "properties": {"srcs": ["*.c"], "cflags": ["-O2", "-Wall"],
                        "target": {"windows": {"enabled": false}},
                        "arch": {"arm64": {"cflags": ["-DARM64"]}}}},
        {"name": "gen", "type": "genrule", "dir": "tools",
         "properties": {"srcs": ["in.txt"], "out": ["out.h"], "cmd": "cp $(in) $(out)"}},
        {"name": "app", "type": "cc_binary", "dir": "app",
         "properties": {"srcs": ["main.cpp"], "static_libs": ["libz"]}, "deps": ["libz"]}
    ]);
    let ws = || {
        Arc::new(InMemoryWorkspace::new().with_files([
            "external/zlib/adler32.c",
            "external/zlib/inflate.c",
            "tools/in.txt",
            "app/main.cpp",
        ]))
    };

    let first = convert(graph(modules.clone()), enabled(), ws());
    let second = convert(graph(modules), enabled(), ws());

    assert_eq!(first.files, second.files);
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.files.len(), 3);
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_reconverting_over_own_output_generates_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "foo/foo.c", "int foo;\n");
    write(temp.path(), "foo/data.txt", "data\n");
    let modules = json!([
        {"name": "libfoo", "type": "cc_library_static", "dir": "foo",
         "properties": {"srcs": ["foo.c"]}},
        {"name": "data", "type": "filegroup", "dir": "foo",
         "properties": {"srcs": ["data.txt"]}}
    ]);

    let first = convert(
        graph(modules.clone()),
        enabled(),
        Arc::new(FsWorkspace::scan(temp.path()).unwrap()),
    );
    assert_eq!(first.metrics.generated_targets, 2);
    for (dir, content) in &first.files {
        write(temp.path(), &format!("{dir}/BUILD.bazel"), content);
    }

    let second = convert(
        graph(modules),
        enabled(),
        Arc::new(FsWorkspace::scan(temp.path()).unwrap()),
    );

    assert_eq!(second.metrics.generated_targets, 0);
    assert_eq!(second.metrics.handwritten_collisions.len(), 2);
    assert!(second.files.is_empty());
}

#[test]
fn test_schema_can_be_registered_in_code() {
    let mut config = enabled();
    config.rules.insert(
        "prebuilt_etc".to_string(),
        RuleSchema::new("prebuilt_file").with_load("//build/bazel/rules:prebuilt_file.bzl"),
    );
    let modules = graph(json!([{"name": "hosts", "type": "prebuilt_etc", "dir": "etc"}]));

    let result = convert(modules, config, Arc::new(InMemoryWorkspace::new()));

    assert_eq!(
        result.files["etc"],
        "load(\"//build/bazel/rules:prebuilt_file.bzl\", \"prebuilt_file\")\n\nprebuilt_file(\n    name = \"hosts\",\n)\n"
    );
}
