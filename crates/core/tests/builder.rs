//! End-to-end builds through the public API: in-memory and file-based
//! scripts, imports, exports, the file cache and catalog extensions.

use btrpsl_core::{
    ArgValue, BasicIncludes, BuildError, ConstraintBuilder, ConstraintKind, ElementKind, OperandType,
    ParamSpec, PathBasedIncludes, Script, ScriptBuilder,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn messages(err: BuildError) -> Vec<String> {
    err.diagnostics().iter().map(|d| d.message.clone()).collect()
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// ──────────────────────────────────────────────
// Scripts built from strings
// ──────────────────────────────────────────────

#[test]
fn lonely_over_every_declared_vm() {
    let script = ScriptBuilder::new()
        .build("namespace foo; VM[1..5]:tiny;\nVM[6..10]:small;\nlonely($me);")
        .unwrap();
    assert_eq!(script.id(), "foo");
    assert_eq!(script.vms().len(), 10);
    assert_eq!(script.constraints().len(), 1);
    let lonely = &script.constraints()[0];
    assert_eq!(lonely.name(), "lonely");
    assert!(!lonely.is_continuous());
    assert_eq!(lonely.involved_vms().len(), 10);
}

#[test]
fn me_cannot_be_reassigned() {
    let err = ScriptBuilder::new()
        .build("namespace foo;\nVM1 : tiny;\n$me = 7;")
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["unable to re-assign the immutable variable '$me'"]
    );
}

#[test]
fn bad_constraint_calls_yield_one_diagnostic_each() {
    let builder = ScriptBuilder::new();
    let err = builder
        .build("namespace foo;\nVM1 : tiny;\nban($me);")
        .unwrap_err();
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 3);
    assert!(diagnostics[0]
        .message
        .contains("ban(vms: set<VM>, nodes: set<node>)"));

    let err = builder
        .build("namespace bar;\nVM1 : tiny;\n@N1 : defaultNode;\nban(@N1, $me);")
        .unwrap_err();
    assert_eq!(err.diagnostics().len(), 1);
    assert!(err.diagnostics()[0]
        .message
        .starts_with("unable to call ban(vms: set<VM>, nodes: set<node>)"));
}

#[test]
fn diagnostics_come_sorted_by_position() {
    let err = ScriptBuilder::new()
        .build("namespace foo;\n$a = $b;\nVM1 : huge;\n$c = $d;")
        .unwrap_err();
    let lines: Vec<u32> = err.diagnostics().iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![2, 3, 4]);
    assert_eq!(
        messages(err),
        vec![
            "unknown variable '$b'",
            "unknown template 'huge'",
            "unknown variable '$d'",
        ]
    );
}

#[test]
fn control_flow_accumulates_into_outer_variables() {
    let script = ScriptBuilder::new()
        .build(
            "namespace foo;\n\
             VM[1..4] : tiny;\n\
             $n = 0;\n\
             for $vm in $me {\n\
                 $n += 1;\n\
             }\n\
             if $n == 4 {\n\
                 spread($me);\n\
             } else {\n\
                 lonely($me);\n\
             }\n\
             export $n;",
        )
        .unwrap();
    assert_eq!(script.exported("$n").unwrap().value.to_string(), "4");
    assert_eq!(script.constraints()[0].name(), "spread");
}

#[test]
fn scripts_without_catalog_reject_constraints() {
    let err = ScriptBuilder::new()
        .without_catalog()
        .build("namespace foo;\nVM1 : tiny;\nspread($me);")
        .unwrap_err();
    assert_eq!(messages(err), vec!["no constraint catalog available"]);
}

#[test]
fn failing_template_targets_are_skipped() {
    let builder = ScriptBuilder::new();
    let err = builder
        .build("namespace app;\nVM[1..3] : tiny;\nVM[2..4] : tiny;\n$last = VM4;")
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec![
            "VM 'app.VM2' is already declared",
            "VM 'app.VM3' is already declared",
        ]
    );
    // VM4 was declared despite its siblings failing.
    let vm4 = builder.naming().resolve(ElementKind::Vm, "app.VM4");
    assert!(vm4.is_some());
}

#[test]
fn templates_only_build_their_own_kind() {
    let err = ScriptBuilder::new()
        .build("namespace app;\nVM1 : defaultNode;\n@N1 : tiny;\nVM2 : tiny;\nspread($me);")
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec![
            "template 'defaultNode' builds nodes, it cannot declare the VM 'VM1'",
            "template 'tiny' builds VMs, it cannot declare the node '@N1'",
        ]
    );
}

#[test]
fn large_declarations() {
    let script = ScriptBuilder::new()
        .build("namespace big;\nVM[1..20000] : tiny;\nVM[20001..20010] : small;\nlonely($me);")
        .unwrap();
    assert_eq!(script.vms().len(), 20_010);
    assert_eq!(script.constraints()[0].involved_vms().len(), 20_010);
}

// ──────────────────────────────────────────────
// Imports and exports
// ──────────────────────────────────────────────

fn build_into(builder: &ScriptBuilder, includes: &BasicIncludes, src: &str) -> Arc<Script> {
    let script = Arc::new(builder.build(src).unwrap());
    includes.add(script.clone());
    script
}

#[test]
fn dependency_tree_rendering() {
    let includes = Arc::new(BasicIncludes::new());
    let builder = ScriptBuilder::new().with_includes(includes.clone());
    build_into(&builder, &includes, "namespace in.titi;");
    build_into(&builder, &includes, "namespace in.toto;");
    build_into(&builder, &includes, "namespace out.foo;");
    build_into(&builder, &includes, "namespace out.bar;");
    build_into(&builder, &includes, "namespace b;\nimport in.*;");
    build_into(&builder, &includes, "namespace c;\nimport out.foo;\nimport out.bar;");
    let a = builder.build("namespace a;\nimport b;\nimport c;").unwrap();
    assert_eq!(
        a.pretty_dependencies(),
        "a\n\
         |- b\n   |- in.titi\n   \\- in.toto\n\
         \\- c\n   |- out.foo\n   \\- out.bar\n"
    );
}

#[test]
fn exports_honor_their_scopes() {
    // Scopes are matched against the namespace of the importer, not its id.
    let includes = Arc::new(BasicIncludes::new());
    let builder = ScriptBuilder::new().with_includes(includes.clone());
    build_into(
        &builder,
        &includes,
        "namespace lib;\nVM[1..3] : tiny;\n$x = {VM1, VM2};\nexport $x to foo, bar.*;",
    );

    let foo = builder
        .build("namespace foo.app;\nimport lib;\n$y = $x;\n$all = $lib;\nexport $y, $all;")
        .unwrap();
    assert_eq!(foo.exported("$y").unwrap().value.to_string(), "{lib.VM1, lib.VM2}");
    assert_eq!(foo.exported("$all").unwrap().value.pretty_type(), "set<VM>");
    assert_eq!(foo.dependencies()[0].id(), "lib");

    assert!(builder.build("namespace bar.baz.app;\nimport lib;\n$y = $x;").is_ok());

    let err = builder
        .build("namespace zog.app;\nimport lib;\n$y = $x;")
        .unwrap_err();
    assert_eq!(messages(err), vec!["unknown variable '$x'"]);
}

#[test]
fn global_export_scope_hides_the_whole_script() {
    let includes = Arc::new(BasicIncludes::new());
    let builder = ScriptBuilder::new().with_includes(includes.clone());
    build_into(
        &builder,
        &includes,
        "namespace lib;\nVM1 : tiny;\nexport $me to friends.*;",
    );
    assert!(builder
        .build("namespace friends.a.app;\nimport lib;\nspread($lib);")
        .is_ok());
    let err = builder
        .build("namespace other.app;\nimport lib;\nspread($lib);")
        .unwrap_err();
    assert_eq!(messages(err), vec!["unknown variable '$lib'"]);
}

#[test]
fn wildcard_imports_bind_the_union_of_vms() {
    let includes = Arc::new(BasicIncludes::new());
    let builder = ScriptBuilder::new().with_includes(includes.clone());
    build_into(&builder, &includes, "namespace dc.a;\nVM[1..2] : tiny;");
    build_into(&builder, &includes, "namespace dc.b;\nVM[1..3] : tiny;");
    let app = builder
        .build("namespace app;\nimport dc.*;\n$n = #$dc;\nexport $n;")
        .unwrap();
    assert_eq!(app.exported("$n").unwrap().value.to_string(), "5");
    assert_eq!(app.dependencies().len(), 2);
}

#[test]
fn unknown_imports_are_reported() {
    let err = ScriptBuilder::new()
        .build("namespace app;\nimport nowhere;")
        .unwrap_err();
    assert_eq!(messages(err), vec!["unable to locate 'nowhere'"]);
    assert!(ScriptBuilder::new()
        .build("namespace app;\nimport nowhere.*;")
        .is_ok());
}

// ──────────────────────────────────────────────
// File builds
// ──────────────────────────────────────────────

#[test]
fn unchanged_files_come_from_the_cache() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "web.btrp", "namespace dc.web;\nVM1 : tiny;\n");
    let path = tmp.path().join("web.btrp");
    let builder = ScriptBuilder::new();

    let first = builder.build_file(&path).unwrap();
    let second = builder.build_file(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builder.cache().len(), 1);

    fs::write(&path, "namespace dc.web;\nVM[1..2] : tiny;\n").unwrap();
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    drop(file);

    let third = builder.build_file(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.vms().len(), 2);
}

#[test]
fn file_name_must_match_the_local_name() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "other.btrp", "namespace dc.web;\nVM1 : tiny;\n");
    let err = ScriptBuilder::new()
        .build_file(tmp.path().join("other.btrp"))
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["the script 'dc.web' must be stored in 'web.btrp', not 'other.btrp'"]
    );
}

#[test]
fn missing_files_are_io_errors() {
    let tmp = TempDir::new().unwrap();
    let err = ScriptBuilder::new()
        .build_file(tmp.path().join("nope.btrp"))
        .unwrap_err();
    assert!(matches!(err, BuildError::Io { .. }));
}

#[test]
fn imports_resolve_through_directories() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "dc/common.btrp",
        "namespace dc.common;\nVM[1..2] : tiny;\n$pair = $me;\nexport $pair;\n",
    );
    write(
        tmp.path(),
        "app.btrp",
        "namespace app;\nimport dc.common;\nspread($pair);\n",
    );
    let includes = PathBasedIncludes::new(vec![tmp.path().to_path_buf()]);
    let builder = ScriptBuilder::new().with_includes(Arc::new(includes));
    let app = builder.build_file(tmp.path().join("app.btrp")).unwrap();
    assert_eq!(app.dependencies()[0].id(), "dc.common");
    assert_eq!(app.constraints()[0].involved_vms().len(), 2);
}

#[test]
fn import_cycles_are_detected() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.btrp", "namespace a;\nimport b;\n");
    write(tmp.path(), "b.btrp", "namespace b;\nimport a;\n");
    let includes = PathBasedIncludes::new(vec![tmp.path().to_path_buf()]);
    let builder = ScriptBuilder::new().with_includes(Arc::new(includes));
    let err = builder.build_file(tmp.path().join("a.btrp")).unwrap_err();
    let all = messages(err).join("\n");
    assert!(all.contains("unable to import 'b'"), "{}", all);
    assert!(all.contains("cyclic import of 'a'"), "{}", all);

    // Nothing stays marked as in progress after a failed build.
    write(tmp.path(), "b.btrp", "namespace b;\n");
    let file = fs::OpenOptions::new()
        .write(true)
        .open(tmp.path().join("b.btrp"))
        .unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    drop(file);
    assert!(builder.build_file(tmp.path().join("a.btrp")).is_ok());
}

// ──────────────────────────────────────────────
// Catalog extensions
// ──────────────────────────────────────────────

struct Maintain {
    params: Vec<ParamSpec>,
}

impl ConstraintBuilder for Maintain {
    fn keyword(&self) -> &str {
        "maintain"
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn build(&self, args: Vec<ArgValue>) -> Result<ConstraintKind, String> {
        let mut args = args.into_iter();
        let vms = match args.next() {
            Some(arg) => arg.into_elements()?,
            None => return Err("missing VMs".to_owned()),
        };
        Ok(ConstraintKind::Other {
            name: "maintain".to_owned(),
            vms,
            nodes: Vec::new(),
        })
    }
}

#[test]
fn custom_constraints_can_be_registered() {
    let mut builder = ScriptBuilder::new();
    let catalog = builder.catalog_mut().unwrap();
    let maintain = Arc::new(Maintain {
        params: vec![ParamSpec::set("vms", OperandType::Vm)],
    });
    assert!(catalog.register(maintain.clone()));
    assert!(!catalog.register(maintain));

    let script = builder
        .build("namespace foo;\nVM[1..3] : tiny;\n>>maintain($me);")
        .unwrap();
    let c = &script.constraints()[0];
    assert_eq!(c.name(), "maintain");
    assert!(c.is_continuous());
    assert_eq!(c.involved_vms().len(), 3);

    let err = builder
        .build("namespace bar;\nmaintain(3);")
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["unable to call maintain(vms: set<VM>) with 'maintain(number)'"]
    );
}
