use std::{cell::Cell, rc::Rc};

use knot::{HostValue, Vm, VmConfig, VmError};

fn new_vm() -> Vm {
    Vm::new(VmConfig::default()).expect("vm")
}

#[test]
fn test_call_verb_on_builtin_and_word() {
    let mut vm = new_vm();
    assert_eq!(
        vm.call_verb("+", &[2.into(), 3.into()]).unwrap(),
        vec![HostValue::Int(5)]
    );

    vm.execute(": sq dup * ;", "defs").unwrap();
    assert_eq!(
        vm.call_verb("sq", &[7.into()]).unwrap(),
        vec![HostValue::Int(49)]
    );
    // The trampoline is compiled once per verb.
    let cells = vm.leak_report().cells;
    vm.call_verb("sq", &[8.into()]).unwrap();
    assert_eq!(vm.leak_report().cells, cells);
}

#[test]
fn test_call_verb_unknown_name() {
    let mut vm = new_vm();
    assert_eq!(
        vm.call_verb("no-such-verb", &[]),
        Err(VmError::UnknownWord("no-such-verb".into()))
    );
}

#[test]
fn test_call_verb_copies_arrays_in_and_out() {
    let mut vm = new_vm();
    let array = HostValue::from(vec![1, 2, 3]);
    assert_eq!(
        vm.call_verb("length", &[array.clone()]).unwrap(),
        vec![HostValue::Int(3)]
    );
    assert_eq!(vm.call_verb("dup", &[array.clone()]).unwrap(), vec![array.clone(), array]);
    assert_eq!(vm.heap().live_blocks(), 0);
}

#[test]
fn test_foreign_verb() {
    let mut vm = new_vm();
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    vm.register_foreign_verb("host-add", move |vm| {
        seen.set(seen.get() + 1);
        let b = vm.pop_value()?;
        let a = vm.pop_value()?;
        match (a, b) {
            (HostValue::Int(a), HostValue::Int(b)) => vm.push_value(&HostValue::Int(a + b)),
            _ => Err(VmError::TypeMismatch {
                op: "host-add",
                expected: "integer",
                found: "other",
            }),
        }
    })
    .unwrap();

    assert_eq!(
        vm.execute("2 3 host-add 10 host-add", "foreign").unwrap(),
        vec![HostValue::Int(15)]
    );
    assert_eq!(
        vm.call_verb("host-add", &[1.into(), 1.into()]).unwrap(),
        vec![HostValue::Int(2)]
    );
    assert_eq!(calls.get(), 3);

    assert!(matches!(
        vm.execute("\"x\" 1 host-add", "bad"),
        Err(VmError::TypeMismatch { op: "host-add", .. })
    ));
}

#[test]
fn test_foreign_verb_shadows_word() {
    let mut vm = new_vm();
    vm.execute(": answer 1 ;", "word").unwrap();
    vm.register_foreign_verb("answer", |vm| vm.push_value(&HostValue::Int(42)))
        .unwrap();
    assert_eq!(
        vm.call_verb("answer", &[]).unwrap(),
        vec![HostValue::Int(42)]
    );
    assert_eq!(vm.execute("answer", "top").unwrap(), vec![HostValue::Int(42)]);
    assert_eq!(
        vm.execute(": twice-answer answer answer + ; twice-answer", "nested")
            .unwrap(),
        vec![HostValue::Int(84)]
    );
}

#[test]
fn test_call_verb_falls_back_to_method_missing() {
    let mut vm = new_vm();
    vm.execute(": method-missing drop 7 ;", "handler").unwrap();
    assert_eq!(
        vm.call_verb("never-seen-name", &[]).unwrap(),
        vec![HostValue::Int(7)]
    );
}

#[test]
fn test_get_and_set_value() {
    let mut vm = new_vm();
    assert_eq!(vm.get_value("greeting").unwrap(), None);

    vm.set_value("greeting", &"hi".into()).unwrap();
    vm.set_value("greeting", &"hello".into()).unwrap();
    assert_eq!(
        vm.get_value("greeting").unwrap(),
        Some(HostValue::Str("hello".into()))
    );
    assert_eq!(vm.heap().live_blocks(), 1);

    vm.set_value("limit", &10.into()).unwrap();
    assert_eq!(
        vm.execute("'limit lookup 1 +", "global").unwrap(),
        vec![HostValue::Int(11)]
    );
}

#[test]
fn test_script_cache() {
    let mut vm = new_vm();
    vm.execute("1 2 +", "sum").unwrap();
    let first = vm.cached_script("sum").cloned().unwrap();
    let cells = vm.leak_report().cells;

    assert_eq!(vm.execute("1 2 +", "sum").unwrap(), vec![HostValue::Int(3)]);
    assert_eq!(vm.cached_script("sum"), Some(&first));
    assert_eq!(vm.leak_report().cells, cells);

    assert_eq!(vm.execute("2 2 +", "sum").unwrap(), vec![HostValue::Int(4)]);
    let second = vm.cached_script("sum").unwrap();
    assert_ne!(second.digest, first.digest);
    assert_ne!(second.entry, first.entry);
}

#[test]
fn test_compile_error_is_not_cached() {
    let mut vm = new_vm();
    assert!(matches!(
        vm.execute(": broken", "broken"),
        Err(VmError::Compile { line: 1, .. })
    ));
    assert!(vm.cached_script("broken").is_none());
    assert_eq!(vm.leak_report().tasks, 0);
}

#[test]
fn test_leak_report_serializes() {
    let vm = new_vm();
    let report = serde_json::to_value(vm.leak_report()).unwrap();
    assert_eq!(report["tasks"], 0);
    assert_eq!(report["heap_blocks"], 0);
}
