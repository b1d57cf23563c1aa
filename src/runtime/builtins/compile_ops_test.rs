use crate::{
    HostValue,
    config::VmConfig,
    error::VmError,
    runtime::{task::Mode, vm::Vm},
};

fn test_vm() -> Vm {
    Vm::new(VmConfig::default()).unwrap()
}

#[test]
fn immediate_words_live_in_the_compile_dictionary() {
    let vm = test_vm();
    let colon = vm.cells().lookup_symbol(":").unwrap();
    let dup = vm.cells().lookup_symbol("dup").unwrap();
    assert!(vm.defaults().compile.builtin(colon).is_some());
    assert!(vm.defaults().run.builtin(colon).is_none());
    assert!(vm.defaults().compile.builtin(dup).is_none());
    let semicolon = vm.cells().lookup_symbol(";").unwrap();
    assert!(vm.defaults().compile.builtin(semicolon).is_some());
}

#[test]
fn if_else_then_patches_relative_offsets() {
    let mut vm = test_vm();
    let task = vm.spawn_held_task(0);
    let entry = vm.compile(task, "1 if 2 else 3 then").unwrap();
    vm.reclaim_task(task);

    insta::assert_snapshot!(vm.disassemble(entry, 8), @r"
    0000 int 1
    0001 ?branch
    0002 int 4
    0003 int 2
    0004 branch
    0005 int 2
    0006 int 3
    0007 next
    ");
}

#[test]
fn conditionals_pick_a_branch() {
    let mut vm = test_vm();
    assert_eq!(
        vm.execute("1 if 2 else 3 then", "t").unwrap(),
        vec![HostValue::Int(2)]
    );
    assert_eq!(
        vm.execute("0 if 2 else 3 then", "f").unwrap(),
        vec![HostValue::Int(3)]
    );
    assert!(vm.execute("0 if 2 then", "n").unwrap().is_empty());
}

#[test]
fn begin_until_loops_backwards() {
    let mut vm = test_vm();
    let stack = vm.execute("0 begin 1 + dup 5 = until", "loop").unwrap();
    assert_eq!(stack, vec![HostValue::Int(5)]);
}

#[test]
fn colon_definitions_compile_to_words() {
    let mut vm = test_vm();
    let stack = vm.execute(": sq dup * ; 7 sq", "sq").unwrap();
    assert_eq!(stack, vec![HostValue::Int(49)]);

    insta::assert_snapshot!(vm.disassemble_word("sq").unwrap(), @r"
    0000 dup
    0001 *
    0002 next
    ");
}

#[test]
fn control_words_must_balance() {
    let mut vm = test_vm();
    assert!(matches!(
        vm.execute("1 then", "stray"),
        Err(VmError::Compile { .. })
    ));
    assert!(matches!(
        vm.execute(": open 1 if 2 ;", "open"),
        Err(VmError::Compile { .. })
    ));
    assert!(matches!(
        vm.execute(": half", "half"),
        Err(VmError::Compile { .. })
    ));
    assert!(matches!(vm.execute(":", "bare"), Err(VmError::Compile { .. })));
}

#[test]
fn failed_compile_returns_the_task_to_run_mode() {
    let mut vm = test_vm();
    let task = vm.spawn_held_task(0);
    assert!(vm.compile(task, "1 if").is_err());
    assert_eq!(vm.scheduler().get(task).map(|task| task.mode), Some(Mode::Run));
    vm.reclaim_task(task);
}

#[test]
fn word_references_need_a_defined_word() {
    let mut vm = test_vm();
    assert_eq!(
        vm.execute("&nowhere", "ref"),
        Err(VmError::UnknownWord("nowhere".into()))
    );
    let stack = vm.execute(": three 3 ; &three call", "call").unwrap();
    assert_eq!(stack, vec![HostValue::Int(3)]);
}
