use knot::{HostValue, Vm, VmConfig, VmError, runtime::task::TaskState};

fn new_vm() -> Vm {
    Vm::new(VmConfig::default()).expect("vm")
}

#[test]
fn test_yield_interleaves_tasks() {
    let mut vm = new_vm();
    let source = ": worker 1 . yield 3 . ; &worker spawn drop 2 . yield 4 .";
    vm.execute(source, "yield").unwrap();
    assert_eq!(vm.take_output(), "2\n1\n4\n3\n");
    assert_eq!(vm.scheduler().live_count(), 0);
}

#[test]
fn test_switch_runs_target_first() {
    let mut vm = new_vm();
    let source = ": a 'a . ; : b 'b . ; &a spawn drop &b spawn switch 'main .";
    vm.execute(source, "switch").unwrap();
    assert_eq!(vm.take_output(), "b\na\nmain\n");
}

#[test]
fn test_self_pushes_task_handle() {
    let mut vm = new_vm();
    let stack = vm.execute("self", "self").unwrap();
    assert!(matches!(stack.as_slice(), [HostValue::Int(id)] if *id >= 0));
}

#[test]
fn test_kill_removes_waiting_task() {
    let mut vm = new_vm();
    let source = ": spin begin yield again ; &spin spawn kill 5";
    assert_eq!(vm.execute(source, "kill").unwrap(), vec![HostValue::Int(5)]);
    assert_eq!(vm.scheduler().live_count(), 0);
    assert_eq!(vm.leak_report().acts, 0);
}

#[test]
fn test_kill_self_stops_at_next_dispatch() {
    let mut vm = new_vm();
    assert!(vm.execute("self kill 1 .", "suicide").unwrap().is_empty());
    assert_eq!(vm.output(), "");
}

#[test]
fn test_unknown_task_handle() {
    let mut vm = new_vm();
    assert_eq!(vm.execute("99 kill", "bad"), Err(VmError::UnknownTask(99)));
}

#[test]
fn test_child_fault_is_recorded() {
    let mut vm = new_vm();
    let source = ": bad 1 0 / ; &bad spawn drop 7";
    assert_eq!(vm.execute(source, "fault").unwrap(), vec![HostValue::Int(7)]);

    let faults = vm.take_task_faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].message, "division by zero");
    assert!(vm.task_faults().is_empty());
}

#[test]
fn test_child_sees_parent_bindings() {
    let mut vm = new_vm();
    let source = ": show 'x lookup . ; 42 'x bind &show spawn drop yield";
    vm.execute(source, "scope").unwrap();
    assert_eq!(vm.take_output(), "42\n");
    assert_eq!(vm.leak_report().acts, 0);
}

#[test]
fn test_compiled_code_runs_on_spawned_task() {
    let mut vm = new_vm();
    let scratch = vm.spawn_held_task(0);
    let entry = vm.compile(scratch, "6 7 *").unwrap();
    vm.reclaim_task(scratch);

    let task = vm.spawn_held_task(entry);
    assert_eq!(vm.task_state(task), Some(TaskState::Ready));
    vm.run().unwrap();
    assert_eq!(vm.task_state(task), Some(TaskState::Terminated));
    assert_eq!(vm.task_operands(task).map(<[_]>::len), Some(1));

    assert!(vm.reclaim_task(task));
    assert_eq!(vm.task_state(task), None);
}

#[test]
fn test_cancel_ready_task() {
    let mut vm = new_vm();
    let scratch = vm.spawn_held_task(0);
    let entry = vm.compile(scratch, "1 .").unwrap();
    vm.reclaim_task(scratch);

    let task = vm.spawn_task(entry, None);
    vm.cancel_task(task).unwrap();
    vm.run().unwrap();
    assert_eq!(vm.output(), "");
    assert_eq!(vm.cancel_task(task), Err(VmError::UnknownTask(task.raw())));
}

#[test]
fn test_tasks_leave_nothing_behind() {
    let mut vm = new_vm();
    let baseline = vm.leak_report();
    let source = ": w 3 0 + yield drop ; &w spawn drop &w spawn drop yield \"s\" drop";
    vm.execute(source, "clean").unwrap();
    let leaked = vm.leak_report().since(&baseline);
    assert_eq!((leaked.tasks, leaked.acts), (0, 0));
    // The string literal lives in the compiled code.
    assert_eq!(leaked.heap_blocks, 1);
}
