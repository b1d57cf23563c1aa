use knot::{HostValue, Vm, VmConfig, VmError};

fn run(source: &str) -> Result<Vec<HostValue>, VmError> {
    let mut vm = Vm::new(VmConfig::default()).expect("vm");
    vm.execute(source, "test")
}

fn ints(values: &[i32]) -> Vec<HostValue> {
    values.iter().copied().map(HostValue::Int).collect()
}

#[test]
fn test_colon_definition() {
    assert_eq!(run(": double dup + ; 3 double").unwrap(), ints(&[6]));
}

#[test]
fn test_stack_words() {
    assert_eq!(run("1 2 swap").unwrap(), ints(&[2, 1]));
    assert_eq!(run("1 2 over").unwrap(), ints(&[1, 2, 1]));
    assert_eq!(run("1 2 3 rot").unwrap(), ints(&[2, 3, 1]));
    assert_eq!(run("1 2 nip").unwrap(), ints(&[2]));
    assert_eq!(run("7 8 depth").unwrap(), ints(&[7, 8, 2]));
    assert_eq!(run("1 >r 2 r>").unwrap(), ints(&[2, 1]));
    assert_eq!(run("drop"), Err(VmError::StackUnderflow));
}

#[test]
fn test_arithmetic() {
    assert_eq!(run("7 2 -").unwrap(), ints(&[5]));
    assert_eq!(run("7 2 /").unwrap(), ints(&[3]));
    assert_eq!(run("-7 2 mod").unwrap(), ints(&[-1]));
    assert_eq!(run("1.5 2 *").unwrap(), vec![HostValue::Float(3.0)]);
    assert_eq!(run("3 2 > 3 2 <").unwrap(), ints(&[1, 0]));
    assert_eq!(run("1 0 /"), Err(VmError::DivisionByZero));
}

#[test]
fn test_conditionals_inside_words() {
    let source = ": sign dup 0 < if drop -1 else 0 > if 1 else 0 then then ; \
                  -5 sign 0 sign 9 sign";
    assert_eq!(run(source).unwrap(), ints(&[-1, 0, 1]));
}

#[test]
fn test_loops() {
    let mut vm = Vm::new(VmConfig::default()).unwrap();
    let countdown = ": countdown begin dup . 1 - dup 0 = until drop ; 3 countdown";
    assert!(vm.execute(countdown, "countdown").unwrap().is_empty());
    assert_eq!(vm.take_output(), "3\n2\n1\n");

    let first_over = "0 begin 1 + dup dup * 40 > if 'done . then dup 7 = until";
    assert_eq!(vm.execute(first_over, "until").unwrap(), ints(&[7]));
    assert_eq!(vm.take_output(), "done\n");
}

#[test]
fn test_late_binding() {
    assert_eq!(run(": a b ; : b 7 ; a").unwrap(), ints(&[7]));
}

#[test]
fn test_recursion() {
    let source = ": fact dup 1 > if dup 1 - fact * then ; 5 fact";
    assert_eq!(run(source).unwrap(), ints(&[120]));
}

#[test]
fn test_strings() {
    assert_eq!(run("\"ab\" \"cd\" + length").unwrap(), ints(&[4]));
    assert_eq!(
        run("\"line\\n\"").unwrap(),
        vec![HostValue::Str("line\n".into())]
    );
    assert_eq!(run("\"a\" \"a\" =").unwrap(), ints(&[1]));
}

#[test]
fn test_arrays() {
    assert_eq!(
        run("1 2 2 array 3 2 array").unwrap(),
        vec![HostValue::Array(vec![ints(&[1, 2]).into(), HostValue::Int(3)])]
    );
    assert_eq!(run("10 20 2 array 1 @").unwrap(), ints(&[20]));
    assert_eq!(
        run("0 1 array dup 5 swap 0 ! 0 @").unwrap(),
        ints(&[5])
    );
    assert_eq!(
        run("1 1 array 3 @"),
        Err(VmError::IndexOutOfBounds { index: 3, len: 1 })
    );
}

#[test]
fn test_type_of() {
    assert_eq!(
        run("1 type-of \"s\" type-of").unwrap(),
        vec![
            HostValue::Symbol("integer".into()),
            HostValue::Symbol("string".into())
        ]
    );
}

#[test]
fn test_locals() {
    assert_eq!(run("5 'x bind 'x lookup 'x lookup +").unwrap(), ints(&[10]));
    assert_eq!(
        run("1 'x bind enter 2 'x bind 'x lookup leave 'x lookup").unwrap(),
        ints(&[2, 1])
    );
    assert_eq!(run("'nope lookup"), Err(VmError::UnknownWord("nope".into())));
    assert_eq!(run("leave leave"), Err(VmError::ScopeUnderflow));
}

#[test]
fn test_function_references() {
    assert_eq!(run(": five 5 ; &five call &five call +").unwrap(), ints(&[10]));
}

#[test]
fn test_comments_are_skipped() {
    let source = "( stack comment ) 1 \\ trailing comment\n 2 +";
    assert_eq!(run(source).unwrap(), ints(&[3]));
}

#[test]
fn test_deep_recursion_overflows() {
    let mut vm = Vm::new(VmConfig::default().with_stack_slots(16)).unwrap();
    assert_eq!(
        vm.execute(": deep deep ; deep", "deep"),
        Err(VmError::StackOverflow)
    );
    assert_eq!(vm.leak_report().tasks, 0);
}

#[test]
fn test_runtime_values_do_not_leak() {
    let mut vm = Vm::new(VmConfig::default()).unwrap();
    let baseline = vm.leak_report();
    vm.execute("1 2 3 3 array dup 0 @ swap drop", "arrays").unwrap();
    vm.execute("4 1 array 'a bind 'a lookup drop", "bound").unwrap();
    let leaked = vm.leak_report().since(&baseline);
    assert_eq!(leaked.tasks, 0);
    assert_eq!(leaked.acts, 0);
    assert_eq!(leaked.heap_blocks, 0);
}
