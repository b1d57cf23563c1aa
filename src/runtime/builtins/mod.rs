use crate::runtime::builtin_function::BuiltinFunction;

mod compile_ops;
mod control_ops;
mod data_ops;
mod helpers;
mod io_ops;
mod local_ops;
mod numeric_ops;
mod stack_ops;
mod task_ops;

use compile_ops::{
    builtin_again, builtin_begin, builtin_colon, builtin_else, builtin_if, builtin_semicolon,
    builtin_then, builtin_until,
};
use control_ops::{builtin_branch, builtin_branch_if_false, builtin_call, builtin_next};
use data_ops::{builtin_array, builtin_fetch, builtin_length, builtin_store, builtin_type_of};
use io_ops::{builtin_cr, builtin_emit, builtin_heap_check, builtin_print};
use local_ops::{builtin_bind, builtin_enter, builtin_leave, builtin_lookup};
use numeric_ops::{
    builtin_add, builtin_div, builtin_eq, builtin_gt, builtin_lt, builtin_mod, builtin_mul,
    builtin_negate, builtin_not, builtin_sub,
};
use stack_ops::{
    builtin_depth, builtin_drop, builtin_dup, builtin_nip, builtin_over, builtin_r_from,
    builtin_rot, builtin_swap, builtin_to_r,
};
use task_ops::{builtin_kill, builtin_self, builtin_spawn, builtin_switch, builtin_yield};

/// Native words resolved at run time.
pub static RUN_BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "next",
        func: builtin_next,
    },
    BuiltinFunction {
        name: "branch",
        func: builtin_branch,
    },
    BuiltinFunction {
        name: "?branch",
        func: builtin_branch_if_false,
    },
    BuiltinFunction {
        name: "call",
        func: builtin_call,
    },
    BuiltinFunction {
        name: "dup",
        func: builtin_dup,
    },
    BuiltinFunction {
        name: "drop",
        func: builtin_drop,
    },
    BuiltinFunction {
        name: "swap",
        func: builtin_swap,
    },
    BuiltinFunction {
        name: "over",
        func: builtin_over,
    },
    BuiltinFunction {
        name: "rot",
        func: builtin_rot,
    },
    BuiltinFunction {
        name: "nip",
        func: builtin_nip,
    },
    BuiltinFunction {
        name: "depth",
        func: builtin_depth,
    },
    BuiltinFunction {
        name: ">r",
        func: builtin_to_r,
    },
    BuiltinFunction {
        name: "r>",
        func: builtin_r_from,
    },
    BuiltinFunction {
        name: "+",
        func: builtin_add,
    },
    BuiltinFunction {
        name: "-",
        func: builtin_sub,
    },
    BuiltinFunction {
        name: "*",
        func: builtin_mul,
    },
    BuiltinFunction {
        name: "/",
        func: builtin_div,
    },
    BuiltinFunction {
        name: "mod",
        func: builtin_mod,
    },
    BuiltinFunction {
        name: "negate",
        func: builtin_negate,
    },
    BuiltinFunction {
        name: "=",
        func: builtin_eq,
    },
    BuiltinFunction {
        name: "<",
        func: builtin_lt,
    },
    BuiltinFunction {
        name: ">",
        func: builtin_gt,
    },
    BuiltinFunction {
        name: "not",
        func: builtin_not,
    },
    BuiltinFunction {
        name: "length",
        func: builtin_length,
    },
    BuiltinFunction {
        name: "array",
        func: builtin_array,
    },
    BuiltinFunction {
        name: "@",
        func: builtin_fetch,
    },
    BuiltinFunction {
        name: "!",
        func: builtin_store,
    },
    BuiltinFunction {
        name: "type-of",
        func: builtin_type_of,
    },
    BuiltinFunction {
        name: "bind",
        func: builtin_bind,
    },
    BuiltinFunction {
        name: "lookup",
        func: builtin_lookup,
    },
    BuiltinFunction {
        name: "enter",
        func: builtin_enter,
    },
    BuiltinFunction {
        name: "leave",
        func: builtin_leave,
    },
    BuiltinFunction {
        name: "spawn",
        func: builtin_spawn,
    },
    BuiltinFunction {
        name: "yield",
        func: builtin_yield,
    },
    BuiltinFunction {
        name: "switch",
        func: builtin_switch,
    },
    BuiltinFunction {
        name: "self",
        func: builtin_self,
    },
    BuiltinFunction {
        name: "kill",
        func: builtin_kill,
    },
    BuiltinFunction {
        name: ".",
        func: builtin_print,
    },
    BuiltinFunction {
        name: "emit",
        func: builtin_emit,
    },
    BuiltinFunction {
        name: "cr",
        func: builtin_cr,
    },
    BuiltinFunction {
        name: "heap-check",
        func: builtin_heap_check,
    },
];

/// Immediate words, executed while compiling.
pub static COMPILE_BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: ":",
        func: builtin_colon,
    },
    BuiltinFunction {
        name: ";",
        func: builtin_semicolon,
    },
    BuiltinFunction {
        name: "if",
        func: builtin_if,
    },
    BuiltinFunction {
        name: "else",
        func: builtin_else,
    },
    BuiltinFunction {
        name: "then",
        func: builtin_then,
    },
    BuiltinFunction {
        name: "begin",
        func: builtin_begin,
    },
    BuiltinFunction {
        name: "until",
        func: builtin_until,
    },
    BuiltinFunction {
        name: "again",
        func: builtin_again,
    },
];

#[cfg(test)]
mod data_ops_test;
#[cfg(test)]
mod compile_ops_test;
