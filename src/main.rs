use std::{env, fs, io};

use knot::{
    HostValue, Vm, VmConfig,
    runtime::{builtins::RUN_BUILTINS, leak_detector::LeakStats},
    syntax::lexer,
};
use tracing_subscriber::EnvFilter;

struct RunOptions {
    leak_detector: bool,
    stats: bool,
    check: bool,
    json: bool,
}

fn main() {
    let mut args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|arg| arg == "--verbose");
    let trace = args.iter().any(|arg| arg == "--trace");
    let options = RunOptions {
        leak_detector: args.iter().any(|arg| arg == "--leak-detector"),
        stats: args.iter().any(|arg| arg == "--stats"),
        check: args.iter().any(|arg| arg == "--check"),
        json: args.iter().any(|arg| arg == "--json"),
    };
    args.retain(|arg| {
        !matches!(
            arg.as_str(),
            "--verbose" | "--trace" | "--leak-detector" | "--stats" | "--check" | "--json"
        )
    });
    init_logging(verbose);

    let Some(config_path) = extract_value(&mut args, "--config") else {
        return;
    };
    let Some(heap_bytes) = extract_value(&mut args, "--heap-bytes") else {
        return;
    };
    let mut config = match config_path {
        Some(path) => match VmConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        },
        None => VmConfig::from_env(),
    };
    if let Some(value) = heap_bytes {
        match value.parse::<usize>() {
            Ok(parsed) => config.heap_bytes = parsed,
            Err(_) => {
                eprintln!("Error: --heap-bytes expects a non-negative integer.");
                return;
            }
        }
    }
    if trace {
        config.trace = true;
    }

    if args.len() < 2 {
        print_help();
        return;
    }

    if is_knot_file(&args[1]) {
        run_file(&args[1], config, &options);
        return;
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => print_help(),
        "run" | "tokens" | "disasm" => {
            if args.len() < 3 {
                eprintln!("Usage: knot {} <file.knot>", args[1]);
                return;
            }
            if !is_knot_file(&args[2]) {
                eprintln!("Error: file must have .knot extension: {}", args[2]);
                return;
            }
            match args[1].as_str() {
                "run" => run_file(&args[2], config, &options),
                "tokens" => show_tokens(&args[2]),
                _ => show_disassembly(&args[2], config),
            }
        }
        "words" => {
            let names: Vec<&str> = RUN_BUILTINS.iter().map(|builtin| builtin.name).collect();
            println!("{}", names.join(" "));
        }
        "repl" => repl(config),
        other => {
            eprintln!("Error: unknown command `{}`", other);
            print_help();
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "knot=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_help() {
    println!(
        "\
Knot CLI

Usage:
  knot <file.knot>
  knot run <file.knot>
  knot tokens <file.knot>
  knot disasm <file.knot>
  knot words
  knot repl

Flags:
  --verbose            Log task lifecycle and cache events
  --trace              Print every dispatched cell with the operand stack
  --stats              Print byte heap statistics after the run
  --check              Walk the byte heap after the run and report corruption
  --leak-detector      Print live heap blocks, cells, activations and tasks
  --json               Print the final stack and reports as JSON
  --heap-bytes <n>     Byte heap capacity (default: 1048576)
  --config <file>      Load VM configuration from a JSON file
  -h, --help           Show this help message
"
    );
}

fn new_vm(config: VmConfig) -> Vm {
    match Vm::new(config) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn read_source(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading {}: {}", path, err);
            std::process::exit(1);
        }
    }
}

fn run_file(path: &str, config: VmConfig, options: &RunOptions) {
    let source = read_source(path);
    let mut vm = new_vm(config);
    let result = vm.execute(&source, path);
    print!("{}", vm.take_output());

    let stack = match result {
        Ok(stack) => stack,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            std::process::exit(1);
        }
    };
    for fault in vm.task_faults() {
        eprintln!("task {} failed: {}", fault.task, fault.message);
    }

    if options.json {
        print_json(&stack);
    } else if !stack.is_empty() {
        let items: Vec<String> = stack.iter().map(HostValue::to_string).collect();
        println!("<{}> {}", stack.len(), items.join(" "));
    }

    if options.check || options.stats {
        match vm.heap().walk() {
            Ok(stats) if options.json => print_json(&stats),
            Ok(stats) if options.stats => println!(
                "\nHeap stats:\n  capacity: {}\n  allocated: {}\n  free: {}\n  overhead: {}\n  blocks: {}\n  free_blocks: {}",
                stats.capacity,
                stats.allocated,
                stats.free,
                stats.overhead,
                stats.blocks,
                stats.free_blocks
            ),
            Ok(_) => println!("heap: ok"),
            Err(err) => {
                eprintln!("heap: {}", err);
                std::process::exit(1);
            }
        }
    }

    if options.leak_detector {
        let stats = vm.leak_report();
        if options.json {
            print_json(&stats);
        } else {
            print_leak_stats(&stats);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("Error: {}", err),
    }
}

fn print_leak_stats(stats: &LeakStats) {
    println!(
        "\nLeak stats:\n  heap_blocks: {}\n  cells: {}\n  symbols: {}\n  acts: {}\n  tasks: {}",
        stats.heap_blocks, stats.cells, stats.symbols, stats.acts, stats.tasks
    );
}

fn extract_value(args: &mut Vec<String>, flag: &str) -> Option<Option<String>> {
    let mut value = None;
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            if i + 1 >= args.len() {
                eprintln!("Usage: knot <file.knot> {} <value>", flag);
                return None;
            }
            value = Some(args.remove(i + 1));
            args.remove(i);
            continue;
        }
        i += 1;
    }
    Some(value)
}

fn is_knot_file(path: &str) -> bool {
    path.ends_with(".knot")
}

fn show_tokens(path: &str) {
    let source = read_source(path);
    match lexer::tokenize(&source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{:>4}  {}", token.line, token.kind);
            }
        }
        Err(err) => {
            eprintln!("{}: {}", path, err);
            std::process::exit(1);
        }
    }
}

fn show_disassembly(path: &str, config: VmConfig) {
    let source = read_source(path);
    let mut vm = new_vm(config);
    let words_before = vm.defaults().run.word_count();
    let task = vm.spawn_held_task(0);
    let start = vm.cells().top();
    let result = vm.compile(task, &source);
    vm.reclaim_task(task);
    match result {
        Ok(entry) => {
            if vm.defaults().run.word_count() > words_before {
                println!("; words");
                print!("{}", vm.disassemble(start, (entry - start) as usize));
            }
            println!("; main");
            let end = vm.cells().top();
            print!("{}", vm.disassemble(entry, (end - entry) as usize));
        }
        Err(err) => {
            eprintln!("{}: {}", path, err);
            std::process::exit(1);
        }
    }
}

fn repl(config: VmConfig) {
    use io::{BufRead, Write};

    println!(
        "Knot REPL v{} (type :help for help, :quit to exit)",
        env!("CARGO_PKG_VERSION")
    );
    let mut vm = new_vm(config);
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line_no = 0usize;

    loop {
        print!("knot> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match reader.read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        match trimmed {
            "" => continue,
            ":quit" | ":q" => break,
            ":help" | ":h" => {
                println!(
                    "Commands:\n  :quit, :q    Exit the REPL\n  :help, :h    Show this help message\n\nWords defined with `: name ... ;` persist between lines."
                );
                continue;
            }
            _ => {}
        }

        line_no += 1;
        let result = vm.execute(trimmed, &format!("<repl:{}>", line_no));
        print!("{}", vm.take_output());
        match result {
            Ok(stack) if !stack.is_empty() => {
                let items: Vec<String> = stack.iter().map(HostValue::to_string).collect();
                println!("<{}> {}", stack.len(), items.join(" "));
            }
            Ok(_) => {}
            Err(err) => eprintln!("{}", err),
        }
        for fault in vm.take_task_faults() {
            eprintln!("task {} failed: {}", fault.task, fault.message);
        }
    }

    println!("Goodbye!");
}
