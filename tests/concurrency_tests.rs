//! Scheduling tests: results must not depend on the worker count or the suspension strategy.

use std::collections::BTreeSet;

use kestrel::frontend::diagnostics::Diagnostics;
use kestrel::frontend::symbols::{ConstValue, EntityState};
use kestrel::{CompileConfig, JobConfig, Suspension, compile};

const WORKERS: [usize; 4] = [1, 2, 4, 8];
const STRATEGIES: [Suspension; 2] = [Suspension::Park, Suspension::Requeue];

fn configs() -> impl Iterator<Item = (usize, Suspension, CompileConfig)> {
    STRATEGIES.into_iter().flat_map(|suspension| {
        WORKERS.into_iter().map(move |workers| {
            let jobs = JobConfig::new().with_workers(workers).with_suspension(suspension);
            (workers, suspension, CompileConfig::new().with_jobs(jobs))
        })
    })
}

/// Diagnostics as an order-free set of messages.
fn message_set(sink: &Diagnostics) -> BTreeSet<String> {
    sink.messages().into_iter().collect()
}

/// `name_i :: name_{i+1} + 1`, ending in `name_{len} :: 0`.
fn reverse_chain(len: usize) -> String {
    let mut source = String::new();
    for i in 0..len {
        source.push_str(&format!("n{} :: n{} + 1\n", i, i + 1));
    }
    source.push_str(&format!("n{} :: 0\n", len));
    source
}

// ============================================================================
// Dependency order
// ============================================================================

#[test]
fn test_chain_resolves_under_every_configuration() {
    let source = reverse_chain(60);
    for (workers, suspension, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();

        assert!(sink.is_empty(), "{} workers, {:?}: {:?}", workers, suspension, sink.messages());
        let emitted = compilation.emitted_names();
        assert_eq!(emitted.len(), 61);
        assert_eq!(emitted.first().map(String::as_str), Some("n60"));
        assert_eq!(emitted.last().map(String::as_str), Some("n0"));
    }
}

#[test]
fn test_dependencies_are_emitted_first() {
    // A diamond with a shared root and a long tail.
    let source = "top :: left + right\nleft :: root * 2\nright :: root * 3\nroot :: tail\ntail :: 7\nside :: 1\n";
    for (workers, suspension, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();
        let emitted = compilation.emitted_names();
        let position = |name: &str| emitted.iter().position(|n| n == name).unwrap();

        assert_eq!(emitted.len(), 6, "{} workers, {:?}", workers, suspension);
        assert!(position("tail") < position("root"));
        assert!(position("root") < position("left"));
        assert!(position("root") < position("right"));
        assert!(position("left") < position("top"));
        assert!(position("right") < position("top"));

        let (_, top) = compilation.program.decls().find(|(_, d)| d.name.node == "top").unwrap();
        assert_eq!(compilation.symbols.value(top.entity), Some(ConstValue::Int(35)));
    }
}

#[test]
fn test_functions_wait_for_globals_they_read() {
    let source = "main :: fn() {\n  n := limit * 2\n  return n\n}\nlimit :: base + 1\nbase :: 41\n";
    for (_, _, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();
        assert!(sink.is_empty());
        assert_eq!(compilation.emitted_names(), ["base", "limit", "main"]);
        assert!(compilation.entry_point().is_some());
    }
}

// ============================================================================
// Cycles and failures
// ============================================================================

#[test]
fn test_cycle_reported_once_under_every_configuration() {
    let source = "a :: b + 1\nb :: c + 1\nc :: a + 1\nfree :: 3\n";
    for (workers, suspension, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();

        assert_eq!(
            sink.count_containing("cyclic dependency"),
            1,
            "{} workers, {:?}: {:?}",
            workers,
            suspension,
            sink.messages()
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(compilation.emitted_names(), ["free"]);
        for name in ["a", "b", "c"] {
            let (_, decl) = compilation.program.decls().find(|(_, d)| d.name.node == name).unwrap();
            assert_eq!(compilation.symbols.state(decl.entity), EntityState::Failed);
        }
    }
}

#[test]
fn test_many_independent_cycles() {
    let mut source = String::new();
    for i in 0..16 {
        source.push_str(&format!("p{i} :: q{i}\nq{i} :: p{i}\nok{i} :: {i}\n"));
    }
    for (_, _, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();
        assert_eq!(sink.count_containing("cyclic dependency"), 16);
        assert_eq!(compilation.emitted_names().len(), 16);
        assert_eq!(compilation.failed_names().len(), 32);
    }
}

#[test]
fn test_diagnostic_set_is_stable() {
    let source = "\
c :: b * 2
b :: a + 1
a :: 1 / 0
d :: nope
e :: d
f :: 9223372036854775807 + 1
g :: f
h := 0
i :: h
main :: 5
ok :: 1
";
    let mut expected: Option<BTreeSet<String>> = None;
    for (workers, suspension, config) in configs() {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();
        let messages = message_set(&sink);

        assert_eq!(sink.len(), messages.len(), "duplicate diagnostics: {:?}", sink.messages());
        assert_eq!(compilation.emitted_names().len(), 3, "{} workers, {:?}", workers, suspension);
        match &expected {
            None => expected = Some(messages),
            Some(expected) => assert_eq!(&messages, expected, "{} workers, {:?}", workers, suspension),
        }
    }
    let expected = expected.unwrap();
    assert!(expected.contains("constant division by zero"));
    assert!(expected.contains("use of invalid declaration b"));
    assert!(expected.contains("use of unresolved identifier nope"));
    assert!(expected.contains("constant expression overflows in `+`"));
    assert!(expected.contains("expected constant declaration: value of i is not constant"));
}

#[test]
fn test_repeated_runs_agree() {
    let source = reverse_chain(25) + "x :: y\ny :: x\n";
    let config = CompileConfig::new().with_jobs(JobConfig::new().with_workers(8));
    for _ in 0..20 {
        let sink = Diagnostics::new();
        let compilation = compile(source.as_bytes(), &config, &sink).unwrap();
        assert_eq!(compilation.emitted_names().len(), 26);
        assert_eq!(compilation.failed_names().len(), 2);
        assert_eq!(sink.len(), 1);
    }
}
