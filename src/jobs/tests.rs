//! Job system unit tests.

use super::*;
use crate::frontend::diagnostics::Diagnostics;
use crate::frontend::symbols::{ConstValue, Entity};
use crate::frontend::{parser, scanner};

struct Fixture {
    program: Program,
    symbols: SymbolTable,
    sink: Diagnostics,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let sink = Diagnostics::new();
        let symbols = SymbolTable::new();
        let tokens = scanner::scan_all(source.as_bytes(), &sink);
        let program = parser::parse(source.as_bytes(), &tokens, &symbols, &sink);
        assert!(sink.is_empty(), "unexpected parse errors: {:?}", sink.messages());
        Self { program, symbols, sink }
    }

    fn system(&self, config: JobConfig) -> JobSystem<'_> {
        JobSystem::new(&self.symbols, &self.program, &self.sink, config).unwrap()
    }

    /// Submit every declaration and run.
    fn run(&self, config: JobConfig) -> JobReport {
        let system = self.system(config);
        for (id, _) in self.program.decls() {
            system.submit_decl(id).unwrap();
        }
        system.run()
    }

    fn id(&self, name: &str) -> EntityId {
        self.program
            .decls()
            .find(|(_, decl)| decl.name.node == name)
            .map(|(_, decl)| decl.entity)
            .unwrap_or_else(|| panic!("no declaration named {}", name))
    }

    fn decl_id(&self, name: &str) -> DeclId {
        self.program
            .decls()
            .find(|(_, decl)| decl.name.node == name)
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no declaration named {}", name))
    }

    fn names(&self, ids: &[EntityId]) -> Vec<String> {
        ids.iter().map(|&id| self.symbols.entity(id).name.clone()).collect()
    }

    fn state(&self, name: &str) -> EntityState {
        self.symbols.state(self.id(name))
    }
}

fn requeue() -> JobConfig {
    JobConfig::new().with_suspension(Suspension::Requeue)
}

#[test]
fn test_forward_reference_parks_and_wakes() {
    let f = Fixture::new("a :: b + 1\nb :: 2\n");
    let report = f.run(JobConfig::default());

    assert_eq!(f.names(&report.emitted), ["b", "a"]);
    assert!(report.failed.is_empty());
    assert_eq!(report.checks_run, 3);
    assert_eq!(report.suspensions, 1);
    assert_eq!(report.wakeups, 1);
    assert_eq!(f.symbols.value(f.id("a")), Some(ConstValue::Int(3)));
    assert!(f.sink.is_empty());
}

#[test]
fn test_forward_reference_with_requeue() {
    let f = Fixture::new("a :: b + 1\nb :: 2\n");
    let report = f.run(requeue());

    assert_eq!(f.names(&report.emitted), ["b", "a"]);
    assert_eq!(report.wakeups, 0);
    assert!(report.suspensions >= 1);
    assert_eq!(f.state("a"), EntityState::Emitted);
}

#[test]
fn test_requeue_on_one_worker_makes_progress() {
    let f = Fixture::new("a :: b + 1\nb :: c + 1\nc :: d + 1\nd :: 0\n");
    let report = f.run(requeue().with_workers(1).with_max_attempts(4));

    assert_eq!(f.names(&report.emitted), ["d", "c", "b", "a"]);
    assert!(report.failed.is_empty());
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
}

#[test]
fn test_self_reference_never_emits() {
    let f = Fixture::new("a :: a\n");
    let report = f.run(JobConfig::default());

    assert!(report.emitted.is_empty());
    assert_eq!(f.names(&report.failed), ["a"]);
    assert_eq!(f.sink.messages(), ["cyclic dependency detected: a refers to itself"]);
}

#[test]
fn test_mutual_cycle_reported_once() {
    for config in [JobConfig::default(), requeue()] {
        let f = Fixture::new("a :: b\nb :: a\n");
        let report = f.run(config);

        assert!(report.emitted.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(f.sink.messages(), ["cyclic dependency: b -> a -> b"]);
        assert_eq!(f.state("a"), EntityState::Failed);
        assert_eq!(f.state("b"), EntityState::Failed);
    }
}

#[test]
fn test_cycle_does_not_block_independent_declarations() {
    let f = Fixture::new("a :: b\nb :: c\nc :: a\nd :: 4\ne :: d + 1\n");
    let report = f.run(JobConfig::default());

    assert_eq!(f.names(&report.emitted), ["d", "e"]);
    assert_eq!(f.sink.count_containing("cyclic dependency"), 1);
    assert_eq!(report.failed.len(), 3);
}

#[test]
fn test_invalid_dependency_fails_dependents() {
    let f = Fixture::new("a :: b\nb :: nope\n");
    let report = f.run(JobConfig::default());

    assert!(report.emitted.is_empty());
    assert_eq!(f.names(&report.failed), ["b", "a"]);
    assert_eq!(f.sink.messages(), ["use of unresolved identifier nope", "use of invalid declaration b"]);
}

#[test]
fn test_attempts_exhausted_with_requeue() {
    let f = Fixture::new("a :: b\nb :: 1\n");
    let system = f.system(requeue().with_max_attempts(3));
    // `b` is never submitted, so `a` can only spin.
    system.submit_decl(f.decl_id("a")).unwrap();
    let report = system.run();

    assert_eq!(report.checks_run, 3);
    assert_eq!(f.names(&report.failed), ["a"]);
    assert_eq!(f.sink.messages(), ["declaration a did not resolve after 3 attempts"]);
}

#[test]
fn test_parked_job_that_never_wakes_is_failed() {
    let f = Fixture::new("a :: b\nb :: 1\n");
    let system = f.system(JobConfig::default());
    system.submit_decl(f.decl_id("a")).unwrap();
    let report = system.run();

    assert_eq!(f.names(&report.failed), ["a"]);
    assert_eq!(f.state("b"), EntityState::Unchecked);
    assert_eq!(f.sink.messages(), ["declaration a never resolved (waiting on b)"]);
}

#[test]
fn test_rejected_entity_is_not_checked() {
    let f = Fixture::new("a :: 1\nb :: a\n");
    let system = f.system(JobConfig::default());
    system.reject(f.id("a"));
    for (id, _) in f.program.decls() {
        system.submit_decl(id).unwrap();
    }
    let report = system.run();

    assert_eq!(report.checks_run, 1);
    assert_eq!(f.names(&report.failed), ["a", "b"]);
    assert_eq!(f.sink.messages(), ["use of invalid declaration a"]);
}

#[test]
fn test_entry_point_recorded() {
    let f = Fixture::new("main :: fn() { return helper }\nhelper :: 7\n");
    let report = f.run(JobConfig::default());
    assert_eq!(report.entry_point, Some(f.id("main")));
    assert_eq!(f.names(&report.emitted), ["helper", "main"]);
}

#[test]
fn test_custom_emitter_sees_values() {
    let f = Fixture::new("x :: y * 2\ny :: 21\nz := x\n");
    let seen = Mutex::new(Vec::new());
    let record = |entity: &Entity, _: &Decl| seen.lock().push(format!("{}={:?}", entity.name, entity.value()));
    let system = f.system(JobConfig::default()).with_emitter(&record);
    for (id, _) in f.program.decls() {
        system.submit_decl(id).unwrap();
    }
    system.run();

    assert_eq!(
        seen.into_inner(),
        ["y=Some(Int(21))", "x=Some(Int(42))", "z=None"]
    );
}

#[test]
fn test_submit_rejects_unknown_declaration() {
    let f = Fixture::new("a :: 1\n");
    let system = f.system(JobConfig::default());
    assert_eq!(system.submit_decl(DeclId(9)), Err(JobError::UnknownDecl(DeclId(9))));
    assert_eq!(
        system.submit(WorkUnit::CodeGen(CodeGenJob::new(DeclId(9), EntityId(0)))),
        Err(JobError::UnknownDecl(DeclId(9)))
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let f = Fixture::new("a :: 1\n");
    let result = JobSystem::new(&f.symbols, &f.program, &f.sink, JobConfig::new().with_workers(0));
    assert!(matches!(result, Err(JobError::NoWorkers)));
}

#[test]
fn test_multiple_workers_resolve_reverse_chain() {
    let mut source = String::new();
    for i in 0..40 {
        source.push_str(&format!("v{} :: v{} + 1\n", i, i + 1));
    }
    source.push_str("v40 :: 0\n");

    for suspension in [Suspension::Park, Suspension::Requeue] {
        let f = Fixture::new(&source);
        let report = f.run(JobConfig::new().with_workers(4).with_suspension(suspension));

        assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
        assert!(report.failed.is_empty());
        let order = f.names(&report.emitted);
        assert_eq!(order.len(), 41);
        assert_eq!(order[0], "v40");
        assert_eq!(order[40], "v0");
        assert_eq!(f.symbols.value(f.id("v0")), Some(ConstValue::Int(40)));
    }
}
