#![no_main]

use kestrel::diagnostics::Diagnostics;
use kestrel::{CompileConfig, JobConfig, Suspension, compile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Sources are raw bytes; decoding problems must come back as diagnostics.
    let Some((&selector, source)) = data.split_first() else {
        return;
    };
    let suspension = if selector & 1 == 0 { Suspension::Park } else { Suspension::Requeue };
    let workers = usize::from((selector >> 1) & 3) + 1;
    let config = CompileConfig::new().with_jobs(
        JobConfig::new()
            .with_workers(workers)
            .with_suspension(suspension)
            .with_max_attempts(64),
    );

    let sink = Diagnostics::new();
    let compilation = compile(source, &config, &sink).expect("fuzz configuration is valid");
    let settled = compilation.report.emitted.len() + compilation.report.failed.len();
    assert_eq!(settled, compilation.program.decls().count());
});
