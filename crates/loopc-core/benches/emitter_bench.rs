use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loopc_core::config::CompileConfig;
use loopc_core::pipeline::Pipeline;
use std::path::Path;

fn compile(source: &str) {
    let pipeline = Pipeline::new(source.to_string(), "bench.loop".to_string());
    let config = CompileConfig::default();
    pipeline.compile_all(Path::new("."), &config).unwrap();
}

fn bench_constant_dedup(c: &mut Criterion) {
    // Every literal here repeats, so the constant pool's dedup lookup is
    // the hot path rather than the constant count itself.
    let source = r#"
        var a = "same"; var b = "same"; var c = "same";
        var x = 7; var y = 7; var z = 7;
        print a; print b; print c; print x; print y; print z;
    "#;
    c.bench_function("emit constant dedup", |b| b.iter(|| compile(black_box(source))));
}

fn bench_jump_patching_if_chain(c: &mut Criterion) {
    let source = r#"
        var n = 5;
        if n == 1 { print 1; }
        else if n == 2 { print 2; }
        else if n == 3 { print 3; }
        else if n == 4 { print 4; }
        else { print 0; }
    "#;
    c.bench_function("emit if-else chain jump patching", |b| b.iter(|| compile(black_box(source))));
}

fn bench_jump_patching_loop_with_break_continue(c: &mut Criterion) {
    let source = r#"
        var i = 0;
        while i < 10 {
            i = i + 1;
            if i == 3 { continue; }
            if i == 8 { break; }
            print i;
        }
    "#;
    c.bench_function("emit while-loop jump patching", |b| b.iter(|| compile(black_box(source))));
}

fn bench_short_circuit_and_for_in(c: &mut Criterion) {
    let source = r#"
        func pick(a, b) {
            return a && b || a;
        }
        for x in [1, 2, 3] {
            print pick(x, x);
        }
    "#;
    c.bench_function("emit short-circuit and for-in", |b| b.iter(|| compile(black_box(source))));
}

criterion_group!(
    benches,
    bench_constant_dedup,
    bench_jump_patching_if_chain,
    bench_jump_patching_loop_with_break_continue,
    bench_short_circuit_and_for_in,
);
criterion_main!(benches);
