use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pkgconf_core::parser;
use pkgconf_core::version::compare;

const SAMPLE_PC: &str = "\
prefix=/usr
exec_prefix=${prefix}
libdir=${exec_prefix}/lib
includedir=${prefix}/include

Name: sample
Description: A sample package for benchmarking
Version: 1.2.3
Requires: dep1 >= 1.0, dep2
Libs: -L${libdir} -lsample
Cflags: -I${includedir}
";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_sample_pc_file", |b| {
        b.iter(|| parser::parse_str(black_box("sample"), black_box(SAMPLE_PC)).unwrap())
    });
}

fn bench_compare(c: &mut Criterion) {
    c.bench_function("compare_suffixed_versions", |b| {
        b.iter(|| compare(black_box("1.2.3rc1"), black_box("1.2.3")))
    });
}

criterion_group!(benches, bench_parse, bench_compare);
criterion_main!(benches);
