#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::{fs::File, io::Write, path::Path};
use tagscout::{format_report, Extractor, FileCounter, ScanConfig, ScanTargets};
use tempfile::tempdir;

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("test_{}.rs", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            if j % 5 == 0 {
                writeln!(file, "    // TODO: fix bug {} FIXME: optimize line {}", j, j)?;
            } else {
                writeln!(file, "    let value_{} = compute({});", j, j)?;
            }
        }
    }
    Ok(())
}

fn extractor_for(root: &Path) -> Extractor {
    Extractor::new(
        &ScanConfig::default(),
        ScanTargets::new(vec![], vec![root.to_path_buf()]),
        FileCounter::new(),
    )
    .unwrap()
}

fn bench_scan_text(c: &mut Criterion) {
    let extractor = Extractor::new(&ScanConfig::default(), ScanTargets::default(), FileCounter::new())
        .unwrap();
    let text: String = (0..1000)
        .map(|i| {
            if i % 10 == 0 {
                format!("// TODO(owner): item {}\n", i)
            } else {
                format!("let x{} = {};\n", i, i)
            }
        })
        .collect();

    c.bench_function("scan_text_1000_lines", |b| {
        b.iter(|| black_box(extractor.scan_text(Path::new("bench.rs"), black_box(&text))));
    });
}

fn bench_file_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let mut group = c.benchmark_group("File Scaling");
    for &count in &[1, 10, 100, 1000] {
        let dir = tempdir()?;
        create_test_files(&dir, count, 20)?;
        let extractor = extractor_for(dir.path());

        group.bench_function(format!("files_{}", count), |b| {
            b.iter(|| black_box(extractor.extract().count()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_report_formatting(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 100, 50)?;
    let records: Vec<_> = extractor_for(dir.path()).extract().collect();

    c.bench_function("format_report", |b| {
        b.iter(|| black_box(format_report(records.clone()).count()));
    });
    Ok(())
}

fn criterion_benchmark(c: &mut Criterion) {
    bench_scan_text(c);
    bench_file_scaling(c);
    bench_report_formatting(c);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
