// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page range parser. The parser sits on the
// hot path of every conversion job (it runs once per file in a batch), so
// we track a realistic many-token expression against a large document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use seitenwerk_core::pages::parse_page_range;

fn bench_parse_page_range(c: &mut Criterion) {
    // A dense expression of 50 alternating singles and ranges.
    let expression: String = (0..50)
        .map(|i| {
            let base = i * 20 + 1;
            if i % 2 == 0 {
                format!("{base}-{}", base + 9)
            } else {
                format!("{base}")
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    c.bench_function("parse_page_range (50 tokens, 1000 pages)", |b| {
        b.iter(|| {
            let pages = parse_page_range(black_box(&expression), black_box(1000));
            black_box(pages).expect("expression parses");
        });
    });
}

criterion_group!(benches, bench_parse_page_range);
criterion_main!(benches);
