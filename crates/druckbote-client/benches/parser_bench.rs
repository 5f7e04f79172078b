// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use druckbote_client::command::{CommandParser, decode_invocation};

fn bench_parser(c: &mut Criterion) {
    let encoded =
        "webprint%3ADoPrint%20http%3A%2F%2Fhost%2Fjob%3FPrinterName%3DHP1%26JobId%3D42%26Copies%3D2";

    c.bench_function("decode_invocation", |b| {
        b.iter(|| decode_invocation(black_box(encoded)))
    });

    let decoded = decode_invocation(encoded);
    c.bench_function("parse_do_print", |b| {
        b.iter(|| CommandParser::parse(black_box(&decoded)).unwrap())
    });
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
