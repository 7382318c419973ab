// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use relink::{CompileOptions, ParserKind, compile, transform};

macro_rules! bench_harness {
    ($($name:literal,)*) => {
        fn bench_compile(c: &mut Criterion) {
            $(
                {
                    static CODE: &str = include_str!(concat!("../relink/tests/fixtures/", $name));

                    for kind in ParserKind::ALL {
                        let options = CompileOptions {
                            parse: kind.parse_fn(),
                            ..Default::default()
                        };
                        c.bench_function(&format!("{} (Parse, {kind})", $name), |b| {
                            b.iter(|| kind.parse_fn()(black_box(CODE)))
                        });
                        c.bench_function(&format!("{} (Compile, {kind})", $name), |b| {
                            b.iter(|| compile(black_box(CODE), &options))
                        });
                    }

                    c.bench_function(concat!($name, " (Rewrite)"), |b| {
                        b.iter_batched(
                            || ParserKind::Oxc.parse_fn()(CODE).unwrap(),
                            |tree| transform(tree, &CompileOptions::default()),
                            BatchSize::SmallInput,
                        )
                    });
                }
            )*
        }
    };
}

bench_harness!(
    "consumer.js",
    "counter.js",
    "cycle_a.js",
    "reexports.js",
    "scopes.js",
    "syntax.js",
);

criterion_group!(benches, bench_compile);
criterion_main!(benches);
