//! Scanner throughput benchmarks.
//!
//! Measures pure tokenization speed over synthetic component sources —
//! no diagnostics sink, tokens consumed in a tight loop without
//! collecting into a `Vec`.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reed_lexer::{Scanner, SourceBuffer};
use reed_token::{File, Token};

/// Generate a component with `n` repeated card items.
fn generate_component(n: usize) -> String {
    let mut src = String::from("<main class=\"list {theme:dark}\">\n");
    for i in 0..n {
        src.push_str(&format!(
            concat!(
                "  <article data-id={{item{i}.id}} class=\"card {{sel{i}}}\">\n",
                "    {{if item{i}.count > 0}}<b>{{item{i}.count %.2f}}</b>{{else}}none{{/if}}\n",
                "    <input type=\"checkbox\" checked={{!item{i}.muted}}/>\n",
                "  </article>\n"
            ),
            i = i
        ));
    }
    src.push_str("  <script>let a = 1 < 2;</script>\n</main>\n");
    src
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner/throughput");

    for num_items in [10, 100, 1000] {
        let source = generate_component(num_items);
        let bytes = source.len() as u64;

        group.throughput(Throughput::Bytes(bytes));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_items),
            &source,
            |b, src| {
                b.iter(|| {
                    let buf = SourceBuffer::new(src);
                    let mut file = File::new("bench.reed", buf.len());
                    let mut scanner = Scanner::new(&mut file, &buf, None);
                    loop {
                        let (_, tok, lit) = Scanner::scan(&mut scanner);
                        if tok == Token::Eof {
                            break;
                        }
                        black_box((tok, lit));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
