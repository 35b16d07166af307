//! Chunking and extraction performance benchmarks
//!
//! Measures performance of:
//! - Parsing into the arena tree
//! - Semantic chunking vs line-window fallback
//! - Graph extraction

use codeintel_core::parse::ParserLookup;
use codeintel_core::{ChunkBuilder, Classification, GraphExtractor, ParserRegistry, Resource};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn generate_python(classes: usize, methods: usize) -> String {
    let mut source = String::from("import os\nfrom collections import defaultdict\n\n");
    for c in 0..classes {
        source.push_str(&format!("\nclass Handler{}:\n    \"\"\"Handler {}.\"\"\"\n", c, c));
        for m in 0..methods {
            source.push_str(&format!(
                "\n    def handle_{}(self, request):\n        \
                 counts = defaultdict(int)\n        \
                 for key in request.keys():\n            \
                 counts[key] += 1\n        \
                 self.log(os.getcwd(), counts)\n        \
                 return counts\n",
                m
            ));
        }
    }
    source
}

fn generate_rust(functions: usize) -> String {
    let mut source = String::from("use std::collections::HashMap;\n\n");
    for f in 0..functions {
        source.push_str(&format!(
            "/// Function {}\npub fn compute_{}(input: &[u32]) -> HashMap<u32, usize> {{\n    \
             let mut out = HashMap::new();\n    \
             for v in input {{\n        \
             *out.entry(*v).or_insert(0) += 1;\n    \
             }}\n    \
             out\n}}\n\n",
            f, f
        ));
    }
    source
}

fn parser_for(registry: &ParserRegistry, language: &str) -> Box<dyn codeintel_core::SourceParser> {
    match registry.get_parser(language).unwrap() {
        ParserLookup::Available(parser) => parser,
        ParserLookup::Unsupported => panic!("{} not registered", language),
    }
}

fn bench_semantic_chunking(c: &mut Criterion) {
    let registry = ParserRegistry::with_defaults(Duration::from_secs(5));
    let builder = ChunkBuilder::default();
    let mut group = c.benchmark_group("semantic_chunking");

    for (name, language, source) in [
        ("python_small", "python", generate_python(2, 3)),
        ("python_large", "python", generate_python(40, 12)),
        ("rust_large", "rust", generate_rust(300)),
    ] {
        let resource = Resource::new("/bench", name, Classification::Practice, language);
        let mut parser = parser_for(&registry, language);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, source| {
            b.iter(|| builder.build(&resource, Some(parser.as_mut()), black_box(source)));
        });
    }

    group.finish();
}

fn bench_fallback_chunking(c: &mut Criterion) {
    let builder = ChunkBuilder::default();
    let source = generate_python(40, 12);
    let resource = Resource::new("/bench", "big.txt", Classification::Practice, "unknown");

    let mut group = c.benchmark_group("fallback_chunking");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("line_windows", |b| {
        b.iter(|| builder.build(&resource, None, black_box(&source)));
    });
    group.finish();
}

fn bench_graph_extraction(c: &mut Criterion) {
    let registry = ParserRegistry::with_defaults(Duration::from_secs(5));
    let extractor = GraphExtractor::new();
    let source = generate_python(40, 12);
    let resource = Resource::new("/bench", "handlers.py", Classification::Practice, "python");
    let tree = parser_for(&registry, "python").parse(&source).unwrap();

    c.bench_function("graph_extraction", |b| {
        b.iter(|| extractor.extract(&resource, Some(&tree), black_box(&source)));
    });
}

criterion_group!(
    benches,
    bench_semantic_chunking,
    bench_fallback_chunking,
    bench_graph_extraction
);
criterion_main!(benches);
