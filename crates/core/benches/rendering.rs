use std::io::Cursor;

use bilicard_core::{ColorExtractor, ContentDocument, DocumentRenderer, RenderConfig, SummaryLimit, preprocess_html};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};

fn opus_modules(paragraphs: usize) -> Value {
    let body: Vec<Value> = (0..paragraphs)
        .map(|i| match i % 4 {
            0 => json!({"para_type": 8, "heading": {"level": 2, "nodes": [
                {"type": "TEXT_NODE_TYPE_WORD", "word": {"words": format!("小节 {}", i)}}
            ]}}),
            1 => json!({"para_type": 2, "pic": {"pics": [{"url": format!("https://i0.hdslb.com/bfs/new_dyn/{}.jpg", i)}]}}),
            _ => json!({"para_type": 1, "text": {"nodes": [
                {"type": "TEXT_NODE_TYPE_WORD", "word": {"words": "今天天气很好\n适合散步 & 拍照"}},
                {"type": "TEXT_NODE_TYPE_WORD", "word": {"words": "重点", "style": {"bold": true}, "color": "#fb7299"}}
            ]}}),
        })
        .collect();
    json!([
        {"module_type": "MODULE_TYPE_TITLE", "module_title": {"text": "bench"}},
        {"module_type": "MODULE_TYPE_CONTENT", "module_content": {"paragraphs": body}}
    ])
}

fn bench_render(c: &mut Criterion) {
    let renderer = DocumentRenderer::new(RenderConfig::with_limit(SummaryLimit::OPUS));
    let mut group = c.benchmark_group("render");

    for size in [10, 100, 1000] {
        let doc = ContentDocument::from_opus_modules(&opus_modules(size));
        group.bench_with_input(BenchmarkId::new("opus", size), &doc, |b, doc| b.iter(|| renderer.render(black_box(doc))));
    }

    group.finish();
}

fn bench_parse_modules(c: &mut Criterion) {
    let modules = opus_modules(100);
    c.bench_function("parse_modules", |b| b.iter(|| ContentDocument::from_opus_modules(black_box(&modules))));
}

fn bench_preprocess(c: &mut Criterion) {
    let html = r#"<script>track()</script><p>第一段</p><p style="display:none">隐藏</p><figure><img data-src="//i0.hdslb.com/bfs/article/p1.jpg" width="640"></figure>"#
        .repeat(200);
    let config = Default::default();

    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn gradient_png(size: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(size, size, |x, y| Rgb([(x * 255 / size) as u8, (y * 255 / size) as u8, 160]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

fn bench_focus_color(c: &mut Criterion) {
    let extractor = ColorExtractor::default();
    let mut group = c.benchmark_group("focus_color");

    for size in [64, 512] {
        let png = gradient_png(size);
        group.bench_with_input(BenchmarkId::new("png", size), &png, |b, png| b.iter(|| extractor.extract(black_box(png))));
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_parse_modules, bench_preprocess, bench_focus_color);
criterion_main!(benches);
