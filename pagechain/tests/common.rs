//! Shared fixtures for the chain tests.
//!
//! Source A: 100 entries in two clusters (90 + 10). Source B: 50 entries in
//! one cluster. Column `pt` stores one u64 element per entry; column `adc`
//! is variable-cardinality (A: 200 elements, B: 75), so its element totals
//! deliberately diverge from the entry totals.

// Each test binary pulls in the subset of helpers it needs.
#![allow(dead_code)]

use pagechain::{
    DatasetImage, MemSource, Page, PageSource, ReadOptions, SourceChain,
};
use std::ops::Range;

pub const PT: u32 = 0;
pub const ADC: u32 = 1;

pub fn u64s(values: Range<u64>) -> Vec<u8> {
    values.flat_map(u64::to_le_bytes).collect()
}

pub fn u32s(values: Range<u32>) -> Vec<u8> {
    values.flat_map(u32::to_le_bytes).collect()
}

pub fn u64_values(page: &Page) -> Vec<u64> {
    page.as_slice()
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

pub fn image_a() -> DatasetImage {
    let mut b = DatasetImage::builder("events");
    b.column("pt", "u64", 8);
    b.column("adc", "u32", 4);
    b.cluster(90, vec![u64s(0..90), u32s(0..150)]).unwrap();
    b.cluster(10, vec![u64s(90..100), u32s(150..200)]).unwrap();
    b.finish()
}

pub fn image_b() -> DatasetImage {
    let mut b = DatasetImage::builder("events");
    b.column("pt", "u64", 8);
    b.column("adc", "u32", 4);
    b.cluster(50, vec![u64s(0..50), u32s(0..75)]).unwrap();
    b.finish()
}

pub fn source(image: DatasetImage) -> Box<dyn PageSource> {
    Box::new(MemSource::new(image, ReadOptions::default()))
}

/// The two-source chain used throughout: entry_base [0, 100, 150],
/// cluster_base [0, 2, 3], pt element base [0, 100, 150], adc [0, 200, 275].
pub fn chain_ab() -> SourceChain {
    pagechain_test_utils::init_tracing();
    let mut chain = SourceChain::from_sources(
        "events",
        vec![source(image_a()), source(image_b())],
        ReadOptions::default(),
    )
    .unwrap();
    chain.attach().unwrap();
    chain
}
