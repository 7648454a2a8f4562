mod common;

use common::*;
use pagechain::{
    DatasetImage, Error, MemSource, PageSource, ReadOptions, SourceChain, SourceSet,
};

fn image_b_with_column(name: &str, type_name: &str) -> DatasetImage {
    let mut b = DatasetImage::builder("events");
    b.column(name, type_name, 8);
    b.column("adc", "u32", 4);
    b.cluster(50, vec![u64s(0..50), u32s(0..75)]).unwrap();
    b.finish()
}

#[test]
fn matching_schemas_leave_the_chain_healthy() {
    let chain = chain_ab();
    assert!(!chain.is_degraded());
    assert_eq!(chain.n_sources(), 2);
}

#[test]
fn differing_field_metadata_degrades_but_still_reads() {
    pagechain_test_utils::init_tracing();
    let mut chain = SourceChain::from_sources(
        "events",
        vec![
            source(image_a()),
            source(image_b_with_column("pt", "i64")),
        ],
        ReadOptions::default(),
    )
    .unwrap();
    assert!(chain.is_degraded());

    chain.attach().unwrap();
    let page = chain.populate_page_at(PT, 120).unwrap();
    assert_eq!(page.global_range_first(), 100);
    chain.release_page(page).unwrap();
}

#[test]
fn differing_column_counts_degrade() {
    pagechain_test_utils::init_tracing();
    let mut narrow = DatasetImage::builder("events");
    narrow.column("pt", "u64", 8);
    narrow.cluster(50, vec![u64s(0..50)]).unwrap();

    let mut chain = SourceChain::from_sources(
        "events",
        vec![source(image_a()), source(narrow.finish())],
        ReadOptions::default(),
    )
    .unwrap();
    assert!(chain.is_degraded());
    chain.attach().unwrap();

    // Columns present everywhere still dispatch into the narrow source.
    let page = chain.populate_page_at(PT, 120).unwrap();
    assert_eq!(page.global_range_first(), 100);
    chain.release_page(page).unwrap();

    // adc exists in the first source only: readable there, a structured
    // error where the owning source has no such column.
    let page = chain.populate_page_at(ADC, 50).unwrap();
    chain.release_page(page).unwrap();
    assert!(matches!(
        chain.populate_page_at(ADC, 120),
        Err(Error::IndexOutOfRange { what: "column", .. })
    ));
}

#[test]
fn merged_descriptor_renumbers_clusters_globally() {
    let chain = chain_ab();
    let desc = chain.descriptor().unwrap();

    assert_eq!(desc.name(), "events");
    assert_eq!(desc.n_entries(), 150);
    assert_eq!(desc.n_clusters(), 3);
    assert_eq!(desc.n_fields(), 2);
    assert_eq!(desc.n_columns(), 2);

    let spliced = desc.cluster(2).unwrap();
    assert_eq!(spliced.first_entry_index(), 100);
    assert_eq!(spliced.entry_count(), 50);
    assert_eq!(
        spliced.column_range(PT).unwrap().first_element_index,
        100
    );
    assert_eq!(
        spliced.column_range(ADC).unwrap().first_element_index,
        200
    );
    assert_eq!(desc.total_elements(PT), 150);
    assert_eq!(desc.total_elements(ADC), 275);
}

#[test]
fn attach_is_idempotent() {
    let mut chain = chain_ab();
    let before = chain.descriptor().unwrap().clone();
    chain.attach().unwrap();
    assert_eq!(chain.descriptor().unwrap(), &before);
}

#[test]
fn empty_source_lists_are_rejected() {
    pagechain_test_utils::init_tracing();
    assert!(matches!(
        SourceChain::from_sources("events", Vec::new(), ReadOptions::default()),
        Err(Error::EmptyChain)
    ));
    assert!(matches!(
        SourceChain::new("events", SourceSet::Locations(&[]), ReadOptions::default()),
        Err(Error::EmptyChain)
    ));
}

#[test]
fn shared_construction_leaves_the_originals_with_the_caller() {
    pagechain_test_utils::init_tracing();
    let mut a = MemSource::new(image_a(), ReadOptions::default());
    let mut b = MemSource::new(image_b(), ReadOptions::default());
    a.attach().unwrap();
    b.attach().unwrap();

    let mut chain =
        SourceChain::from_shared("events", &[&a, &b], ReadOptions::default()).unwrap();
    chain.attach().unwrap();
    let page = chain.populate_page_at(PT, 120).unwrap();
    chain.release_page(page).unwrap();

    // The originals were duplicated, not consumed; their own reads and
    // accounting are untouched by the chain's traffic.
    let page = a.populate_page_at(PT, 0).unwrap();
    a.release_page(page).unwrap();
    assert_eq!(a.live_page_count(), 0);
    assert_eq!(b.live_page_count(), 0);
}

#[test]
fn chains_nest() {
    let inner_ab = chain_ab();

    pagechain_test_utils::init_tracing();
    let mut c = DatasetImage::builder("events");
    c.column("pt", "u64", 8);
    c.column("adc", "u32", 4);
    c.cluster(30, vec![u64s(0..30), u32s(0..40)]).unwrap();

    let inner: Box<dyn PageSource> = Box::new(inner_ab);
    let mut outer = SourceChain::from_sources(
        "events",
        vec![inner, source(c.finish())],
        ReadOptions::default(),
    )
    .unwrap();
    assert!(!outer.is_degraded());
    outer.attach().unwrap();

    let desc = outer.descriptor().unwrap();
    assert_eq!(desc.n_entries(), 180);
    assert_eq!(desc.n_clusters(), 4);
    assert_eq!(desc.total_elements(PT), 180);
    assert_eq!(desc.total_elements(ADC), 315);

    // Entry 160 reaches the trailing dataset through both layers.
    let page = outer.populate_page_at(PT, 160).unwrap();
    assert_eq!(page.global_range_first(), 150);
    assert_eq!(page.cluster().id, 3);
    assert_eq!(u64_values(&page), (0..30).collect::<Vec<_>>());
    outer.release_page(page).unwrap();

    // Entry 120 dispatches into the nested chain, which re-windows once
    // more on its own tables.
    let page = outer.populate_page_at(PT, 120).unwrap();
    assert_eq!(page.global_range_first(), 100);
    assert_eq!(page.cluster().id, 2);
    outer.release_page(page).unwrap();
}

#[test]
fn clones_rerun_the_compatibility_check() {
    pagechain_test_utils::init_tracing();
    let chain = SourceChain::from_sources(
        "events",
        vec![
            source(image_a()),
            source(image_b_with_column("pt", "i64")),
        ],
        ReadOptions::default(),
    )
    .unwrap();
    assert!(chain.is_degraded());

    let twin = chain.try_clone().unwrap();
    assert!(twin.is_degraded());

    let healthy = chain_ab();
    assert!(!healthy.try_clone().unwrap().is_degraded());
}
