use sitemap_core::{update, CrawlState, Msg};

#[test]
fn tick_before_start_is_noop() {
    let state = CrawlState::new();
    let (next, effects) = update(state.clone(), Msg::Tick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
