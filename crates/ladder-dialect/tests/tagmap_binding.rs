use ladder_dialect::{SlotOverride, TagMap, TagMapEntry, TagMapError};
use ladder_types::{bool_tag, Block, TagType};

#[test]
fn block_slice_binding_round_trips_with_overrides() {
    let logical = Block::new("Motor", TagType::Bool, 1, 4).select_all();
    let hardware = Block::new("Y", TagType::Bool, 1, 4).select_all();
    let map = TagMap::build(vec![TagMapEntry::block_slice_with(
        logical,
        hardware,
        SlotOverride::none().with_retentive(true),
    )])
    .unwrap();

    let entry = &map.entries()[0];
    let effective = entry.effective_block_tags().unwrap();
    assert_eq!(effective.len(), 4);
    assert!(effective.iter().all(|t| t.is_retentive()));
}

#[test]
fn mixed_entries_detect_a_collision_across_entry_kinds() {
    let standalone = TagMapEntry::standalone(bool_tag("Start"), bool_tag("X001"));
    let logical = Block::new("Start", TagType::Bool, 1, 1).select_all();
    let hardware = Block::new("X", TagType::Bool, 2, 2).select_all();
    let slice = TagMapEntry::block_slice(logical, hardware);

    let result = TagMap::build(vec![standalone, slice]);
    assert_eq!(
        result.unwrap_err(),
        TagMapError::NameCollision("Start".to_string())
    );
}
