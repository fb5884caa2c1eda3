use lightmap_atlas_core::grouping::CompatibilityGrouper;
use lightmap_atlas_core::prelude::*;

#[test]
fn unmapped_neighbour_is_filled_but_stays_uncovered() {
    let cfg = AtlasConfig::builder()
        .max_atlas_extent(16)
        .padding(0)
        .pow2(true)
        .build();
    let mapped = RawAllocation::new(
        AllocationId(1),
        12,
        16,
        vec![Sample::mapped(200); 12 * 16],
        1.0,
        [LightId(5)],
        MaterialRef(0),
    )
    .expect("mapped");
    let unmapped = RawAllocation::new(
        AllocationId(2),
        4,
        16,
        vec![Sample::UNMAPPED; 4 * 16],
        1.0,
        [LightId(5)],
        MaterialRef(0),
    )
    .expect("unmapped");

    let mut grouper = CompatibilityGrouper::new(cfg.clone());
    assert_eq!(grouper.push(mapped).expect("push mapped"), 0);
    assert_eq!(grouper.push(unmapped).expect("push unmapped"), 0);
    let mut groups = grouper.finish();
    let group = groups.remove(0);
    assert_eq!(group.extent(), (16, 16));
    let neighbour = &group.members()[1];
    assert_eq!((neighbour.base_x, neighbour.base_y), (12, 0));

    let atlas = encode_group(group, 0, &cfg).expect("encode");
    let level0 = atlas.base_level().expect("level 0");
    for y in 0..16 {
        assert_eq!(level0.get(11, y), Sample::mapped(200));
        assert_eq!(level0.get(12, y), Sample::new(200, 0), "row {y}");
        for x in 12..16 {
            assert_eq!(level0.get(x, y).coverage, 0);
        }
        // beyond one texel nothing is filled
        assert_eq!(level0.get(13, y), Sample::UNMAPPED);
    }

    let level1 = &atlas.mips[1];
    assert_eq!((level1.width, level1.height), (8, 8));
    for y in 0..8 {
        assert_eq!(level1.get(5, y), Sample::mapped(200));
        assert_eq!(level1.get(6, y), Sample::new(200, 0), "row {y}");
    }
}
