use pixelstitch::{
    AssociationPolicy, CornerConfig, CornerPoint, Match, MatchConfig, NoopObserver, Photo,
    StitchConfig, StitchError, StitchPipeline, TranslationOffset,
};

/// Deterministic high-contrast texture; every marker id gets a different pattern.
fn texture(id: usize, x: usize, y: usize) -> u8 {
    (60 + ((x * 37 + y * 91 + id * 53 + x * y * 7) % 196)) as u8
}

/// A black scene with square textured markers at the given top-left positions.
fn scene(width: usize, height: usize, channels: usize, side: usize, markers: &[(usize, usize)]) -> Photo {
    let mut photo = Photo::filled(width, height, channels, 0);
    for (id, &(mx, my)) in markers.iter().enumerate() {
        for dy in 0..side {
            for dx in 0..side {
                let v = texture(id, dx, dy);
                photo.set_pixel(mx + dx, my + dy, &vec![v; channels]);
            }
        }
    }
    photo
}

fn crop(photo: &Photo, x0: usize, y0: usize, width: usize, height: usize) -> Photo {
    let mut out = Photo::filled(width, height, photo.channels, 0);
    for y in 0..height {
        for x in 0..width {
            out.set_pixel(x, y, photo.get_pixel(x0 + x, y0 + y).unwrap());
        }
    }
    out
}

/// Bright glyph with one dominant corner response, stamped one row below the marker origin.
const GLYPH: [[bool; 4]; 3] = [
    [false, true, true, false],
    [false, true, false, false],
    [true, false, true, true],
];

/// Dim texture under the glyph; it barely changes the corner response but gives every marker
/// id its own patch.
fn dim_texture(id: usize, x: usize, y: usize) -> u8 {
    ((x * 7 + y * 13 + id * 5 + x * y * 3) % 24) as u8
}

fn stamp_corner_marker(photo: &mut Photo, id: usize, mx: usize, my: usize) {
    for dy in 0..5 {
        for dx in 0..5 {
            photo.set_pixel(mx + dx, my + dy, &[dim_texture(id, dx, dy)]);
        }
    }
    for (r, row) in GLYPH.iter().enumerate() {
        for (c, &on) in row.iter().enumerate() {
            if on {
                photo.set_pixel(mx + c, my + 1 + r, &[255]);
            }
        }
    }
}

const MARKERS: [(usize, usize); 4] = [(87, 15), (87, 35), (87, 55), (87, 75)];

/// Two 100x100 grayscale views of a 180x105 scene. The second view starts 80 pixels to the
/// right and 5 pixels below the first, so they overlap over 20 columns.
fn marker_pair() -> (Photo, Photo, Photo) {
    let mut world = Photo::filled(180, 105, 1, 0);
    for (id, &(mx, my)) in MARKERS.iter().enumerate() {
        stamp_corner_marker(&mut world, id, mx, my);
    }
    let a = crop(&world, 0, 0, 100, 100);
    let b = crop(&world, 80, 5, 100, 100);
    (world, a, b)
}

fn marker_config(policy: AssociationPolicy) -> StitchConfig {
    StitchConfig {
        corners: CornerConfig {
            threshold: 200.0,
            ..CornerConfig::default()
        },
        matching: MatchConfig {
            window_size: 3,
            ssd_threshold: 1000.0,
            policy,
        },
    }
}

#[test]
fn four_marker_scene_is_reassembled() {
    let (world, a, b) = marker_pair();
    let pipeline = StitchPipeline::new(marker_config(AssociationPolicy::default())).unwrap();
    let result = pipeline.run(&a, &b, &mut NoopObserver).unwrap();

    // One corner per marker, at the glyph's dominant corner.
    let [corners_a, corners_b] = &result.corners;
    let expected_a: Vec<CornerPoint> =
        MARKERS.iter().map(|&(mx, my)| CornerPoint::new(mx + 2, my + 1)).collect();
    let expected_b: Vec<CornerPoint> =
        expected_a.iter().map(|c| CornerPoint::new(c.x - 80, c.y - 5)).collect();
    assert_eq!(corners_a, &expected_a);
    assert_eq!(corners_b, &expected_b);

    let expected_matches: Vec<Match> = (0..MARKERS.len()).map(|i| Match::new(i, i)).collect();
    assert_eq!(result.matches, expected_matches);

    assert_eq!(result.offset, TranslationOffset::new(20, 5));
    assert_eq!((result.canvas.width, result.canvas.height), (180, 105));
    assert_eq!(result.canvas, world);
}

#[test]
fn greedy_policy_agrees_on_unambiguous_markers() {
    let (_, a, b) = marker_pair();
    let minimum = StitchPipeline::new(marker_config(AssociationPolicy::MinimumBelowThreshold))
        .unwrap()
        .run(&a, &b, &mut NoopObserver)
        .unwrap();
    let greedy = StitchPipeline::new(marker_config(AssociationPolicy::LastBelowThreshold))
        .unwrap()
        .run(&a, &b, &mut NoopObserver)
        .unwrap();

    assert_eq!(greedy.matches, minimum.matches);
    assert_eq!(greedy.offset, minimum.offset);
}

#[test]
fn colour_views_with_default_config_recover_the_offset() {
    let world = scene(150, 90, 3, 6, &[(72, 20), (72, 38), (72, 56)]);
    let a = crop(&world, 0, 0, 90, 80);
    let b = crop(&world, 60, 10, 90, 80);

    let pipeline = StitchPipeline::new(StitchConfig::default()).unwrap();
    let result = pipeline.run(&a, &b, &mut NoopObserver).unwrap();

    assert!(!result.matches.is_empty());
    assert_eq!(result.offset, TranslationOffset::new(30, 10));
    assert_eq!(result.canvas.channels, 3);
    assert_eq!(result.canvas, world);
}

#[test]
fn unrelated_views_fail_without_matches() {
    // Same glyph, different texture underneath.
    let mut a = Photo::filled(100, 100, 1, 0);
    stamp_corner_marker(&mut a, 0, 40, 40);
    let mut b = Photo::filled(100, 100, 1, 0);
    stamp_corner_marker(&mut b, 2, 50, 50);

    let pipeline = StitchPipeline::new(marker_config(AssociationPolicy::default())).unwrap();
    assert!(matches!(
        pipeline.run(&a, &b, &mut NoopObserver),
        Err(StitchError::EmptyMatches)
    ));
}
