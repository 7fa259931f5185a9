//! Property checks for rect overlap, the spatial hash and movement

use glam::Vec2;
use ledge::consts::ALL_GROUPS;
use ledge::sim::{SpatialHash, overlaps};
use ledge::{Body, PhysicsWorld, Rect, Settings};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f32> {
    -200.0f32..200.0
}

fn extent() -> impl Strategy<Value = f32> {
    0.0f32..60.0
}

fn rect() -> impl Strategy<Value = Rect> {
    (coord(), coord(), extent(), extent()).prop_map(|(x, y, w, h)| Rect::from_coords(x, y, w, h))
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in rect(), b in rect()) {
        prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    }

    #[test]
    fn non_degenerate_rect_overlaps_itself(r in rect()) {
        prop_assume!(r.size.x > 0.0 && r.size.y > 0.0);
        prop_assert!(overlaps(&r, &r));
    }

    #[test]
    fn hash_query_matches_brute_force(
        rects in prop::collection::vec(rect(), 0..40),
        query in rect(),
        cell_size in 1.0f32..32.0,
        bucket_count in 1usize..64,
    ) {
        let mut hash = SpatialHash::with_layout(cell_size, bucket_count);
        for (i, r) in rects.iter().enumerate() {
            hash.put_object(*r, i);
        }

        let mut found = hash.get_objects_in_rect(query);
        let before_dedup = found.len();
        found.sort_unstable();
        found.dedup();
        prop_assert_eq!(found.len(), before_dedup);

        let expected: Vec<usize> = rects
            .iter()
            .enumerate()
            .filter(|(_, r)| overlaps(r, &query))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn hash_remove_forgets_only_that_handle(
        rects in prop::collection::vec(rect(), 1..30),
        victim in any::<prop::sample::Index>(),
    ) {
        let mut hash = SpatialHash::new();
        for (i, r) in rects.iter().enumerate() {
            hash.put_object(*r, i);
        }
        let v = victim.index(rects.len());
        hash.remove_object(rects[v], v);

        for (i, r) in rects.iter().enumerate() {
            let found = hash.get_objects_in_rect(*r);
            prop_assert!(!found.contains(&v));
            if i != v && r.size.x > 0.0 && r.size.y > 0.0 {
                prop_assert!(found.contains(&i));
            }
        }
    }

    #[test]
    fn unobstructed_move_applies_full_delta(
        x in coord(), y in coord(), dx in coord(), dy in coord(), discrete in any::<bool>(),
    ) {
        let settings = if discrete { Settings::discrete() } else { Settings::default() };
        let mut world = PhysicsWorld::new(settings);
        let key = world.add_body(Body::new(Vec2::new(x, y), Vec2::new(3.0, 5.0)));

        prop_assert!(world.move_body(key, Vec2::new(dx, dy)).is_free());
        let pos = world.body(key).unwrap().pos();
        prop_assert_eq!(pos, Vec2::new(x, y) + Vec2::new(dx, dy));
    }

    #[test]
    fn swept_move_never_enters_solid_body(
        x in -100.0f32..100.0, y in -100.0f32..100.0, dx in coord(), dy in coord(),
    ) {
        let mut world = PhysicsWorld::default();
        let wall = world.add_body(
            Body::new(Vec2::new(-10.0, -10.0), Vec2::new(20.0, 20.0)).as_solid(),
        );
        let key = world.add_body(Body::new(Vec2::new(x, y), Vec2::new(4.0, 4.0)));
        let start = world.body(key).unwrap().rect();
        prop_assume!(!overlaps(&start, &world.body(wall).unwrap().rect()));

        world.move_body(key, Vec2::new(dx, dy));

        let end = world.body(key).unwrap().rect();
        let wall_rect = world.body(wall).unwrap().rect();
        prop_assert!(!overlaps(&end, &wall_rect));
        prop_assert_eq!(
            world.get_bodies_in_rect(end, ALL_GROUPS, false, None).contains(&key),
            !end.is_degenerate()
        );
    }

    #[test]
    fn retreat_after_contact_is_free(
        x in 0.0f32..35.0,
        y in -5.0f32..10.0,
        dx in 5.0f32..80.0,
        wall_x in 38.0f32..45.0,
    ) {
        let mut world = PhysicsWorld::default();
        let wall = world.add_body(
            Body::new(Vec2::new(wall_x, -10.0), Vec2::new(10.0, 30.0)).as_solid(),
        );
        let key = world.add_body(Body::new(Vec2::new(x, y), Vec2::new(1.3, 1.0)));

        world.move_body(key, Vec2::new(dx, 0.0));
        let end = world.body(key).unwrap().rect();
        prop_assert!(!overlaps(&end, &world.body(wall).unwrap().rect()));

        prop_assert!(world.move_body(key, Vec2::new(-5.0, 0.0)).is_free());
        prop_assert_eq!(world.body(key).unwrap().pos(), end.pos - Vec2::new(5.0, 0.0));
    }
}
