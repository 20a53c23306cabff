//! # Grid Property Tests
//!
//! Randomized insert / move / remove sequences checked against brute force.
//! A small bucket table forces heavy aliasing.

use cinder_core::ObjectRef;
use cinder_shared::{Random, Rect, Vec2};
use cinder_spatial::{Body, BodyId, BodyPairSet, BodySet, GridConfig, SpatialGrid};

const EXTENT: f32 = 300.0;

fn small_grid() -> SpatialGrid {
    SpatialGrid::new(&GridConfig {
        cell_width: 32.0,
        buckets: 64,
        max_bodies: 512,
        ..GridConfig::default()
    })
    .unwrap()
}

fn random_point(random: &mut Random) -> Vec2 {
    Vec2::new(
        random.range_f32(-EXTENT, EXTENT),
        random.range_f32(-EXTENT, EXTENT),
    )
}

fn random_radius(random: &mut Random) -> f32 {
    if random.rand_chance(8) {
        random.range_f32(20.0, 70.0)
    } else {
        random.range_f32(0.0, 12.0)
    }
}

/// Applies `steps` random operations, keeping `ids` in sync with the grid.
fn churn(grid: &mut SpatialGrid, random: &mut Random, ids: &mut Vec<BodyId>, steps: usize) {
    for _ in 0..steps {
        let roll = random.rand_u32() % 10;
        if ids.is_empty() || roll < 4 {
            let pos = random_point(random);
            let radius = random_radius(random);
            let owner = ObjectRef::new(ids.len() as u32, 0);
            ids.push(grid.insert(Body::new(pos, radius, owner)).unwrap());
        } else if roll < 8 {
            let id = ids[random.rand_u32() as usize % ids.len()];
            let pos = random_point(random);
            if random.rand_chance(2) {
                grid.move_to(id, pos).unwrap();
            } else {
                grid.move_and_resize(id, pos, random_radius(random)).unwrap();
            }
        } else {
            let i = random.rand_u32() as usize % ids.len();
            grid.remove(ids.swap_remove(i)).unwrap();
        }
    }
}

fn brute_pairs(grid: &SpatialGrid, ids: &[BodyId]) -> BodyPairSet {
    let mut pairs = BodyPairSet::new();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            if grid.get(a).unwrap().overlaps(grid.get(b).unwrap()) {
                pairs.insert(a, b);
            }
        }
    }
    pairs
}

fn segment_hits(from: Vec2, to: Vec2, body: &Body) -> bool {
    let d = to - from;
    let len2 = d.length_squared();
    let t = if len2 > 0.0 {
        ((body.pos() - from).dot(d) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = from + d * t;
    closest.distance_squared(body.pos()) < body.radius() * body.radius()
}

#[test]
fn membership_matches_bounds_after_every_operation() {
    let mut random = Random::new(7);
    let mut grid = small_grid();
    let mut ids = Vec::new();

    for _ in 0..200 {
        churn(&mut grid, &mut random, &mut ids, 1);

        let mut expected_slots = 0;
        for &id in &ids {
            let expected = grid.expected_cells_of(id).unwrap();
            assert_eq!(grid.cells_of(id).unwrap(), expected, "cells of {id}");
            expected_slots += expected.len();
        }
        assert_eq!(grid.slot_count(), expected_slots);
        assert_eq!(grid.body_count(), ids.len());
    }
}

#[test]
fn collisions_match_brute_force() {
    let mut random = Random::new(11);
    let mut grid = small_grid();
    let mut ids = Vec::new();

    for _ in 0..20 {
        churn(&mut grid, &mut random, &mut ids, 25);

        let mut pairs = BodyPairSet::new();
        grid.query_collisions(&mut pairs);
        let expected = brute_pairs(&grid, &ids);

        assert_eq!(pairs.len(), expected.len());
        for pair in &expected {
            assert!(pairs.contains(pair.first(), pair.second()));
        }
    }
}

#[test]
fn region_queries_match_brute_force() {
    let mut random = Random::new(23);
    let mut grid = small_grid();
    let mut ids = Vec::new();
    churn(&mut grid, &mut random, &mut ids, 300);

    for _ in 0..50 {
        let center = random_point(&mut random);
        let radius = random.range_f32(0.0, 120.0);
        let mut found = BodySet::new();
        grid.query_radius(center, radius, &mut found).unwrap();
        for &id in &ids {
            let body = grid.get(id).unwrap();
            let reach = radius + body.radius();
            let expected = center.distance_squared(body.pos()) < reach * reach;
            assert_eq!(found.contains(id), expected, "radius query, {id}");
        }

        let a = random_point(&mut random);
        let b = random_point(&mut random);
        let rect = Rect::bound(a, b);
        let mut found = BodySet::new();
        grid.query_rect(a, b, &mut found).unwrap();
        for &id in &ids {
            let body = grid.get(id).unwrap();
            let pos = body.pos();
            let expected = rect.contains(pos)
                || rect.closest_point(pos).distance_squared(pos) < body.radius() * body.radius();
            assert_eq!(found.contains(id), expected, "rect query, {id}");
        }
    }
}

#[test]
fn ray_queries_match_brute_force() {
    let mut random = Random::new(31);
    let mut grid = small_grid();
    let mut ids = Vec::new();
    churn(&mut grid, &mut random, &mut ids, 300);

    for _ in 0..50 {
        let from = random_point(&mut random);
        let to = random_point(&mut random);

        let mut found = BodySet::new();
        grid.query_ray(from, to, &mut found).unwrap();
        let expected: Vec<BodyId> = ids
            .iter()
            .copied()
            .filter(|&id| segment_hits(from, to, grid.get(id).unwrap()))
            .collect();
        assert_eq!(found.len(), expected.len());
        for id in &expected {
            assert!(found.contains(*id));
        }

        let first = grid.query_ray_first(from, to).unwrap();
        assert_eq!(first.is_some(), !expected.is_empty());
        if let Some(hit) = first {
            assert!(found.contains(hit.body));
            assert!(hit.t >= 0.0 && hit.t <= 1.0);
            // Nothing on the segment is entered earlier.
            let d = to - from;
            for id in &expected {
                let body = grid.get(*id).unwrap();
                let r = body.radius();
                assert!(hit.point.distance_squared(from) <= d.length_squared() + 1e-3);
                if from.distance_squared(body.pos()) < r * r {
                    assert!(hit.t.abs() < f32::EPSILON);
                }
            }
        }
    }
}

#[test]
fn huge_query_region_falls_back_to_full_scan() {
    let mut random = Random::new(5);
    let mut grid = small_grid();
    let mut ids = Vec::new();
    churn(&mut grid, &mut random, &mut ids, 100);

    let mut found = BodySet::new();
    grid.query_rect(
        Vec2::new(-1.0e6, -1.0e6),
        Vec2::new(1.0e6, 1.0e6),
        &mut found,
    )
    .unwrap();
    assert_eq!(found.len(), ids.len());

    let mut found = BodySet::new();
    grid.query_radius(Vec2::ZERO, 1.0e7, &mut found).unwrap();
    assert_eq!(found.len(), ids.len());
}

#[test]
fn clear_resets_everything() {
    let mut random = Random::new(3);
    let mut grid = small_grid();
    let mut ids = Vec::new();
    churn(&mut grid, &mut random, &mut ids, 50);

    grid.clear();
    assert_eq!(grid.body_count(), 0);
    assert_eq!(grid.slot_count(), 0);
    for id in ids {
        assert!(!grid.contains(id));
    }
}
