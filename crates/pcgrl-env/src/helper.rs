//! Graph helpers over tile grids
//!
//! All searches use 4-connectivity and treat out-of-bounds as blocked.

use std::collections::{HashMap, VecDeque};

use ndarray::Array2;

use crate::grid::{Coord, Tile, TileMap};

/// Distance marker for cells the search never reached
pub const UNREACHABLE: i64 = -1;

const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

fn neighbours(dim: (usize, usize), (r, c): Coord) -> impl Iterator<Item = Coord> {
    NEIGHBOURS.iter().filter_map(move |&(dr, dc)| {
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < dim.0 && nc < dim.1).then_some((nr, nc))
    })
}

/// Index every cell by its tile type.
///
/// Every requested tile gets an entry, possibly empty. Coordinates are in
/// row-major order.
#[must_use]
pub fn get_tile_locations(map: &TileMap, tile_types: &[Tile]) -> HashMap<Tile, Vec<Coord>> {
    let mut locations: HashMap<Tile, Vec<Coord>> =
        tile_types.iter().map(|&t| (t, Vec::new())).collect();
    for (coord, tile) in map.indexed_iter() {
        if let Some(cells) = locations.get_mut(tile) {
            cells.push(coord);
        }
    }
    locations
}

/// Breadth-first distances from `start` over passable tiles.
///
/// Returns the distance grid (`UNREACHABLE` where no path exists) and the
/// visited mask. A blocked start reaches nothing.
#[must_use]
pub fn run_dijkstra(start: Coord, map: &TileMap, passable: &[Tile]) -> (Array2<i64>, Array2<bool>) {
    let dim = map.dim();
    let mut distances = Array2::from_elem(dim, UNREACHABLE);
    let mut visited = Array2::from_elem(dim, false);

    match map.get(start) {
        Some(tile) if passable.contains(tile) => {}
        _ => return (distances, visited),
    }

    let mut queue = VecDeque::from([start]);
    distances[start] = 0;
    visited[start] = true;
    while let Some(cell) = queue.pop_front() {
        let next = distances[cell] + 1;
        for n in neighbours(dim, cell) {
            if visited[n] || !passable.contains(&map[n]) {
                continue;
            }
            visited[n] = true;
            distances[n] = next;
            queue.push_back(n);
        }
    }
    (distances, visited)
}

/// Number of 4-connected components formed by passable tiles
#[must_use]
pub fn calc_num_regions(
    map: &TileMap,
    locations: &HashMap<Tile, Vec<Coord>>,
    passable: &[Tile],
) -> usize {
    let dim = map.dim();
    let mut seen = Array2::from_elem(dim, false);
    let mut regions = 0;

    let cells = passable
        .iter()
        .filter_map(|t| locations.get(t))
        .flatten()
        .copied();
    for seed in cells {
        if seen[seed] {
            continue;
        }
        regions += 1;
        seen[seed] = true;
        let mut stack = vec![seed];
        while let Some(cell) = stack.pop() {
            for n in neighbours(dim, cell) {
                if !seen[n] && passable.contains(&map[n]) {
                    seen[n] = true;
                    stack.push(n);
                }
            }
        }
    }
    regions
}

/// Walk a distance grid downhill from `from` back to the search origin.
///
/// The first coordinate is `from`, the last is the cell at distance 0.
/// Unreached or out-of-bounds origins give an empty path.
#[must_use]
pub fn get_path_coords(distances: &Array2<i64>, from: Coord) -> Vec<Coord> {
    let Some(&length) = distances.get(from) else {
        return Vec::new();
    };
    if length < 0 {
        return Vec::new();
    }

    let dim = distances.dim();
    let mut path = Vec::with_capacity(length as usize + 1);
    let mut cell = from;
    path.push(cell);
    let mut current = length;
    while current > 0 {
        let Some(prev) = neighbours(dim, cell).find(|&n| distances[n] == current - 1) else {
            break;
        };
        cell = prev;
        current -= 1;
        path.push(cell);
    }
    path
}

/// Largest finite distance and the first cell (row-major) holding it
#[must_use]
pub fn farthest_cell(distances: &Array2<i64>) -> Option<(Coord, i64)> {
    distances
        .indexed_iter()
        .filter(|(_, d)| **d != UNREACHABLE)
        .fold(None, |best: Option<(Coord, i64)>, (coord, &d)| match best {
            Some((_, b)) if b >= d => best,
            _ => Some((coord, d)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::parse_map;

    #[test]
    fn test_tile_locations_cover_requested_types() {
        let map = parse_map("#.\n.#").unwrap();
        let locations = get_tile_locations(&map, &[Tile::Empty, Tile::Solid]);
        assert_eq!(locations[&Tile::Empty], vec![(0, 1), (1, 0)]);
        assert_eq!(locations[&Tile::Solid], vec![(0, 0), (1, 1)]);

        let solid = parse_map("##").unwrap();
        let locations = get_tile_locations(&solid, &[Tile::Empty]);
        assert!(locations[&Tile::Empty].is_empty());
    }

    #[test]
    fn test_dijkstra_distances() {
        let map = parse_map(
            "
            ...#
            #.##
            #...
            ",
        )
        .unwrap();
        let (dist, visited) = run_dijkstra((0, 0), &map, &[Tile::Empty]);
        assert_eq!(dist[(0, 0)], 0);
        assert_eq!(dist[(0, 2)], 2);
        assert_eq!(dist[(2, 3)], 5);
        assert_eq!(dist[(0, 3)], UNREACHABLE);
        assert!(visited[(2, 1)]);
        assert!(!visited[(1, 0)]);
    }

    #[test]
    fn test_dijkstra_from_blocked_start() {
        let map = parse_map("#..").unwrap();
        let (dist, visited) = run_dijkstra((0, 0), &map, &[Tile::Empty]);
        assert!(dist.iter().all(|&d| d == UNREACHABLE));
        assert!(visited.iter().all(|&v| !v));
        assert_eq!(farthest_cell(&dist), None);
    }

    #[test]
    fn test_region_count() {
        let map = parse_map(
            "
            ..#.
            ###.
            .#..
            ",
        )
        .unwrap();
        let locations = get_tile_locations(&map, &[Tile::Empty, Tile::Solid]);
        assert_eq!(calc_num_regions(&map, &locations, &[Tile::Empty]), 3);
        assert_eq!(calc_num_regions(&map, &locations, &[Tile::Solid]), 1);
    }

    #[test]
    fn test_path_coords_trace_back_to_origin() {
        let map = parse_map(
            "
            ...
            ##.
            ...
            ",
        )
        .unwrap();
        let (dist, _) = run_dijkstra((0, 0), &map, &[Tile::Empty]);
        let path = get_path_coords(&dist, (2, 0));
        assert_eq!(path.len(), 7);
        assert_eq!(path.first(), Some(&(2, 0)));
        assert_eq!(path.last(), Some(&(0, 0)));
        for pair in path.windows(2) {
            assert_eq!(dist[pair[0]] - 1, dist[pair[1]]);
        }
    }

    #[test]
    fn test_path_coords_for_unreached_cell() {
        let map = parse_map(".#.").unwrap();
        let (dist, _) = run_dijkstra((0, 0), &map, &[Tile::Empty]);
        assert!(get_path_coords(&dist, (0, 2)).is_empty());
        assert!(get_path_coords(&dist, (5, 5)).is_empty());
        assert_eq!(get_path_coords(&dist, (0, 0)), vec![(0, 0)]);
    }

    #[test]
    fn test_farthest_cell_prefers_row_major_first() {
        let map = parse_map(
            "
            ...
            .#.
            ",
        )
        .unwrap();
        let (dist, _) = run_dijkstra((0, 1), &map, &[Tile::Empty]);
        // (1, 0) and (1, 2) are both 2 away.
        assert_eq!(farthest_cell(&dist), Some(((1, 0), 2)));
    }
}
