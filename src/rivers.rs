//! Springs and river flow
//!
//! Rivers start at spring triangles and follow downslope sides to the sea.
//! Every side a river walks through accumulates one unit of flow.

use crate::error::{require_len, ElementKind, MapError, Result};
use crate::mesh::TriangleMesh;

/// Spring candidates sit in this elevation band.
const SPRING_MIN_ELEVATION: f32 = 0.3;
const SPRING_MAX_ELEVATION: f32 = 0.9;

/// Solid land triangles suitable as river sources, in ascending id order.
pub fn find_spring_t(
    mesh: &TriangleMesh,
    r_water: &[bool],
    t_elevation: &[f32],
    t_downslope_s: &[Option<usize>],
) -> Result<Vec<usize>> {
    require_len("r_water", r_water, mesh.num_regions())?;
    require_len("t_elevation", t_elevation, mesh.num_triangles())?;
    require_len("t_downslope_s", t_downslope_s, mesh.num_triangles())?;

    let springs = (0..mesh.num_solid_triangles())
        .filter(|&t| {
            let e = t_elevation[t];
            let touches_water = mesh.t_circulate_r(t).iter().any(|&r| r_water[r]);
            (SPRING_MIN_ELEVATION..=SPRING_MAX_ELEVATION).contains(&e)
                && !touches_water
                && t_downslope_s[t].is_some()
        })
        .collect();
    Ok(springs)
}

/// Per-side flow from tracing every river downslope.
pub fn assign_s_flow(
    mesh: &TriangleMesh,
    t_downslope_s: &[Option<usize>],
    river_t: &[usize],
    t_elevation: &[f32],
) -> Result<Vec<f32>> {
    require_len("t_downslope_s", t_downslope_s, mesh.num_triangles())?;
    require_len("t_elevation", t_elevation, mesh.num_triangles())?;

    let mut s_flow = vec![0.0f32; mesh.num_sides()];
    for &source in river_t {
        let mut t = mesh.check_triangle(source)?;
        // A well-formed downslope graph is a forest; the cap only stops a
        // corrupt one from looping.
        for _ in 0..mesh.num_triangles() {
            let Some(s) = t_downslope_s[t] else { break };
            if s >= mesh.num_sides() || mesh.s_inner_t(s) != t {
                return Err(MapError::InvalidMeshReference {
                    kind: ElementKind::Side,
                    index: s,
                    count: mesh.num_sides(),
                });
            }
            s_flow[s] += 1.0;
            let next = mesh.s_outer_t(s);
            if next == t {
                break;
            }
            t = next;
        }
    }
    Ok(s_flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::assign_t_elevation;
    use crate::mesh::MeshBuilder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (TriangleMesh, Vec<bool>, Vec<f32>, Vec<Option<usize>>) {
        let mesh = MeshBuilder::new(50.0).seed(5).build().unwrap();
        let r_ocean: Vec<bool> = (0..mesh.num_regions())
            .map(|r| mesh.r_is_ghost(r) || mesh.r_is_boundary(r))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let e = assign_t_elevation(&mesh, &r_ocean, &r_ocean, &mut rng).unwrap();
        (mesh, r_ocean, e.t_elevation, e.t_downslope_s)
    }

    #[test]
    fn test_springs_in_band_and_dry() {
        let (mesh, r_water, t_elevation, t_downslope_s) = setup();
        let springs = find_spring_t(&mesh, &r_water, &t_elevation, &t_downslope_s).unwrap();
        assert!(!springs.is_empty());
        assert!(springs.windows(2).all(|w| w[0] < w[1]));
        for &t in &springs {
            assert!(t < mesh.num_solid_triangles());
            assert!((0.3..=0.9).contains(&t_elevation[t]));
            assert!(mesh.t_circulate_r(t).iter().all(|&r| !r_water[r]));
        }
    }

    #[test]
    fn test_single_river_flow_is_one_per_side() {
        let (mesh, r_water, t_elevation, t_downslope_s) = setup();
        let springs = find_spring_t(&mesh, &r_water, &t_elevation, &t_downslope_s).unwrap();
        let s_flow = assign_s_flow(&mesh, &t_downslope_s, &springs[..1], &t_elevation).unwrap();
        assert_eq!(s_flow.len(), mesh.num_sides());
        assert!(s_flow.iter().all(|&f| f == 0.0 || f == 1.0));

        // The flowing sides are exactly the walk from the spring.
        let mut walked = 0;
        let mut t = springs[0];
        while let Some(s) = t_downslope_s[t] {
            assert_eq!(s_flow[s], 1.0);
            walked += 1;
            t = mesh.s_outer_t(s);
        }
        assert_eq!(s_flow.iter().filter(|&&f| f > 0.0).count(), walked);
    }

    #[test]
    fn test_flow_accumulates() {
        let (mesh, r_water, t_elevation, t_downslope_s) = setup();
        let springs = find_spring_t(&mesh, &r_water, &t_elevation, &t_downslope_s).unwrap();
        let twice = [springs[0], springs[0]];
        let s_flow = assign_s_flow(&mesh, &t_downslope_s, &twice, &t_elevation).unwrap();
        let first_side = t_downslope_s[springs[0]].unwrap();
        assert_eq!(s_flow[first_side], 2.0);
    }

    #[test]
    fn test_no_rivers_no_flow() {
        let (mesh, _, t_elevation, t_downslope_s) = setup();
        let s_flow = assign_s_flow(&mesh, &t_downslope_s, &[], &t_elevation).unwrap();
        assert!(s_flow.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_bad_river_id() {
        let (mesh, _, t_elevation, t_downslope_s) = setup();
        let result = assign_s_flow(&mesh, &t_downslope_s, &[usize::MAX], &t_elevation);
        assert!(matches!(result, Err(MapError::InvalidMeshReference { .. })));
    }
}
