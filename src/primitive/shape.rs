use std::collections::HashMap;

use glam::Vec3;

use crate::asset::mesh::{MeshRecord, MeshTopology};

/// Axis-aligned solid cube spanning [-1, 1] on every axis, four vertices
/// per face so normals stay flat.
pub fn cube() -> MeshRecord {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push((normal + u * su + v * sv).to_array());
            normals.push(normal.to_array());
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshRecord {
        positions,
        normals,
        tex_coords: Vec::new(),
        indices: Some(indices),
        topology: MeshTopology::TriangleList,
    }
}

/// Unit icosphere: subdivided icosahedron with vertices re-projected onto
/// the sphere. Normals equal positions.
pub fn icosphere(subdivisions: u32) -> MeshRecord {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(&mut positions, &mut midpoints, a, b);
            let bc = midpoint(&mut positions, &mut midpoints, b, c);
            let ca = midpoint(&mut positions, &mut midpoints, c, a);
            next.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = next;
    }

    MeshRecord {
        normals: positions.iter().map(|p| p.to_array()).collect(),
        positions: positions.iter().map(|p| p.to_array()).collect(),
        tex_coords: Vec::new(),
        indices: Some(faces.into_iter().flatten().collect()),
        topology: MeshTopology::TriangleList,
    }
}

fn midpoint(
    positions: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
    a: u32,
    b: u32,
) -> u32 {
    let key = (a.min(b), a.max(b));
    *cache.entry(key).or_insert_with(|| {
        let mid = ((positions[a as usize] + positions[b as usize]) / 2.0).normalize();
        positions.push(mid);
        positions.len() as u32 - 1
    })
}

/// Capped cylinder along +Y, centered at the origin.
pub fn cylinder(radius: f32, half_length: f32, segments: u32) -> MeshRecord {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    // Side: one ring pair per segment boundary, radial normals.
    for segment in 0..=segments {
        let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = theta.sin_cos();
        let radial = Vec3::new(cos, 0.0, sin);
        positions.push((radial * radius - Vec3::Y * half_length).to_array());
        positions.push((radial * radius + Vec3::Y * half_length).to_array());
        normals.push(radial.to_array());
        normals.push(radial.to_array());
    }
    for segment in 0..segments {
        let base = segment * 2;
        indices.extend([base, base + 1, base + 2, base + 1, base + 3, base + 2]);
    }

    // Caps: center fan with axial normals.
    for (y, normal) in [(-half_length, Vec3::NEG_Y), (half_length, Vec3::Y)] {
        let center = positions.len() as u32;
        positions.push((Vec3::Y * y).to_array());
        normals.push(normal.to_array());
        for segment in 0..=segments {
            let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            positions.push(Vec3::new(cos * radius, y, sin * radius).to_array());
            normals.push(normal.to_array());
        }
        for segment in 0..segments {
            let rim = center + 1 + segment;
            if normal.y > 0.0 {
                indices.extend([center, rim + 1, rim]);
            } else {
                indices.extend([center, rim, rim + 1]);
            }
        }
    }

    MeshRecord {
        positions,
        normals,
        tex_coords: Vec::new(),
        indices: Some(indices),
        topology: MeshTopology::TriangleList,
    }
}

/// Capped cone along +Y: base ring at -half_length, apex at +half_length.
pub fn cone(radius: f32, half_length: f32, segments: u32) -> MeshRecord {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let height = half_length * 2.0;

    // Side: per-segment slant normals, apex duplicated per segment.
    for segment in 0..=segments {
        let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = theta.sin_cos();
        let normal = Vec3::new(height * cos, radius, height * sin).normalize();
        positions.push(Vec3::new(cos * radius, -half_length, sin * radius).to_array());
        positions.push((Vec3::Y * half_length).to_array());
        normals.push(normal.to_array());
        normals.push(normal.to_array());
    }
    for segment in 0..segments {
        let base = segment * 2;
        indices.extend([base, base + 1, base + 2]);
    }

    // Base cap.
    let center = positions.len() as u32;
    positions.push((Vec3::NEG_Y * half_length).to_array());
    normals.push(Vec3::NEG_Y.to_array());
    for segment in 0..=segments {
        let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = theta.sin_cos();
        positions.push(Vec3::new(cos * radius, -half_length, sin * radius).to_array());
        normals.push(Vec3::NEG_Y.to_array());
    }
    for segment in 0..segments {
        let rim = center + 1 + segment;
        indices.extend([center, rim, rim + 1]);
    }

    MeshRecord {
        positions,
        normals,
        tex_coords: Vec::new(),
        indices: Some(indices),
        topology: MeshTopology::TriangleList,
    }
}

/// Two-vertex line segment in world coordinates.
pub fn line(start: Vec3, end: Vec3) -> MeshRecord {
    MeshRecord {
        positions: vec![start.to_array(), end.to_array()],
        normals: Vec::new(),
        tex_coords: Vec::new(),
        indices: None,
        topology: MeshTopology::LineList,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_normals(record: &MeshRecord) {
        for normal in &record.normals {
            let length = Vec3::from_array(*normal).length();
            assert!((length - 1.0).abs() < 1e-5, "normal length {}", length);
        }
    }

    fn assert_indices_in_range(record: &MeshRecord) {
        let count = record.positions.len() as u32;
        for &index in record.indices.as_deref().unwrap_or(&[]) {
            assert!(index < count);
        }
    }

    // All solids are centered on the origin, so a counter-clockwise
    // (outward) triangle has its face normal pointing away from it.
    fn assert_outward_winding(record: &MeshRecord) {
        for triangle in record.indices.as_ref().unwrap().chunks_exact(3) {
            let a = Vec3::from_array(record.positions[triangle[0] as usize]);
            let b = Vec3::from_array(record.positions[triangle[1] as usize]);
            let c = Vec3::from_array(record.positions[triangle[2] as usize]);
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                face_normal.dot(centroid) > 0.0,
                "inward triangle {:?}",
                triangle
            );
        }
    }

    #[test]
    fn cube_has_flat_faces() {
        let cube = cube();
        assert_eq!(cube.positions.len(), 24);
        assert_eq!(cube.indices.as_ref().unwrap().len(), 36);
        assert_unit_normals(&cube);
        assert_indices_in_range(&cube);
        assert_outward_winding(&cube);
        assert!(cube.drawable());
    }

    #[test]
    fn icosphere_subdivision_counts() {
        let sphere = icosphere(2);
        assert_eq!(sphere.positions.len(), 162);
        assert_eq!(sphere.indices.as_ref().unwrap().len(), 320 * 3);
        for position in &sphere.positions {
            let radius = Vec3::from_array(*position).length();
            assert!((radius - 1.0).abs() < 1e-5);
        }
        assert_indices_in_range(&sphere);
        assert_outward_winding(&sphere);
    }

    #[test]
    fn cylinder_and_cone_are_drawable() {
        let cylinder = cylinder(0.5, 1.0, 16);
        assert_unit_normals(&cylinder);
        assert_indices_in_range(&cylinder);
        assert_outward_winding(&cylinder);
        assert!(cylinder.drawable());

        let cone = cone(0.5, 1.0, 32);
        assert_unit_normals(&cone);
        assert_indices_in_range(&cone);
        assert_outward_winding(&cone);
        assert!(cone.drawable());
    }

    #[test]
    fn line_is_two_vertices() {
        let line = line(Vec3::ZERO, Vec3::X);
        assert_eq!(line.positions.len(), 2);
        assert_eq!(line.topology, MeshTopology::LineList);
        assert!(!line.drawable());
    }
}
