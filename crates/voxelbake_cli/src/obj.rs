//! OBJ/MTL → [`MeshSnapshot`].
//!
//! Faces are triangulated by the loader. Each triangle carries the OBJ
//! vertex colors when the file has them and the model's MTL material index
//! otherwise; the core decides which one wins.

use std::path::Path;

use voxelbake_core::{ExportError, Material, MeshSnapshot, MeshTriangle, Vec3};

use crate::error::CliError;

/// Loads an OBJ file (and its MTL library, if any) as a snapshot.
///
/// # Errors
///
/// - [`CliError::Obj`] if the OBJ cannot be parsed
/// - [`CliError::InvalidMesh`] if a face references a missing vertex
/// - [`CliError::Export`] with `InvalidParameter` if the file has no faces
pub fn load_snapshot(path: &Path) -> Result<MeshSnapshot, CliError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options).map_err(|source| CliError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials: Vec<Material> = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| Material::new(m.name, m.diffuse))
            .collect(),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "no usable MTL library ({e}), faces fall back to white"
            );
            Vec::new()
        }
    };

    let mut triangles = Vec::new();
    for model in &models {
        append_triangles(path, model, &mut triangles)?;
    }

    if triangles.is_empty() {
        return Err(ExportError::InvalidParameter(format!(
            "{} contains no faces",
            path.display()
        ))
        .into());
    }

    tracing::debug!(
        path = %path.display(),
        objects = models.len(),
        triangles = triangles.len(),
        materials = materials.len(),
        "loaded OBJ"
    );
    Ok(MeshSnapshot::new(triangles, materials))
}

fn append_triangles(
    path: &Path,
    model: &tobj::Model,
    out: &mut Vec<MeshTriangle>,
) -> Result<(), CliError> {
    let mesh = &model.mesh;
    let has_colors =
        !mesh.vertex_color.is_empty() && mesh.vertex_color.len() == mesh.positions.len();

    let corner = |index: u32| -> Result<(Vec3, [f32; 3]), CliError> {
        let base = index as usize * 3;
        let position = mesh.positions.get(base..base + 3).ok_or_else(|| CliError::InvalidMesh {
            path: path.to_path_buf(),
            detail: format!("object '{}' references missing vertex {index}", model.name),
        })?;
        let color = if has_colors {
            [
                mesh.vertex_color[base],
                mesh.vertex_color[base + 1],
                mesh.vertex_color[base + 2],
            ]
        } else {
            [1.0; 3]
        };
        Ok((Vec3::from_f32([position[0], position[1], position[2]]), color))
    };

    for face in mesh.indices.chunks_exact(3) {
        let (a, ca) = corner(face[0])?;
        let (b, cb) = corner(face[1])?;
        let (c, cc) = corner(face[2])?;

        let mut triangle = MeshTriangle::new(a, b, c);
        if has_colors {
            triangle = triangle.with_vertex_colors([ca, cb, cc]);
        }
        if let Some(material) = mesh.material_id {
            triangle = triangle.with_material(material);
        }
        out.push(triangle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use voxelbake_core::ErrorKind;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voxelbake-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_quad_with_material() {
        write_temp("quad.mtl", "newmtl red\nKd 1.0 0.0 0.0\n");
        let path = write_temp(
            "quad.obj",
            "mtllib quad.mtl\no quad\nv 0 0 0\nv 4 0 0\nv 4 4 0\nv 0 4 0\nusemtl red\nf 1 2 3 4\n",
        );

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.triangles.len(), 2);
        assert_eq!(snapshot.materials.len(), 1);
        assert_eq!(snapshot.materials[0].base_color, Some([1.0, 0.0, 0.0]));
        assert!(snapshot.triangles.iter().all(|t| t.material_index == Some(0)));
        assert!(snapshot.triangles.iter().all(|t| t.vertex_colors.is_none()));
    }

    #[test]
    fn test_vertex_colors() {
        let path = write_temp(
            "colored.obj",
            "v 0 0 0 0 1 0\nv 1 0 0 0 1 0\nv 0 1 0 0 1 0\nf 1 2 3\n",
        );

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.triangles.len(), 1);
        assert_eq!(
            snapshot.triangles[0].vertex_colors,
            Some([[0.0, 1.0, 0.0]; 3])
        );
    }

    #[test]
    fn test_no_faces_is_invalid_parameter() {
        let path = write_temp("points.obj", "v 0 0 0\nv 1 0 0\n");
        match load_snapshot(&path) {
            Err(CliError::Export(e)) => assert_eq!(e.kind(), ErrorKind::InvalidParameter),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_obj_error() {
        let path = std::env::temp_dir().join("voxelbake-cli-missing.obj");
        assert!(matches!(load_snapshot(&path), Err(CliError::Obj { .. })));
    }
}
