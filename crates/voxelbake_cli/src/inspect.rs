//! Human-readable summary of a `.vox` file.

use std::collections::BTreeSet;
use std::fmt;

use voxelbake_core::VoxScene;

/// Models, placement and palette usage of a scene, formatted on display.
pub struct Report<'a>(&'a VoxScene);

/// Wraps `scene` for printing.
pub fn report(scene: &VoxScene) -> Report<'_> {
    Report(scene)
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scene = self.0;
        writeln!(
            f,
            "version {}, {} model(s), {} voxel(s), {} node(s)",
            scene.version,
            scene.models.len(),
            scene.voxel_count(),
            scene.nodes.len()
        )?;

        let mut used = BTreeSet::new();
        for (index, model) in (0u32..).zip(&scene.models) {
            used.extend(model.voxels.iter().map(|v| v.color_index));
            let [sx, sy, sz] = model.size;
            write!(
                f,
                "  model {index}: {sx}x{sy}x{sz}, {} voxel(s), ",
                model.voxels.len()
            )?;
            match scene.model_offset(index) {
                Some([x, y, z]) => writeln!(f, "at ({x}, {y}, {z})")?,
                None => writeln!(f, "unplaced")?,
            }
        }

        if scene.palette.is_none() {
            return writeln!(f, "palette: none (viewer default)");
        }
        writeln!(f, "palette: {} index(es) used", used.len())?;
        for index in used {
            if let Some([r, g, b, a]) = scene.color_of(index) {
                writeln!(f, "  {index:>3}: #{r:02x}{g:02x}{b:02x}{a:02x}")?;
            }
        }
        Ok(())
    }
}
