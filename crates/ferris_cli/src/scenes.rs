//! Built-in demo scene: an open-fronted box lit from the ceiling.

use std::path::Path;
use std::sync::Arc;

use ferris_renderer::{
    CameraConfig, Color, DiffuseLight, Lambertian, LoadError, Material, Mesh, Scene, Triangle,
    Vec3,
};

/// Where a loaded mesh's origin lands inside the box.
const MESH_CENTER: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Camera looking into the box through its open front.
pub fn demo_camera() -> CameraConfig {
    CameraConfig::default()
        .with_image(1.0, 300)
        .with_quality(64, 20)
        .with_position(Vec3::new(0.0, 2.0, 7.5), Vec3::new(0.0, 2.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 7.5)
}

/// Add the two triangles of quad `q`, `q + u`, `q + u + v`, `q + v`.
fn quad(scene: &mut Scene, q: Vec3, u: Vec3, v: Vec3, material: &Arc<dyn Material>) {
    scene.add(Triangle::new(q, u, v, Arc::clone(material)));
    scene.add(Triangle::new(q + u + v, -u, -v, Arc::clone(material)));
}

/// Build the box, optionally with a mesh standing on its floor.
pub fn demo_box(mesh: Option<&Path>) -> Result<Scene, LoadError> {
    let mut scene = Scene::new();

    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.73)));
    let red: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(15.0)));

    let x = Vec3::new(4.0, 0.0, 0.0);
    let y = Vec3::new(0.0, 4.0, 0.0);
    let z = Vec3::new(0.0, 0.0, 4.0);
    let corner = Vec3::new(-2.0, 0.0, -2.0);

    quad(&mut scene, corner, z, x, &white); // floor
    quad(&mut scene, corner + y, x, z, &white); // ceiling
    quad(&mut scene, corner, x, y, &white); // back
    quad(&mut scene, corner, y, z, &red); // left
    quad(&mut scene, corner + x, z, y, &green); // right

    // Ceiling light, just below the ceiling
    quad(
        &mut scene,
        Vec3::new(-0.6, 3.99, -0.6),
        Vec3::new(1.2, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.2),
        &light,
    );

    if let Some(path) = mesh {
        let material: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.9)));
        scene.add(Mesh::load(path, material, MESH_CENTER)?);
    }

    log::debug!("Demo scene has {} objects", scene.len());
    Ok(scene)
}
