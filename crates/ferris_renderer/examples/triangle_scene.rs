//! Triangle scene example.
//!
//! Renders a ground plane, a glass pyramid, a mirror panel and a light
//! panel, then saves the result as PNG.

use std::error::Error;
use std::sync::Arc;

use ferris_renderer::{
    render, Camera, CameraConfig, Color, Dielectric, DiffuseLight, Lambertian, Material, Metal,
    RenderOptions, Scene, Triangle, Vec3,
};

fn main() -> Result<(), Box<dyn Error>> {
    println!("Ferris Path Tracer - Triangle Scene");
    println!("===================================");

    let start = std::time::Instant::now();
    let world = build_scene();
    println!("Scene built in {:?} ({} triangles)", start.elapsed(), world.len());

    let config = CameraConfig::default()
        .with_image(16.0 / 9.0, 480)
        .with_quality(64, 12)
        .with_position(
            Vec3::new(0.0, 1.5, 6.0), // look_from
            Vec3::new(0.0, 0.8, 0.0), // look_at
            Vec3::new(0.0, 1.0, 0.0), // vup
        )
        .with_lens(40.0, 0.4, 6.0)
        .with_background(Color::new(0.05, 0.05, 0.08));
    let camera = Camera::new(config)?;

    println!(
        "Rendering {}x{} @ {} spp...",
        camera.image_width(),
        camera.image_height(),
        camera.effective_samples_per_pixel()
    );

    let start = std::time::Instant::now();
    let image = render(&camera, &world, &RenderOptions::default().with_progress(true))?;
    println!("Rendered in {:?}", start.elapsed());

    let filename = "triangle_scene.png";
    image.save_png(filename)?;
    println!("Saved to {}", filename);

    Ok(())
}

/// Two triangles spanning the quad `q`, `q + u`, `q + u + v`, `q + v`.
fn quad(scene: &mut Scene, q: Vec3, u: Vec3, v: Vec3, material: &Arc<dyn Material>) {
    scene.add(Triangle::new(q, u, v, Arc::clone(material)));
    scene.add(Triangle::new(q + u + v, -u, -v, Arc::clone(material)));
}

fn build_scene() -> Scene {
    let mut scene = Scene::new();

    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)));
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
    let mirror: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.05));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(6.0)));

    // Ground
    quad(
        &mut scene,
        Vec3::new(-10.0, 0.0, 10.0),
        Vec3::new(20.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -20.0),
        &ground,
    );

    // Pyramid
    let apex = Vec3::new(0.0, 1.6, 0.0);
    let base = [
        Vec3::new(-1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, -1.0),
        Vec3::new(-1.0, 0.0, -1.0),
    ];
    for k in 0..base.len() {
        let next = base[(k + 1) % base.len()];
        scene.add(Triangle::from_vertices(base[k], next, apex, Arc::clone(&glass)));
    }

    // Mirror panel behind the pyramid
    quad(
        &mut scene,
        Vec3::new(-3.0, 0.0, -3.0),
        Vec3::new(2.5, 0.0, 0.5),
        Vec3::new(0.0, 2.5, 0.0),
        &mirror,
    );

    // Overhead light, facing down
    quad(
        &mut scene,
        Vec3::new(-1.5, 4.0, -1.5),
        Vec3::new(3.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 3.0),
        &light,
    );

    scene
}
