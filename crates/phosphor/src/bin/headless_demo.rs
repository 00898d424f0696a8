//! Headless demo: a spinning test scene rendered through the full
//! pipeline against the recording backend, no window required.

use phosphor::{Engine, EngineConfig};
use phosphor_rendering::{
    CameraNode, DirectionalLightNode, MeshNode, RecordingDriver, StaticResources, Transform,
};

const FRAMES: u64 = 240;

fn main() {
    let config = EngineConfig {
        // Unpaced: let backpressure alone drive the loop.
        target_fps: 0,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);

    let scene = engine.scene_mut();
    scene.add_camera(CameraNode {
        transform: Transform::at([0.0, 2.0, 8.0]),
        ..CameraNode::default()
    });
    scene.add_light(DirectionalLightNode {
        transform: Transform {
            rotation: [-0.6, 0.4, 0.0],
            ..Transform::IDENTITY
        },
        diffuse: [1.0, 0.95, 0.85],
        specular: [1.0, 1.0, 1.0],
        ..DirectionalLightNode::default()
    });
    for i in 0..3u32 {
        scene.add_mesh(MeshNode {
            transform: Transform::at([i as f32 * 2.0 - 2.0, 0.0, 0.0]),
            mesh_id: 1,
            material_id: i % 2,
            pass_num: 0,
        });
    }

    let mut frames = 0u64;
    let report = engine
        .run(
            move |scene, dt| {
                for node in scene.mesh_nodes_mut() {
                    node.transform.rotation[1] += dt * 0.8;
                }
                frames += 1;
                frames < FRAMES
            },
            RecordingDriver::new(),
            StaticResources::new(),
        )
        .expect("demo run failed");

    println!("frames simulated:   {}", report.frames_simulated);
    println!("frames rendered:    {}", report.frames_rendered);
    println!("avg frame time:     {:.3} ms", report.stats.avg_frame_ms());
    println!("avg draw calls:     {:.1}", report.stats.avg_draw_calls());
    println!("commands recorded:  {}", report.stats.commands);
}
