//! Compositing onto an off-screen texture standing in for the swapchain.

mod common;

use glam::Vec3;

use common::{assert_rgba_near, cube, offscreen_surface, read_texel, Billboard, SIZE};
use vesta_engine::render::CompositeView;
use vesta_engine::{EngineError, SchedulerConfig};

fn clear_rgba() -> [f32; 4] {
    let clear = SchedulerConfig::DEFAULT_CLEAR;
    [clear.r, clear.g, clear.b, clear.a].map(|c| c as f32)
}

#[test]
fn markers_stay_off_the_composited_surface_across_resize() {
    let Some(mut scheduler) = common::scheduler() else { return };
    let format = wgpu::TextureFormat::Rgba8Unorm;
    scheduler.set_surface_format(format);

    let marker = pollster::block_on(
        scheduler.register_unit(|setup| Billboard::new(setup, Vec3::ZERO, 4.0)),
    )
    .expect("marker registers");

    let surface = offscreen_surface(scheduler.context(), format, (SIZE, SIZE));
    let view = surface.create_view(&wgpu::TextureViewDescriptor::default());
    scheduler.render_frame(Some(&view)).expect("composited frame");

    assert_eq!(scheduler.query_unit_at(50, 50).expect("center"), Some(marker));
    let texel = read_texel(scheduler.context(), &surface, 50, 50);
    assert_rgba_near(&texel, clear_rgba(), "surface under the marker");

    scheduler.resize(64, 48);
    assert!(matches!(scheduler.blocking_readback(), Err(EngineError::NotReady)));

    let surface = offscreen_surface(scheduler.context(), format, (64, 48));
    let view = surface.create_view(&wgpu::TextureViewDescriptor::default());
    scheduler.render_frame(Some(&view)).expect("composited frame after resize");

    assert_eq!(scheduler.query_unit_at(32, 24).expect("center"), Some(marker));
    let texel = read_texel(scheduler.context(), &surface, 32, 24);
    assert_rgba_near(&texel, clear_rgba(), "resized surface under the marker");
    let corner = read_texel(scheduler.context(), &surface, 63, 47);
    assert_rgba_near(&corner, clear_rgba(), "resized surface corner");
}

#[test]
fn identity_view_paints_units_over_black() {
    let Some(mut scheduler) = common::scheduler() else { return };
    let format = wgpu::TextureFormat::Bgra8Unorm;
    scheduler.set_surface_format(format);
    scheduler.set_composite_view(CompositeView::Identity);

    let id = pollster::block_on(scheduler.register_unit(cube)).expect("cube registers");

    let surface = offscreen_surface(scheduler.context(), format, (SIZE, SIZE));
    let view = surface.create_view(&wgpu::TextureViewDescriptor::default());
    scheduler.render_frame(Some(&view)).expect("composited frame");
    assert_eq!(scheduler.query_unit_at(50, 50).expect("center"), Some(id));

    let background = read_texel(scheduler.context(), &surface, 2, 2);
    assert_rgba_near(&background, [0.0, 0.0, 0.0, 1.0], "background");

    // False colors start at 0.25 per channel, so a covered texel is never black.
    let covered = read_texel(scheduler.context(), &surface, 50, 50);
    assert!(covered[..3].iter().all(|&c| c > 0.2), "covered texel {covered:?}");

    // Switching back recomposites the shaded color attachment.
    scheduler.set_composite_view(CompositeView::Color);
    scheduler.render_frame(Some(&view)).expect("second composited frame");
    let shaded = read_texel(scheduler.context(), &surface, 2, 2);
    assert_rgba_near(&shaded, clear_rgba(), "background in color view");
}
