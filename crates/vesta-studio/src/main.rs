//! Vesta studio: a small scene editor on top of the engine.
//!
//! Left click      pick the unit under the cursor (logs unit and world point)
//! N               spawn a box at the last picked point
//! Delete          remove the selected box
//! V               cycle the composited attachment
//! Space           pause / resume the turntable camera
//! Escape          quit

mod units;

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec3;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use vesta_engine::assets::EmbeddedAssets;
use vesta_engine::device::GpuInit;
use vesta_engine::logging::{init_logging, LoggingConfig};
use vesta_engine::window::{Runtime, RuntimeConfig};
use vesta_engine::{App, AppControl, Scheduler};

use units::{Ground, NodeBox, Selection, SelectionMarker, Turntable};

const BOX_HALF: Vec3 = Vec3::new(0.6, 0.6, 0.6);

struct Studio {
    cursor: Option<PhysicalPosition<f64>>,
    selection: Selection,
    last_point: Vec3,
    turntable_paused: Rc<Cell<bool>>,
}

impl Studio {
    fn new() -> Self {
        Self {
            cursor: None,
            selection: Rc::new(Cell::new(None)),
            last_point: Vec3::ZERO,
            turntable_paused: Rc::new(Cell::new(false)),
        }
    }

    fn pick(&mut self, scheduler: &Scheduler) {
        let Some(cursor) = self.cursor else { return };
        let (x, y) = (cursor.x as u32, cursor.y as u32);

        let readback = match scheduler.blocking_readback() {
            Ok(readback) => readback,
            Err(e) => {
                log::warn!("pick at ({x}, {y}) skipped: {e}");
                return;
            }
        };

        let hit = readback
            .unit_at(x, y)
            .and_then(|unit| Ok((unit, readback.world_position_at(x, y)?)));
        match hit {
            Ok((Some(unit), point)) => {
                let label = scheduler.unit(unit).map_or("?", |u| u.label());
                log::info!("picked unit {unit} ({label}) at {point}");
                self.last_point = point;
                let is_box = scheduler.unit_as::<NodeBox>(unit).is_some();
                self.selection.set(is_box.then_some(unit));
            }
            Ok((None, _)) => {
                log::info!("picked background at ({x}, {y})");
                self.selection.set(None);
            }
            Err(e) => log::warn!("pick at ({x}, {y}) failed: {e}"),
        }
    }

    fn on_key(&mut self, scheduler: &mut Scheduler, key: KeyCode) -> AppControl {
        match key {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::KeyN => {
                let base = Vec3::new(self.last_point.x, 0.0, self.last_point.z);
                let id = scheduler.spawn_unit(move |setup| NodeBox::new(setup, base, BOX_HALF));
                log::info!("spawning box {id} at {base}");
            }
            KeyCode::Delete | KeyCode::Backspace => {
                if let Some(id) = self.selection.take() {
                    scheduler.tombstone(id);
                    log::info!("removing box {id}");
                }
            }
            KeyCode::KeyV => {
                let view = scheduler.composite_view().next();
                scheduler.set_composite_view(view);
                log::info!("showing {view:?} attachment");
            }
            KeyCode::Space => {
                let paused = !self.turntable_paused.get();
                self.turntable_paused.set(paused);
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for Studio {
    fn setup(&mut self, scheduler: &mut Scheduler) -> anyhow::Result<()> {
        pollster::block_on(scheduler.register_unit(Ground::new)).context("ground")?;

        let paused = self.turntable_paused.clone();
        pollster::block_on(scheduler.register_unit(move |_| async move {
            Ok(Turntable::new(14.0, 7.0, paused))
        }))
        .context("turntable")?;

        for (i, x) in [-4.0, 0.0, 4.0].into_iter().enumerate() {
            let base = Vec3::new(x, 0.0, i as f32 * 1.5 - 1.5);
            let factory = move |setup| NodeBox::new(setup, base, BOX_HALF);
            pollster::block_on(scheduler.register_unit(factory))
                .with_context(|| format!("box {i}"))?;
        }

        let selection = self.selection.clone();
        let marker = move |setup| SelectionMarker::new(setup, selection);
        pollster::block_on(scheduler.register_unit(marker)).context("selection marker")?;

        log::info!("studio ready with {} units", scheduler.unit_count());
        Ok(())
    }

    fn on_window_event(&mut self, scheduler: &mut Scheduler, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(*position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.pick(scheduler),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                if let PhysicalKey::Code(key) = event.physical_key {
                    return self.on_key(scheduler, key);
                }
            }
            _ => {}
        }
        AppControl::Continue
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Vesta Studio".to_string(),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), EmbeddedAssets::with_builtins(), Studio::new())
        .context("vesta studio terminated")
}
