use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::diagram::{Diagram, Show};
use crate::error::Result;
use crate::pipeline::MapParams;
use crate::raster::RasterCanvas;
use crate::render::RenderOptions;
use crate::seeds::DiagramSeeds;

const RIVER_STEP: usize = 5;
const MAX_RIVERS: usize = 500;
const BIAS_STEP: f32 = 0.05;
const MIX_STEP: f64 = 0.1;
const ZOOMED: f64 = 2.0;

/// One keyboard command.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    Show(Show),
    Reseed,
    Rivers(isize),
    TemperatureBias(f32),
    MoistureBias(f32),
    CenterMix(f64),
    ToggleZoom,
}

fn action_for_key(key: Key) -> Option<Action> {
    let action = match key {
        Key::Key1 => Action::Show(Show::Points),
        Key::Key2 => Action::Show(Show::Delaunay),
        Key::Key3 => Action::Show(Show::Voronoi),
        Key::Key4 => Action::Show(Show::Water),
        Key::Key5 => Action::Show(Show::Ocean),
        Key::Key6 => Action::Show(Show::Elevation),
        Key::Key7 => Action::Show(Show::Drainage),
        Key::Key8 => Action::Show(Show::Rivers),
        Key::Key9 => Action::Show(Show::Moisture),
        Key::Key0 => Action::Show(Show::Biomes),
        Key::L => Action::Show(Show::Labels),
        Key::R => Action::Reseed,
        Key::Up => Action::Rivers(RIVER_STEP as isize),
        Key::Down => Action::Rivers(-(RIVER_STEP as isize)),
        Key::Right => Action::TemperatureBias(BIAS_STEP),
        Key::Left => Action::TemperatureBias(-BIAS_STEP),
        Key::RightBracket => Action::MoistureBias(BIAS_STEP),
        Key::LeftBracket => Action::MoistureBias(-BIAS_STEP),
        Key::M => Action::CenterMix(MIX_STEP),
        Key::N => Action::CenterMix(-MIX_STEP),
        Key::Z => Action::ToggleZoom,
        _ => return None,
    };
    Some(action)
}

/// What has to happen after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Refresh {
    Redraw,
    Recompute,
}

/// Applies `action` to the diagram and view options.
fn apply(
    diagram: &mut Diagram,
    options: &mut RenderOptions,
    action: Action,
    reseed: impl FnOnce() -> u64,
) -> Result<Refresh> {
    let params = *diagram.params();
    let refresh = match action {
        Action::Show(show) => {
            diagram.set_show(show);
            println!("View: {}", show);
            Refresh::Redraw
        }
        Action::Reseed => {
            let seeds = DiagramSeeds::from_master(reseed());
            println!("Regenerating with seed: {}", seeds.master);
            diagram.set_seeds(seeds);
            Refresh::Recompute
        }
        Action::Rivers(delta) => {
            let num_rivers = params.num_rivers.saturating_add_signed(delta).min(MAX_RIVERS);
            println!("Rivers: {}", num_rivers);
            diagram.set_params(MapParams { num_rivers, ..params });
            Refresh::Recompute
        }
        Action::TemperatureBias(delta) => {
            let temperature_bias = (params.temperature_bias + delta).clamp(-1.0, 1.0);
            println!("Temperature bias: {:+.2}", temperature_bias);
            diagram.set_params(MapParams { temperature_bias, ..params });
            Refresh::Recompute
        }
        Action::MoistureBias(delta) => {
            let moisture_bias = (params.moisture_bias + delta).clamp(-1.0, 1.0);
            println!("Moisture bias: {:+.2}", moisture_bias);
            diagram.set_params(MapParams { moisture_bias, ..params });
            Refresh::Recompute
        }
        Action::CenterMix(delta) => {
            diagram.set_center_mix(diagram.center_mix() + delta)?;
            println!("Center mix: {:.1}", diagram.center_mix());
            Refresh::Redraw
        }
        Action::ToggleZoom => {
            options.zoom = if options.zoom == 1.0 { ZOOMED } else { 1.0 };
            println!("Zoom: {}x", options.zoom);
            Refresh::Redraw
        }
    };
    Ok(refresh)
}

fn render_buffer(diagram: &Diagram, size: usize, options: &RenderOptions) -> Result<Vec<u32>> {
    let mut canvas = RasterCanvas::new(size as u32, size as u32);
    diagram.render(&mut canvas, options)?;
    Ok(canvas.to_argb_buffer())
}

/// Run the interactive map viewer on a square window of `size` pixels.
/// The diagram is recomputed first if it has no snapshot yet.
pub fn run_viewer(
    mut diagram: Diagram,
    size: usize,
    mut options: RenderOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut window = Window::new(
        "Polygon Map - 0-9/L: Views, R: Reseed, Arrows/[ ]: Sliders, Esc: Exit",
        size,
        size,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )?;

    // Limit to ~60fps
    window.set_target_fps(60);

    if diagram.snapshot().is_none() {
        diagram.recompute()?;
    }
    let mut buffer = render_buffer(&diagram, size, &options)?;

    println!("Viewer started. Controls:");
    println!("  1-9, 0: Points, Delaunay, Voronoi, Water, Ocean, Elevation, Drainage, Rivers, Moisture, Biomes");
    println!("  L: Labels");
    println!("  R: Reseed");
    println!("  Up/Down: River count");
    println!("  Left/Right: Temperature bias");
    println!("  [ / ]: Moisture bias");
    println!("  N/M: Center mix");
    println!("  Z: Zoom");
    println!("  Esc: Exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mut refresh = None;
        for key in window.get_keys_pressed(KeyRepeat::Yes) {
            let Some(action) = action_for_key(key) else { continue };
            match apply(&mut diagram, &mut options, action, rand::random) {
                Ok(next) => refresh = refresh.max(Some(next)),
                Err(err) => eprintln!("Error: {}", err),
            }
        }

        if refresh == Some(Refresh::Recompute) {
            // A failed recompute leaves the previous map on screen.
            if let Err(err) = diagram.recompute() {
                eprintln!("Error: {}", err);
            }
        }
        if refresh.is_some() {
            match render_buffer(&diagram, size, &options) {
                Ok(next) => buffer = next,
                Err(err) => eprintln!("Error: {}", err),
            }
        }

        window.update_with_buffer(&buffer, size, size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;

    fn diagram() -> Diagram {
        let mesh = MeshBuilder::new(100.0).seed(1).build().unwrap();
        Diagram::new(mesh, DiagramSeeds::from_master(5)).unwrap()
    }

    #[test]
    fn test_every_show_mode_has_a_key() {
        let keys = [
            Key::Key0, Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6, Key::Key7, Key::Key8,
            Key::Key9, Key::L,
        ];
        for show in Show::all() {
            assert!(
                keys.iter().any(|&k| action_for_key(k) == Some(Action::Show(*show))),
                "no key for {}",
                show
            );
        }
        assert_eq!(action_for_key(Key::Q), None);
    }

    #[test]
    fn test_sliders_clamp() {
        let mut diagram = diagram();
        let mut options = RenderOptions::default();
        for _ in 0..10 {
            apply(&mut diagram, &mut options, Action::Rivers(-5), || 0).unwrap();
        }
        assert_eq!(diagram.params().num_rivers, 0);
        for _ in 0..30 {
            apply(&mut diagram, &mut options, Action::TemperatureBias(0.05), || 0).unwrap();
        }
        assert_eq!(diagram.params().temperature_bias, 1.0);
    }

    #[test]
    fn test_refresh_kinds() {
        let mut diagram = diagram();
        let mut options = RenderOptions::default();
        let show = apply(&mut diagram, &mut options, Action::Show(Show::Rivers), || 0).unwrap();
        assert_eq!(show, Refresh::Redraw);
        assert_eq!(diagram.show(), Show::Rivers);

        let reseed = apply(&mut diagram, &mut options, Action::Reseed, || 77).unwrap();
        assert_eq!(reseed, Refresh::Recompute);
        assert_eq!(diagram.seeds(), DiagramSeeds::from_master(77));

        apply(&mut diagram, &mut options, Action::ToggleZoom, || 0).unwrap();
        assert_eq!(options.zoom, ZOOMED);
        apply(&mut diagram, &mut options, Action::ToggleZoom, || 0).unwrap();
        assert_eq!(options.zoom, 1.0);
        assert!(Refresh::Recompute > Refresh::Redraw);
    }

    #[test]
    fn test_render_buffer_size() {
        let mut diagram = diagram();
        diagram.recompute().unwrap();
        let buffer = render_buffer(&diagram, 64, &RenderOptions::default()).unwrap();
        assert_eq!(buffer.len(), 64 * 64);
    }
}
