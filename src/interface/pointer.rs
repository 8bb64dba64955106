//! 鼠标 / 触摸输入 → PointerPressed / PointerScrolled

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::core::states::AppState;
use crate::panel::events::{PointerPressed, PointerScrolled};

/// 像素滚动换算成行
const PIXELS_PER_ROW: f32 = 52.0;

pub struct PointerPlugin;

impl Plugin for PointerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PreUpdate,
            (mouse_pressed, mouse_scrolled, touch_pressed)
                .after(bevy::input::InputSystem)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// 光标位置是窗口逻辑坐标，左上角为原点，与 UI 一致
fn mouse_pressed(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut writer: EventWriter<PointerPressed>,
) {
    let Some(buttons) = buttons else {
        return;
    };
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(position) = windows.single().ok().and_then(Window::cursor_position) else {
        return;
    };
    writer.write(PointerPressed { position });
}

fn mouse_scrolled(
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut writer: EventWriter<PointerScrolled>,
) {
    let position = windows.single().ok().and_then(Window::cursor_position);
    for ev in wheel.read() {
        let Some(position) = position else {
            continue;
        };
        let rows = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_ROW,
        };
        if rows != 0.0 {
            writer.write(PointerScrolled { position, rows });
        }
    }
}

fn touch_pressed(touches: Option<Res<Touches>>, mut writer: EventWriter<PointerPressed>) {
    let Some(touches) = touches else {
        return;
    };
    for touch in touches.iter_just_pressed() {
        writer.write(PointerPressed {
            position: touch.position(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::input::touch::{touch_screen_input_system, TouchInput, TouchPhase};

    fn app() -> App {
        let mut app = App::new();
        app.add_event::<PointerPressed>()
            .add_event::<PointerScrolled>()
            .add_event::<MouseWheel>()
            .add_event::<TouchInput>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<Touches>()
            .add_systems(PreUpdate, touch_screen_input_system)
            .add_systems(Update, (mouse_pressed, mouse_scrolled, touch_pressed));
        app
    }

    fn pressed(app: &App) -> Vec<Vec2> {
        app.world()
            .resource::<Events<PointerPressed>>()
            .iter_current_update_events()
            .map(|e| e.position)
            .collect()
    }

    #[test]
    fn left_click_reports_the_cursor_once() {
        let mut app = app();
        let mut window = Window::default();
        window.set_cursor_position(Some(Vec2::new(120.0, 80.0)));
        app.world_mut().spawn((window, PrimaryWindow));

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        assert_eq!(pressed(&app), vec![Vec2::new(120.0, 80.0)]);

        // 按住不放不再触发
        app.world_mut().resource_mut::<ButtonInput<MouseButton>>().clear();
        app.update();
        assert!(pressed(&app).is_empty());

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Right);
        app.update();
        assert!(pressed(&app).is_empty());
    }

    #[test]
    fn wheel_over_the_window_scrolls_in_rows() {
        let mut app = app();
        let mut window = Window::default();
        window.set_cursor_position(Some(Vec2::new(400.0, 200.0)));
        let window = app.world_mut().spawn((window, PrimaryWindow)).id();

        app.world_mut().send_event(MouseWheel {
            unit: MouseScrollUnit::Line,
            x: 0.0,
            y: -2.0,
            window,
        });
        app.world_mut().send_event(MouseWheel {
            unit: MouseScrollUnit::Pixel,
            x: 0.0,
            y: 26.0,
            window,
        });
        app.update();
        let scrolled: Vec<(Vec2, f32)> = app
            .world()
            .resource::<Events<PointerScrolled>>()
            .iter_current_update_events()
            .map(|e| (e.position, e.rows))
            .collect();
        assert_eq!(
            scrolled,
            vec![(Vec2::new(400.0, 200.0), -2.0), (Vec2::new(400.0, 200.0), 0.5)]
        );
    }

    #[test]
    fn click_without_a_window_is_ignored() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        assert!(pressed(&app).is_empty());
    }

    #[test]
    fn touch_start_reports_its_position() {
        let mut app = app();
        app.world_mut().send_event(TouchInput {
            phase: TouchPhase::Started,
            position: Vec2::new(30.0, 40.0),
            window: Entity::PLACEHOLDER,
            force: None,
            id: 1,
        });
        app.update();
        assert_eq!(pressed(&app), vec![Vec2::new(30.0, 40.0)]);

        app.update();
        assert!(pressed(&app).is_empty());
    }
}
