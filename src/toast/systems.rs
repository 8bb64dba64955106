use super::{components::*, events::*};
use bevy::prelude::*;

const TOAST_COLOR: Color = Color::srgba(0.45, 0.08, 0.08, 0.92);

pub fn spawn_toast_overlay(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                left: Val::Percent(30.0),
                width: Val::Percent(40.0),
                padding: UiRect::all(Val::Px(8.0)),
                justify_content: JustifyContent::Center,
                ..default()
            },
            BackgroundColor(TOAST_COLOR),
            GlobalZIndex(10),
            Visibility::Hidden,
            ToastRoot,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                ToastText,
            ));
        });
}

pub fn enqueue_toasts(mut ev_toast: EventReader<ErrorToastEvent>, mut queue: ResMut<ToastQueue>) {
    for ErrorToastEvent(message) in ev_toast.read() {
        warn!("提示: {message}");
        queue.push(message.clone());
        debug!("待显示提示 {} 条", queue.pending());
    }
}

pub fn tick_toasts(time: Res<Time>, mut queue: ResMut<ToastQueue>) {
    if queue.bypass_change_detection().tick(time.delta()) {
        queue.set_changed();
    }
}

pub fn render_toast(
    queue: Res<ToastQueue>,
    mut roots: Query<&mut Visibility, With<ToastRoot>>,
    mut texts: Query<&mut Text, With<ToastText>>,
) {
    if !queue.is_changed() {
        return;
    }
    let visibility = match queue.current() {
        Some(_) => Visibility::Inherited,
        None => Visibility::Hidden,
    };
    for mut root in &mut roots {
        *root = visibility;
    }
    for mut text in &mut texts {
        text.0 = queue.current().unwrap_or_default().to_string();
    }
}
