use super::{components::*, events::*};
use crate::core::events::LogEvent;
use crate::panel::systems::PANEL_COLOR;
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

const BAR_BACK_COLOR: Color = Color::srgb(0.15, 0.15, 0.15);
const BAR_FILL_COLOR: Color = Color::srgb(0.3, 0.7, 0.35);

pub fn spawn_travel_bar(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(16.0),
                left: Val::Percent(25.0),
                width: Val::Percent(50.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(6.0)),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            Visibility::Hidden,
            TravelBar,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TravelLabel,
            ));
            parent
                .spawn((
                    Node {
                        width: Val::Percent(100.0),
                        height: Val::Px(10.0),
                        ..default()
                    },
                    BackgroundColor(BAR_BACK_COLOR),
                ))
                .with_children(|bar| {
                    bar.spawn((
                        Node {
                            width: Val::Percent(0.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(BAR_FILL_COLOR),
                        TravelFill,
                    ));
                });
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TravelRemaining,
            ));
        });
}

pub fn start_travel(
    mut ev_start: EventReader<StartTravelEvent>,
    mut travel: ResMut<TravelState>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
) {
    for ev in ev_start.read() {
        if let Some(journey) = &travel.journey {
            toast.write(ErrorToastEvent(format!("正在前往 {}", journey.destination)));
            continue;
        }
        if ev.seconds.is_nan() || ev.seconds <= 0.0 {
            toast.write(ErrorToastEvent(format!("无效的旅行时间: {}", ev.seconds)));
            continue;
        }
        travel.journey = Some(Journey::new(&ev.destination, ev.seconds));
        log.write(LogEvent(format!("出发前往 {}，预计 {}", ev.destination, format_mm_ss(ev.seconds))));
    }
}

pub fn cancel_travel(
    mut ev_cancel: EventReader<CancelTravelEvent>,
    mut travel: ResMut<TravelState>,
    mut log: EventWriter<LogEvent>,
) {
    if ev_cancel.read().count() == 0 {
        return;
    }
    match travel.journey.take() {
        Some(journey) => {
            log.write(LogEvent(format!("取消前往 {}", journey.destination)));
        }
        None => {
            log.write(LogEvent("当前没有旅程".into()));
        }
    }
}

pub fn tick_travel(
    time: Res<Time>,
    mut travel: ResMut<TravelState>,
    mut ev_arrived: EventWriter<TravelArrived>,
    mut log: EventWriter<LogEvent>,
) {
    if travel.journey.is_none() {
        return;
    }
    let arrived = travel
        .journey
        .as_mut()
        .is_some_and(|journey| journey.advance(time.delta_secs()));
    if !arrived {
        return;
    }
    if let Some(journey) = travel.journey.take() {
        log.write(LogEvent(format!("抵达 {}", journey.destination)));
        ev_arrived.write(TravelArrived {
            destination: journey.destination,
        });
    }
}

pub fn render_travel(
    travel: Res<TravelState>,
    mut bars: Query<&mut Visibility, With<TravelBar>>,
    mut fills: Query<&mut Node, With<TravelFill>>,
    mut labels: Query<&mut Text, (With<TravelLabel>, Without<TravelRemaining>)>,
    mut remaining: Query<&mut Text, (With<TravelRemaining>, Without<TravelLabel>)>,
) {
    if !travel.is_changed() {
        return;
    }
    let Some(journey) = &travel.journey else {
        for mut visibility in &mut bars {
            *visibility = Visibility::Hidden;
        }
        return;
    };

    for mut visibility in &mut bars {
        *visibility = Visibility::Inherited;
    }
    for mut node in &mut fills {
        node.width = Val::Percent(journey.fraction() * 100.0);
    }
    for mut text in &mut labels {
        text.0 = journey.label();
    }
    for mut text in &mut remaining {
        text.0 = format!("剩余 {}", format_mm_ss(journey.remaining()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<TravelState>()
            .init_resource::<Time>()
            .add_event::<StartTravelEvent>()
            .add_event::<CancelTravelEvent>()
            .add_event::<TravelArrived>()
            .add_event::<LogEvent>()
            .add_event::<ErrorToastEvent>()
            .add_systems(Startup, spawn_travel_bar)
            .add_systems(
                Update,
                (start_travel, cancel_travel, tick_travel, render_travel).chain(),
            );
        app.update();
        app
    }

    fn advance(app: &mut App, seconds: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds));
        app.update();
    }

    fn label(app: &mut App) -> String {
        let mut query = app.world_mut().query_filtered::<&Text, With<TravelLabel>>();
        query.single(app.world()).unwrap().0.clone()
    }

    fn bar_visibility(app: &mut App) -> Visibility {
        let mut query = app.world_mut().query_filtered::<&Visibility, With<TravelBar>>();
        *query.single(app.world()).unwrap()
    }

    #[test]
    fn journey_progresses_and_arrives() {
        let mut app = app();
        app.world_mut().send_event(StartTravelEvent {
            destination: "港口".into(),
            seconds: 10.0,
        });
        app.update();
        assert_eq!(bar_visibility(&mut app), Visibility::Inherited);
        assert_eq!(label(&mut app), "前往 港口 0%");

        advance(&mut app, 2.5);
        assert_eq!(label(&mut app), "前往 港口 25%");

        advance(&mut app, 8.0);
        let arrived: Vec<_> = app
            .world()
            .resource::<Events<TravelArrived>>()
            .iter_current_update_events()
            .cloned()
            .collect();
        assert_eq!(
            arrived,
            vec![TravelArrived {
                destination: "港口".into()
            }]
        );
        assert!(app.world().resource::<TravelState>().journey.is_none());
        assert_eq!(bar_visibility(&mut app), Visibility::Hidden);
    }

    #[test]
    fn cancel_hides_the_bar_without_arriving() {
        let mut app = app();
        app.world_mut().send_event(StartTravelEvent {
            destination: "矿山".into(),
            seconds: 30.0,
        });
        app.update();
        app.world_mut().send_event(CancelTravelEvent);
        app.update();

        assert!(app.world().resource::<TravelState>().journey.is_none());
        assert_eq!(bar_visibility(&mut app), Visibility::Hidden);
        assert!(app.world().resource::<Events<TravelArrived>>().is_empty());
    }
}
