use bevy::prelude::*;

#[derive(Event, Debug, Clone)]
pub struct StartTravelEvent {
    pub destination: String,
    pub seconds: f32,
}

#[derive(Event, Debug, Default)]
pub struct CancelTravelEvent;

/// 抵达目的地
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct TravelArrived {
    pub destination: String,
}
