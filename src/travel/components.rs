use bevy::prelude::*;

/// 进行中的旅程
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    pub destination: String,
    pub elapsed: f32,
    pub duration: f32,
}

impl Journey {
    pub fn new(destination: impl Into<String>, seconds: f32) -> Self {
        Self {
            destination: destination.into(),
            elapsed: 0.0,
            duration: seconds.max(0.0),
        }
    }

    /// 进度 [0, 1]
    pub fn fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).floor() as u32
    }

    pub fn label(&self) -> String {
        format!("前往 {} {}%", self.destination, self.percent())
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// 推进时间，到达时返回 true
    pub fn advance(&mut self, seconds: f32) -> bool {
        self.elapsed = (self.elapsed + seconds).min(self.duration);
        self.fraction() >= 1.0
    }
}

/// 剩余时间 mm:ss，不足一秒按一秒算
pub fn format_mm_ss(seconds: f32) -> String {
    let total = seconds.max(0.0).ceil() as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[derive(Resource, Debug, Default)]
pub struct TravelState {
    pub journey: Option<Journey>,
}

#[derive(Component)]
pub struct TravelBar;

#[derive(Component)]
pub struct TravelFill;

#[derive(Component)]
pub struct TravelLabel;

#[derive(Component)]
pub struct TravelRemaining;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_labelled() {
        let mut journey = Journey::new("王城", 90.0);
        assert_eq!(journey.label(), "前往 王城 0%");
        assert_eq!(format_mm_ss(journey.remaining()), "01:30");

        assert!(!journey.advance(30.0));
        assert_eq!(journey.percent(), 33);
        assert_eq!(format_mm_ss(journey.remaining()), "01:00");

        assert!(journey.advance(100.0));
        assert_eq!(journey.fraction(), 1.0);
        assert_eq!(journey.label(), "前往 王城 100%");
        assert_eq!(format_mm_ss(journey.remaining()), "00:00");
    }

    #[test]
    fn remaining_rounds_up() {
        assert_eq!(format_mm_ss(0.2), "00:01");
        assert_eq!(format_mm_ss(59.5), "01:00");
        assert_eq!(format_mm_ss(-3.0), "00:00");
        assert_eq!(format_mm_ss(3725.0), "62:05");
    }
}
