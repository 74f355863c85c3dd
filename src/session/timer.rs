/// Below this many seconds the countdown is shown in its warning style.
pub const WARNING_THRESHOLD_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Still running, with this many seconds left.
    Running(u64),
    /// Reached zero on this tick. Reported exactly once.
    Expired,
    /// Cancelled or already expired; nothing happened.
    Idle,
}

/// Per-attempt countdown advanced one second per [`Countdown::tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    running: bool,
}

impl Countdown {
    pub fn start(minutes: u32) -> Self {
        Self::from_seconds(u64::from(minutes) * 60)
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            remaining: seconds,
            running: seconds > 0,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Restart after a cancel. An expired countdown stays stopped.
    pub fn resume(&mut self) -> bool {
        self.running = self.remaining > 0;
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining
    }

    pub fn is_warning(&self) -> bool {
        self.remaining < WARNING_THRESHOLD_SECS
    }

    pub fn display(&self) -> String {
        let hours = self.remaining / 3600;
        let minutes = (self.remaining % 3600) / 60;
        let seconds = self.remaining % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_minute_expires_once_after_sixty_ticks() {
        let mut countdown = Countdown::start(1);
        let mut expired = 0;
        for _ in 0..60 {
            if countdown.tick() == Tick::Expired {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert!(!countdown.is_running());
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn cancel_stops_ticks_and_resume_continues() {
        let mut countdown = Countdown::from_seconds(10);
        assert_eq!(countdown.tick(), Tick::Running(9));
        countdown.cancel();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining_seconds(), 9);
        assert!(countdown.resume());
        assert_eq!(countdown.tick(), Tick::Running(8));
    }

    #[test]
    fn expired_countdown_cannot_resume() {
        let mut countdown = Countdown::from_seconds(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(!countdown.resume());
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn zero_length_never_runs() {
        let mut countdown = Countdown::start(0);
        assert!(!countdown.is_running());
        assert_eq!(countdown.tick(), Tick::Idle);
    }

    #[test]
    fn warning_below_five_minutes() {
        assert!(!Countdown::from_seconds(300).is_warning());
        assert!(Countdown::from_seconds(299).is_warning());
    }

    #[test]
    fn display_format() {
        assert_eq!(Countdown::start(90).display(), "01:30:00");
        assert_eq!(Countdown::from_seconds(65).display(), "00:01:05");
    }
}
