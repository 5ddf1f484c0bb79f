use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Client-side request budget: at most `max_requests` per sliding
/// `duration` window. `acquire` blocks the caller until the current
/// window has room, which is all the throttling a strictly sequential
/// transfer needs.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    window: Mutex<Window>,
    max_requests: usize,
    duration: Duration,
}

#[derive(Debug)]
struct Window {
    used: usize,
    started: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: usize, duration: Duration) -> Self {
        RateLimiter {
            window: Mutex::new(Window {
                used: 0,
                started: Instant::now(),
            }),
            max_requests,
            duration,
        }
    }

    pub fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let now = Instant::now();
                if now.duration_since(window.started) >= self.duration {
                    window.started = now;
                    window.used = 0;
                }
                if window.used < self.max_requests {
                    window.used += 1;
                    return;
                }
                self.duration - now.duration_since(window.started)
            };
            std::thread::sleep(wait);
        }
    }
}
