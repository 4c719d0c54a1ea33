// pulp-coro demo driver
//
// Runs every demo against the host clock, the way firmware would run
// them against its tick interrupt:
//   1. countdowns fired into the dynamic scheduler, heartbeat until idle
//   2. ping/pong stepped a fixed number of passes
//   3. the code lock fed by its scripted keypad user until it opens
//
// Between steps the driver idles briefly instead of spinning; on target
// that is a WFI. Log filter comes from PULP_LOG (env_logger syntax,
// default info).

use std::thread;
use std::time::Duration;

use log::info;

use pulp_coro::apps::codelock::run_codelock;
use pulp_coro::apps::countdown::run_countdowns;
use pulp_coro::apps::pingpong::run_pingpong;
use pulp_coro::kernel::{Clock, SystemClock};

const DRIVER_IDLE_US: u64 = 10;
const LOG_ENV: &str = "PULP_LOG";
const PINGPONG_PASSES: u32 = 200;

fn idle() {
    thread::sleep(Duration::from_micros(DRIVER_IDLE_US));
}

fn log_builder(var: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::new().filter_or(var, "info"));
    builder.format_timestamp(None);
    builder
}

fn main() {
    log_builder(LOG_ENV).init();
    info!("booting...");

    let clock = SystemClock::new();

    let rounds = run_countdowns(clock, idle);
    info!("countdowns: {} rounds", rounds);

    let (ping, pong) = run_pingpong(PINGPONG_PASSES);
    info!("pingpong: ping ran {} times, pong {}", ping, pong);

    let steps = run_codelock(clock, idle);
    info!("codelock: opened after {} steps ({} ms)", steps, clock.now_ms());
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::*;

    #[test]
    fn log_filter_defaults_to_info() {
        let logger = log_builder("PULP_CORO_TEST_UNSET_LOG").build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }

    #[test]
    fn explicit_filters_override_default() {
        let logger = log_builder("PULP_CORO_TEST_UNSET_LOG")
            .parse_filters("pulp_coro::kernel=trace")
            .build();
        assert_eq!(logger.filter(), LevelFilter::Trace);
    }
}
