extern crate anyhow;
extern crate chrono;
extern crate flexi_logger;
extern crate getopts;
#[macro_use]
extern crate log;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

mod display;
mod etd;
mod location;
mod poller;
mod result;

use std::sync::Arc;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optopt("l", "location", "initial location fragment, e.g. woak/s", "FRAGMENT");
    opts.optopt("k", "key", "BART API key", "KEY");
    opts.optopt("i", "interval-secs", "seconds between automatic refreshes", "SECS");
    opts.optflag("o", "one-shot", "fetch and render once, then exit");

    let matches = opts.parse(&args[1..]).expect("parse opts");

    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .expect("logger spec")
        .start()
        .expect("logger start");

    let api_key = matches.opt_str("key")
        .unwrap_or_else(|| etd::DEFAULT_API_KEY.to_string());
    let interval_secs = matches.opt_str("interval-secs")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(poller::DEFAULT_INTERVAL_SECS);
    let one_shot = matches.opt_present("one-shot");
    let initial_fragment = matches.opt_str("location").unwrap_or_else(|| "".to_string());

    let fragment = Arc::new(location::InMemoryFragment::new(&initial_fragment));
    let state = location::LocationState::new(fragment);

    let info = state.current();
    info!("starting at {}", location::format_fragment(&info));

    let poller = poller::Poller::new(
        info,
        &api_key,
        std::time::Duration::from_secs(interval_secs),
        etd::fetch_estimates);

    let change_tx = poller.sender();
    state.on_change(Box::new(move |info| {
        let _ = change_tx.send(poller::Event::FragmentChanged(info));
    }));

    let command_tx = poller.sender();
    let command_state = state.clone();
    std::thread::spawn(move || {
        read_commands(command_state, command_tx);
    });

    poller.run(one_shot);
}

// A woak/n style line replaces the whole location; a bare station code or a
// bare direction patches just that half. "q" exits.
fn read_commands(state: location::LocationState,
                 tx: std::sync::mpsc::Sender<poller::Event>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        if line == "q" || line == "quit" {
            let _ = tx.send(poller::Event::Shutdown);
            return;
        }

        let patch;
        if line.contains('/') || line.starts_with('#') {
            // A full fragment: parse-time defaulting applies.
            let info = location::parse_fragment(&line);
            patch = location::LocationPatch{
                station: Some(info.station),
                direction: Some(info.direction),
            };
        } else if let Some(direction) = location::Direction::from_fragment(&line) {
            patch = location::LocationPatch{
                station: None,
                direction: Some(direction),
            };
        } else {
            patch = location::LocationPatch{
                station: Some(line),
                direction: None,
            };
        }

        match state.set_location(&patch) {
            Ok(_) => {},
            Err(err) => warn!("ignoring location change: {}", err),
        }
    }
}
