extern crate std;

use crate::display;
use crate::etd;
use crate::location;
use crate::result;

use std::sync::mpsc;
use std::time::Duration;

pub const DEFAULT_INTERVAL_SECS: u64 = 40;

pub enum Event {
    Tick,
    FragmentChanged(location::LocationInfo),
    FetchDone(u64, result::BartDashResult<Vec<etd::Estimate>>),
    Shutdown,
}

pub type FetchFn =
    fn(&str, location::Direction, &str) -> result::BartDashResult<Vec<etd::Estimate>>;

enum Outcome {
    Continue,
    Rendered,
    Stop,
}

// Single event loop over one channel. The interval ticker and the fragment
// subscription both feed it, and every fetch runs on its own thread so a
// hung request never blocks the loop. Responses carry the sequence number
// they were issued with; only the latest issued sequence is applied, so a
// slow stale fetch can never overwrite a newer result.
pub struct Poller {
    api_key: String,
    interval: Duration,
    fetch_fn: FetchFn,
    location: location::LocationInfo,
    latest_seq: u64,
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
}

impl Poller {
    pub fn new(location: location::LocationInfo,
               api_key: &str,
               interval: Duration,
               fetch_fn: FetchFn) -> Poller {
        let (tx, rx) = mpsc::channel();
        return Poller{
            api_key: api_key.to_string(),
            interval: interval,
            fetch_fn: fetch_fn,
            location: location,
            latest_seq: 0,
            tx: tx,
            rx: rx,
        };
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        return self.tx.clone();
    }

    fn issue_fetch(&mut self) {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let tx = self.tx.clone();
        let station = self.location.station.clone();
        let direction = self.location.direction;
        let api_key = self.api_key.clone();
        let fetch_fn = self.fetch_fn;
        std::thread::spawn(move || {
            let outcome = fetch_fn(&station, direction, &api_key);
            // The receiver may already be gone during teardown.
            let _ = tx.send(Event::FetchDone(seq, outcome));
        });
    }

    fn handle(&mut self, event: Event, board: &mut display::Board) -> Outcome {
        match event {
            Event::Tick => {
                debug!("interval tick, seq {}", self.latest_seq + 1);
                self.issue_fetch();
                return Outcome::Continue;
            },
            Event::FragmentChanged(info) => {
                if info == self.location {
                    return Outcome::Continue;
                }
                info!("location changed to {}", location::format_fragment(&info));
                self.location = info;
                self.issue_fetch();
                return Outcome::Continue;
            },
            Event::FetchDone(seq, outcome) => {
                if seq != self.latest_seq {
                    debug!("discarding stale response seq {} (latest {})",
                           seq, self.latest_seq);
                    return Outcome::Continue;
                }
                match outcome {
                    Ok(estimates) => {
                        board.apply_update(&self.location, estimates);
                    },
                    Err(err) => {
                        warn!("poll failed: {}", err);
                        board.mark_degraded(format!("{}", err));
                    },
                }
                return Outcome::Rendered;
            },
            Event::Shutdown => {
                return Outcome::Stop;
            },
        }
    }

    pub fn run(mut self, one_shot: bool) {
        let _ticker = start_ticker(self.tx.clone(), self.interval);

        let mut board = display::Board::new(self.location.clone());
        self.issue_fetch();

        loop {
            let event = match self.rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            };
            match self.handle(event, &mut board) {
                Outcome::Continue => {},
                Outcome::Rendered => {
                    println!("{}", board.render());
                    if one_shot {
                        break;
                    }
                },
                Outcome::Stop => break,
            }
        }
        // Dropping the receiver here ends the ticker thread on its next send.
    }
}

// Fixed cadence, independent of location changes; exits once the receiving
// side is gone.
fn start_ticker(tx: mpsc::Sender<Event>, interval: Duration) -> std::thread::JoinHandle<()> {
    return std::thread::spawn(move || {
        loop {
            std::thread::sleep(interval);
            if tx.send(Event::Tick).is_err() {
                return;
            }
        }
    });
}
