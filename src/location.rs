extern crate std;

use crate::result;

use std::sync::Arc;
use std::sync::Mutex;

// BART station abbreviations, per https://api.bart.gov/docs/overview/abbrev.aspx
pub const STATIONS: &[&str] = &[
    "12th", "16th", "19th", "24th", "antc", "ashb", "balb", "bayf", "bery",
    "cast", "civc", "cols", "colm", "conc", "daly", "dbrk", "deln", "dubl",
    "embr", "frmt", "ftvl", "glen", "hayw", "lafy", "lake", "mcar", "mlbr",
    "mlpt", "mont", "nbrk", "ncon", "oakl", "orin", "pctr", "phil", "pitt",
    "plza", "powl", "rich", "rock", "sbrn", "sfia", "sanl", "shay", "ssan",
    "ucty", "warm", "wcrk", "wdub", "woak",
];

pub const DEFAULT_STATION: &str = "woak";
pub const DEFAULT_DIRECTION: Direction = Direction::South;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    North,
    South,
}

impl Direction {
    // Value of the "dir" query parameter in the feed URL.
    pub fn feed_code(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
        }
    }

    pub fn fragment_name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
        }
    }

    pub fn from_fragment(raw: &str) -> Option<Direction> {
        match raw.to_lowercase().as_str() {
            "n" | "north" => Some(Direction::North),
            "s" | "south" => Some(Direction::South),
            _ => None,
        }
    }
}

pub fn is_station(code: &str) -> bool {
    return STATIONS.contains(&code);
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocationInfo {
    pub station: String,
    pub direction: Direction,
}

// Partial update for set_location: absent fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct LocationPatch {
    pub station: Option<String>,
    pub direction: Option<Direction>,
}

// Total function: missing or unrecognized segments default at parse time,
// so consumers never see an out-of-range LocationInfo.
pub fn parse_fragment(raw: &str) -> LocationInfo {
    let raw = raw.trim().trim_start_matches('#');
    let mut segments = raw.splitn(2, '/');

    let station = segments.next()
        .map(|s| s.to_lowercase())
        .filter(|s| is_station(s))
        .unwrap_or_else(|| DEFAULT_STATION.to_string());
    let direction = segments.next()
        .and_then(Direction::from_fragment)
        .unwrap_or(DEFAULT_DIRECTION);

    return LocationInfo{
        station: station,
        direction: direction,
    };
}

pub fn format_fragment(info: &LocationInfo) -> String {
    return format!("{}/{}", info.station, info.direction.fragment_name());
}

// The navigation source behind the fragment pseudo-protocol. Abstracted so
// location logic is testable without a real address bar; set_fragment must
// notify every subscriber, including for writes made by this process.
pub trait FragmentSource: Send + Sync {
    fn current_fragment(&self) -> String;
    fn set_fragment(&self, fragment: &str);
    fn subscribe(&self, listener: Box<dyn Fn(String) + Send + Sync>);
}

pub struct InMemoryFragment {
    fragment: Mutex<String>,
    listeners: Mutex<Vec<Box<dyn Fn(String) + Send + Sync>>>,
}

impl InMemoryFragment {
    pub fn new(initial: &str) -> InMemoryFragment {
        return InMemoryFragment{
            fragment: Mutex::new(initial.to_string()),
            listeners: Mutex::new(vec![]),
        };
    }
}

impl FragmentSource for InMemoryFragment {
    fn current_fragment(&self) -> String {
        return self.fragment.lock().expect("fragment lock").clone();
    }

    fn set_fragment(&self, fragment: &str) {
        *self.fragment.lock().expect("fragment lock") = fragment.to_string();
        for listener in self.listeners.lock().expect("listeners lock").iter() {
            listener(fragment.to_string());
        }
    }

    fn subscribe(&self, listener: Box<dyn Fn(String) + Send + Sync>) {
        self.listeners.lock().expect("listeners lock").push(listener);
    }
}

#[derive(Clone)]
pub struct LocationState {
    source: Arc<dyn FragmentSource>,
}

impl LocationState {
    pub fn new(source: Arc<dyn FragmentSource>) -> LocationState {
        return LocationState{source: source};
    }

    pub fn current(&self) -> LocationInfo {
        return parse_fragment(&self.source.current_fragment());
    }

    // Unlike parse_fragment, the mutator rejects out-of-range input instead
    // of silently encoding it into the fragment.
    pub fn set_location(&self, patch: &LocationPatch) -> result::BartDashResult<()> {
        let mut info = self.current();

        if let Some(ref station) = patch.station {
            let station = station.to_lowercase();
            if !is_station(&station) {
                return Err(result::BartDashError::InvalidLocationError(
                    format!("unknown station '{}'", station)));
            }
            info.station = station;
        }
        if let Some(direction) = patch.direction {
            info.direction = direction;
        }

        self.source.set_fragment(&format_fragment(&info));
        return Ok(());
    }

    pub fn on_change(&self, callback: Box<dyn Fn(LocationInfo) + Send + Sync>) {
        self.source.subscribe(Box::new(move |fragment| {
            callback(parse_fragment(&fragment));
        }));
    }
}
