extern crate chrono;

use crate::etd;
use crate::location;

// The currently displayed list plus enough bookkeeping to render a visible
// degraded-state marker instead of failing silently when a poll fails.
pub struct Board {
    location: location::LocationInfo,
    estimates: Vec<etd::Estimate>,
    last_good: Option<chrono::DateTime<chrono::Utc>>,
    last_failure: Option<String>,
}

impl Board {
    pub fn new(location: location::LocationInfo) -> Board {
        return Board{
            location: location,
            estimates: vec![],
            last_good: None,
            last_failure: None,
        };
    }

    // Full replacement, no incremental merge.
    pub fn apply_update(&mut self,
                        location: &location::LocationInfo,
                        estimates: Vec<etd::Estimate>) {
        self.location = location.clone();
        self.estimates = estimates;
        self.last_good = Some(chrono::Utc::now());
        self.last_failure = None;
    }

    pub fn mark_degraded(&mut self, message: String) {
        self.last_failure = Some(message);
    }

    pub fn estimates(&self) -> &[etd::Estimate] {
        return &self.estimates;
    }

    pub fn render(&self) -> String {
        return self.render_at(chrono::Utc::now());
    }

    fn render_at(&self, now: chrono::DateTime<chrono::Utc>) -> String {
        let mut out = format!("{} {}bound",
                              self.location.station,
                              self.location.direction.fragment_name());

        match self.last_failure {
            Some(ref message) => {
                out.push_str(&format!("  [STALE: {}]", message));
                match self.last_good {
                    Some(last_good) => {
                        let age_secs = (now - last_good).num_seconds();
                        out.push_str(&format!(" (last good update {}s ago)", age_secs));
                    },
                    None => {
                        out.push_str(" (no data yet)");
                    },
                }
            },
            None => {},
        }
        out.push('\n');

        if self.estimates.is_empty() && self.last_good.is_some() {
            out.push_str("  no trains\n");
        }
        for estimate in &self.estimates {
            out.push_str(&format!("  {}  {}\n",
                                  countdown_summary(estimate.wait_minutes),
                                  estimate.line_color));
        }

        return out;
    }
}

fn countdown_summary(wait_minutes: i64) -> String {
    if wait_minutes == 0 {
        return "Leaving".to_string();
    }
    return format!("{:>3} min", wait_minutes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn woak_south() -> location::LocationInfo {
        return location::LocationInfo{
            station: "woak".to_string(),
            direction: location::Direction::South,
        };
    }

    #[test]
    fn renders_sorted_waits_with_line_colors() {
        let mut board = Board::new(woak_south());
        board.apply_update(&woak_south(), vec![
            etd::Estimate{wait_minutes: 0, line_color: "GREEN".to_string()},
            etd::Estimate{wait_minutes: 3, line_color: "RED".to_string()},
        ]);

        let rendered = board.render();
        assert!(rendered.starts_with("woak southbound"));
        assert!(rendered.contains("Leaving  GREEN"));
        assert!(rendered.contains("3 min  RED"));
        assert!(!rendered.contains("STALE"));
    }

    #[test]
    fn failure_marks_the_board_stale_but_keeps_the_list() {
        let mut board = Board::new(woak_south());
        board.apply_update(&woak_south(), vec![
            etd::Estimate{wait_minutes: 5, line_color: "YELLOW".to_string()},
        ]);
        board.mark_degraded("Fetch Error: HTTP status 503".to_string());

        let rendered = board.render();
        assert!(rendered.contains("[STALE: Fetch Error: HTTP status 503]"));
        assert!(rendered.contains("5 min  YELLOW"));
    }

    #[test]
    fn successful_update_clears_the_stale_marker() {
        let mut board = Board::new(woak_south());
        board.mark_degraded("Empty Feed Error: no stations in response".to_string());
        board.apply_update(&woak_south(), vec![]);

        let rendered = board.render();
        assert!(!rendered.contains("STALE"));
        assert!(rendered.contains("no trains"));
    }

    #[test]
    fn failure_before_any_data_says_so() {
        let mut board = Board::new(woak_south());
        board.mark_degraded("HTTP Error: timed out".to_string());

        let rendered = board.render();
        assert!(rendered.contains("(no data yet)"));
    }
}
