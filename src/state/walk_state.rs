/// Walk state definitions for the listing-page loop
///
/// The page walker moves through these states once per listing page:
/// `Start → Fetching → Extracting → Dispatching → Persisting → NextPage`,
/// then back to `Fetching` or on to `Done`.
use std::fmt;

/// Represents where the page walker is within the current listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkState {
    /// Nothing fetched yet
    Start,

    /// Requesting the current listing page
    Fetching,

    /// Pulling result stubs and the next-page link out of the listing page
    Extracting,

    /// Detail pages are being fetched by the worker pool
    Dispatching,

    /// Writing the page's records to the store
    Persisting,

    /// Advancing the page counter and URL
    NextPage,

    /// Walk finished: page cap reached or results exhausted
    Done,
}

impl WalkState {
    /// Returns true if the walk is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: WalkState) -> bool {
        use WalkState::*;

        matches!(
            (self, next),
            (Start, Fetching)
                | (Fetching, Extracting)
                | (Extracting, Dispatching)
                // A listing page without results ends the walk early
                | (Extracting, Done)
                | (Dispatching, Persisting)
                | (Persisting, NextPage)
                | (NextPage, Fetching)
                | (NextPage, Done)
        )
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Dispatching => "dispatching",
            Self::Persisting => "persisting",
            Self::NextPage => "next_page",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for WalkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
