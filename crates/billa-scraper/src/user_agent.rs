//! Rotating `User-Agent` values for catalog requests.

use rand::seq::IndexedRandom;

const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Picks a random browser user agent for each request.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: DESKTOP_USER_AGENTS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl UserAgentPool {
    /// Pool with a fixed set of agents. An empty list falls back to the
    /// built-in desktop agents.
    #[must_use]
    pub fn new(agents: Vec<String>) -> Self {
        if agents.is_empty() {
            Self::default()
        } else {
            Self { agents }
        }
    }

    #[must_use]
    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::rng())
            .map_or(DESKTOP_USER_AGENTS[0], String::as_str)
    }
}
