//! AI behavior traits
//!
//! Six independent switches that shape how the decision engine picks skills.
//! Any combination is valid; no trait implies or excludes another.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AITraitSet {
    /// Avoids resisted skills and prefers heals that fit the wound.
    pub careful: bool,
    /// Goes for the most effective skill against the current target.
    pub executor: bool,
    /// Always picks the biggest heal, even when nobody is hurt.
    pub reckless: bool,
    /// Heals wounded allies before attacking.
    pub healer: bool,
    /// Lets a leader decide on its behalf.
    pub follower: bool,
    /// Decides on behalf of its followers.
    pub leader: bool,
}

impl AITraitSet {
    pub const NONE: AITraitSet = AITraitSet {
        careful: false,
        executor: false,
        reckless: false,
        healer: false,
        follower: false,
        leader: false,
    };

    pub fn with_careful(mut self) -> Self {
        self.careful = true;
        self
    }

    pub fn with_executor(mut self) -> Self {
        self.executor = true;
        self
    }

    pub fn with_reckless(mut self) -> Self {
        self.reckless = true;
        self
    }

    pub fn with_healer(mut self) -> Self {
        self.healer = true;
        self
    }

    pub fn with_follower(mut self) -> Self {
        self.follower = true;
        self
    }

    pub fn with_leader(mut self) -> Self {
        self.leader = true;
        self
    }

    /// Names of the active traits, in declaration order.
    pub fn active(&self) -> Vec<&'static str> {
        [
            (self.careful, "careful"),
            (self.executor, "executor"),
            (self.reckless, "reckless"),
            (self.healer, "healer"),
            (self.follower, "follower"),
            (self.leader, "leader"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

impl fmt::Display for AITraitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active();
        if active.is_empty() {
            write!(f, "basic")
        } else {
            write!(f, "{}", active.join("+"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_combine_additively() {
        let traits = AITraitSet::NONE.with_healer().with_careful().with_leader();
        assert!(traits.healer && traits.careful && traits.leader);
        assert!(!traits.reckless && !traits.executor && !traits.follower);
        assert_eq!(traits.to_string(), "careful+healer+leader");
    }

    #[test]
    fn test_no_traits_display_as_basic() {
        assert_eq!(AITraitSet::default().to_string(), "basic");
    }
}
