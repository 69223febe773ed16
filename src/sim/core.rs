//! Per-particle extension component
//!
//! Gameplay owns what "alive" means; the simulation core only allocates the
//! component, revives it on respawn and ticks it after each post-step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Core {
    pub alive: bool,
    /// Ticks survived since the last revive
    pub age_ticks: u64,
    /// Number of times the component has been revived
    pub lives: u32,
}

impl Core {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revive(&mut self) {
        self.alive = true;
        self.age_ticks = 0;
        self.lives += 1;
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Advance one simulation tick
    pub fn tick(&mut self) {
        if self.alive {
            self.age_ticks += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_ages_only_while_alive() {
        let mut core = Core::new();
        core.tick();
        assert_eq!(core.age_ticks, 0);

        core.revive();
        core.tick();
        core.tick();
        assert_eq!(core.age_ticks, 2);
        assert_eq!(core.lives, 1);

        core.kill();
        core.tick();
        assert_eq!(core.age_ticks, 2);

        core.revive();
        assert!(core.alive);
        assert_eq!(core.age_ticks, 0);
        assert_eq!(core.lives, 2);
    }
}
