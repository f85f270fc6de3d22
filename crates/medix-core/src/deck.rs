//! # Held Transaction Deck
//!
//! The cached list of held transactions plus the "new sale" sentinel.
//!
//! ```text
//!   index:   -1          0           1           2
//!         ┌────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐
//!         │  new   │ │ newest  │ │         │ │ oldest  │
//!         │  sale  │ │  hold   │ │  hold   │ │  hold   │
//!         └────────┘ └─────────┘ └─────────┘ └─────────┘
//!            ◄──── forward              back ────►
//! ```
//!
//! `active_index` always satisfies `-1 ≤ index ≤ len - 1`. Navigation is
//! clamped: `forward` at `-1` and `back` at the oldest hold do nothing.
//!
//! ## Refresh Policy
//! The list is replaced wholesale after every hold, commit, or explicit
//! refresh. Another terminal may have added or finalized holds in the
//! meantime, so the deck re-anchors by held-id rather than keeping the
//! numeric index:
//!
//! ```text
//! bound hold still present  →  index moves to its new position
//! bound hold gone           →  binding dropped, index = -1
//! nothing bound             →  index stays -1
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionSnapshot;

/// Sentinel index for "new sale".
pub const NEW_SALE: isize = -1;

/// Navigation direction through the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward older holds.
    Back,
    /// Toward the new-sale sentinel.
    Forward,
}

/// What a refresh did to the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reanchor {
    /// Nothing was bound.
    Unbound,
    /// The bound hold is at a (possibly new) position.
    Moved { from: isize, to: isize },
    /// The bound hold is no longer in Hold status.
    Dropped { id: String },
}

/// Position summary for the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeckPosition {
    pub index: isize,
    pub count: usize,
    pub bound_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HeldDeck {
    holds: Vec<TransactionSnapshot>,
    active_index: isize,
    bound_id: Option<String>,
}

impl HeldDeck {
    pub fn new() -> Self {
        HeldDeck {
            holds: Vec::new(),
            active_index: NEW_SALE,
            bound_id: None,
        }
    }

    pub fn holds(&self) -> &[TransactionSnapshot] {
        &self.holds
    }

    pub fn len(&self) -> usize {
        self.holds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    pub fn active_index(&self) -> isize {
        self.active_index
    }

    /// Id of the hold the active cart was loaded from, if any.
    pub fn bound_id(&self) -> Option<&str> {
        self.bound_id.as_deref()
    }

    pub fn position(&self) -> DeckPosition {
        DeckPosition {
            index: self.active_index,
            count: self.holds.len(),
            bound_id: self.bound_id.clone(),
        }
    }

    pub fn get(&self, index: isize) -> Option<&TransactionSnapshot> {
        usize::try_from(index).ok().and_then(|i| self.holds.get(i))
    }

    /// The index `navigate(direction)` would move to, or `None` at a bound.
    pub fn target(&self, direction: Direction) -> Option<isize> {
        let last = self.holds.len() as isize - 1;
        let next = match direction {
            Direction::Back => self.active_index + 1,
            Direction::Forward => self.active_index - 1,
        };
        (NEW_SALE..=last).contains(&next).then_some(next)
    }

    /// Checks an index without moving to it.
    pub fn check_index(&self, index: isize) -> CoreResult<()> {
        if index == NEW_SALE || self.get(index).is_some() {
            Ok(())
        } else {
            Err(CoreError::HoldNotFound {
                index,
                count: self.holds.len(),
            })
        }
    }

    /// Moves to `index` and binds its hold. `-1` unbinds.
    pub fn select(&mut self, index: isize) -> CoreResult<Option<&TransactionSnapshot>> {
        self.check_index(index)?;
        self.active_index = index;
        self.bound_id = self.get(index).map(|h| h.id.clone());
        Ok(self.get(index))
    }

    /// Returns to the new-sale sentinel.
    pub fn unbind(&mut self) {
        self.active_index = NEW_SALE;
        self.bound_id = None;
    }

    /// Replaces the cached holds and re-anchors the binding by id.
    ///
    /// Holds are kept newest first regardless of the order received.
    pub fn replace(&mut self, mut holds: Vec<TransactionSnapshot>) -> Reanchor {
        holds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.holds = holds;

        let Some(id) = self.bound_id.clone() else {
            self.active_index = NEW_SALE;
            return Reanchor::Unbound;
        };

        match self.holds.iter().position(|h| h.id == id) {
            Some(pos) => {
                let from = self.active_index;
                self.active_index = pos as isize;
                Reanchor::Moved {
                    from,
                    to: self.active_index,
                }
            }
            None => {
                self.unbind();
                Reanchor::Dropped { id }
            }
        }
    }
}
