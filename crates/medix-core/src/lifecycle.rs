//! # Transaction Lifecycle
//!
//! The state machine tying cart, deck, and payment together.
//!
//! ```text
//!                      add_line / load_for_return
//!        ┌─────────┐ ─────────────────────────────► ┌──────────┐
//!        │  Empty  │                                │ Building │◄──┐ edit, re-hold
//!        └─────────┘ ◄───────────────────────────── └──────────┘ ──┘
//!          ▲    ▲      clear, load(-1), last line      │    │   ▲
//!          │    │      removed                   hold()│    │   │ load(i), add_line
//!          │    │                                      ▼    │   │
//!          │    │        load(-1), clear          ┌────────┐│   │
//!          │    └──────────────────────────────── │  Held  │────┘
//!          │                                      └────────┘│
//!          │ reset (after successful commit)                │ commit()
//!          │                                                ▼
//!          │                                 ┌──────────────────────────┐
//!          └──────────────────────────────── │ Committed(Sale | Return) │
//!                                            └──────────────────────────┘
//! ```
//!
//! `Held` never commits directly: the operator must load the hold (or start
//! a new sale) first, which puts the transaction back into `Building`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionKind;

/// Where the active transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "state", content = "kind")]
pub enum TransactionState {
    #[default]
    Empty,
    Building,
    /// The cart was just placed on hold and is empty again.
    Held,
    Committed(TransactionKind),
}

/// An operator action that may move the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    AddLine,
    /// Quantity, unit or discount edit, or removal of a line that is not the last.
    EditLine,
    RemoveLastLine,
    Clear,
    /// Places an unbound cart on hold.
    Hold,
    /// Updates the hold the cart was loaded from.
    Rehold,
    /// `load(i)` with `i != -1`.
    LoadHold,
    /// `load(-1)`.
    LoadNew,
    LoadForReturn,
    Commit(TransactionKind),
    /// Automatic return to `Empty` once a commit has been persisted.
    Reset,
}

impl TransactionState {
    /// Computes the state after `action`, or the error that refuses it.
    ///
    /// Hold and commit from a state with no lines fail with `EmptyCart`.
    pub fn transition(self, action: LifecycleAction) -> CoreResult<TransactionState> {
        use LifecycleAction as A;
        use TransactionState as S;

        let next = match (self, action) {
            (S::Committed(_), A::Reset) => S::Empty,
            (S::Committed(_), _) | (_, A::Reset) => return Err(self.refuse(action)),

            (S::Empty, A::Hold | A::Rehold | A::Commit(_)) => return Err(CoreError::EmptyCart),
            (S::Held, A::Hold | A::Rehold) => return Err(CoreError::EmptyCart),
            (S::Held, A::Commit(_)) => return Err(self.refuse(action)),
            (S::Empty | S::Held, A::EditLine | A::RemoveLastLine) => {
                return Err(self.refuse(action))
            }

            (_, A::AddLine | A::LoadHold | A::LoadForReturn) => S::Building,
            (_, A::Clear | A::LoadNew) => S::Empty,

            (S::Building, A::EditLine | A::Rehold) => S::Building,
            (S::Building, A::RemoveLastLine) => S::Empty,
            (S::Building, A::Hold) => S::Held,
            (S::Building, A::Commit(kind)) => S::Committed(kind),
        };

        Ok(next)
    }

    /// True when the cart may hold lines in this state.
    pub fn is_editable(&self) -> bool {
        matches!(self, TransactionState::Building)
    }

    fn refuse(self, action: LifecycleAction) -> CoreError {
        CoreError::InvalidTransition {
            state: self,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleAction as A;
    use TransactionState as S;

    #[test]
    fn test_sale_path() {
        let state = S::Empty.transition(A::AddLine).unwrap();
        assert_eq!(state, S::Building);
        let state = state.transition(A::Commit(TransactionKind::Sale)).unwrap();
        assert_eq!(state, S::Committed(TransactionKind::Sale));
        assert_eq!(state.transition(A::Reset).unwrap(), S::Empty);
    }

    #[test]
    fn test_hold_path() {
        let held = S::Building.transition(A::Hold).unwrap();
        assert_eq!(held, S::Held);
        assert_eq!(held.transition(A::LoadHold).unwrap(), S::Building);
        assert_eq!(held.transition(A::LoadNew).unwrap(), S::Empty);
        assert_eq!(held.transition(A::AddLine).unwrap(), S::Building);
        assert_eq!(S::Building.transition(A::Rehold).unwrap(), S::Building);
    }

    #[test]
    fn test_held_cannot_commit_directly() {
        let err = S::Held
            .transition(A::Commit(TransactionKind::Sale))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_empty_hold_and_commit_fail() {
        assert!(matches!(
            S::Empty.transition(A::Hold),
            Err(CoreError::EmptyCart)
        ));
        assert!(matches!(
            S::Empty.transition(A::Commit(TransactionKind::Return)),
            Err(CoreError::EmptyCart)
        ));
        assert!(matches!(
            S::Held.transition(A::Hold),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_building_to_empty() {
        assert_eq!(S::Building.transition(A::Clear).unwrap(), S::Empty);
        assert_eq!(S::Building.transition(A::LoadNew).unwrap(), S::Empty);
        assert_eq!(S::Building.transition(A::RemoveLastLine).unwrap(), S::Empty);
    }

    #[test]
    fn test_committed_only_resets() {
        let committed = S::Committed(TransactionKind::Return);
        assert!(committed.transition(A::AddLine).is_err());
        assert!(S::Building.transition(A::Reset).is_err());
    }
}
