//! # Config Commands
//!
//! Operator preference changes. Each one is written to `terminal.toml`
//! before it takes effect, then pushed into the cart engine.

use tracing::{debug, warn};

use medix_core::{ControlDrugMode, DiscountMode, SessionConfig, UnitType};

use crate::error::ApiResult;
use crate::state::TerminalConfig;
use crate::terminal::Terminal;

impl Terminal {
    /// Gets the current terminal configuration.
    pub fn config(&self) -> TerminalConfig {
        self.config.get()
    }

    /// Unit used by `add_line` when the operator does not pick one.
    pub fn set_default_unit(&self, unit: UnitType) -> ApiResult<SessionConfig> {
        debug!(?unit, "set_default_unit command");
        self.update_session_config(|c| c.default_unit = unit)
    }

    /// Switches how line discount figures are read.
    ///
    /// Figures already on the lines are reinterpreted under the new mode,
    /// so 1000 means 10% in Percent mode and 10.00 per unit in Value mode.
    pub fn set_discount_mode(&self, mode: DiscountMode) -> ApiResult<SessionConfig> {
        debug!(?mode, "set_discount_mode command");
        self.update_session_config(|c| c.discount_mode = mode)
    }

    pub fn set_control_mode(&self, mode: ControlDrugMode) -> ApiResult<SessionConfig> {
        debug!(?mode, "set_control_mode command");
        self.update_session_config(|c| c.control_mode = mode)
    }

    fn update_session_config<F>(&self, f: F) -> ApiResult<SessionConfig>
    where
        F: FnOnce(&mut SessionConfig),
    {
        let _edit = self.edit_guard()?;
        let updated = self.config.update(|c| f(&mut c.session))?;
        let lowered = self
            .session
            .with_session_mut(|s| s.cart.apply_config(updated.session));
        for key in &lowered {
            warn!(%key, "Line discount lowered to the new mode's limit");
        }
        Ok(updated.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{pack_product, terminal_with};
    use crate::error::ErrorCode;
    use crate::state::ConfigStore;
    use medix_client::MemoryInvoicingService;
    use medix_core::{LineEdit, Money};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_default_unit_applies_to_new_lines() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 10, 100, 100)]).await;
        terminal.set_default_unit(UnitType::Pack).unwrap();

        let added = terminal.add_line("b1", 1, None).unwrap();
        assert_eq!(added.key.unit, UnitType::Pack);
        assert_eq!(terminal.config().session.default_unit, UnitType::Pack);
    }

    #[tokio::test]
    async fn test_default_pack_falls_back_to_base() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 100, 100)]).await;
        terminal.set_default_unit(UnitType::Pack).unwrap();

        let added = terminal.add_line("b1", 1, None).unwrap();
        assert_eq!(added.key.unit, UnitType::Base);
    }

    #[tokio::test]
    async fn test_lock_mode_refuses_controlled() {
        let mut product = pack_product("p1", "b1", 1, 100, 100);
        product.controlled = true;
        let (terminal, _) = terminal_with(vec![product]).await;

        let added = terminal.add_line("b1", 1, None).unwrap();
        assert!(added.control_warning);
        terminal.clear().unwrap();

        terminal.set_control_mode(ControlDrugMode::Lock).unwrap();
        let err = terminal.add_line("b1", 1, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ControlledProduct);
        assert!(terminal.cart().is_empty());
    }

    #[tokio::test]
    async fn test_discount_mode_switch_reinterprets_lines() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 2_000, 100)]).await;
        let added = terminal.add_line("b1", 2, None).unwrap();
        terminal
            .update_line(&added.key, LineEdit::Discount(500))
            .unwrap();
        assert_eq!(terminal.totals().gross_total, Money::from_cents(3_800));

        terminal.set_discount_mode(DiscountMode::Value).unwrap();
        assert_eq!(terminal.totals().gross_total, Money::from_cents(3_000));
    }

    #[tokio::test]
    async fn test_value_mode_lowers_discount_to_rate() {
        let (terminal, _) = terminal_with(vec![pack_product("p1", "b1", 1, 50, 100)]).await;
        let added = terminal.add_line("b1", 2, None).unwrap();
        terminal
            .update_line(&added.key, LineEdit::Discount(10_000))
            .unwrap();
        assert_eq!(terminal.totals().gross_total, Money::zero());

        terminal.set_discount_mode(DiscountMode::Value).unwrap();
        let cart = terminal.get_cart();
        assert_eq!(cart.lines[0].discount, 50);
        assert_eq!(cart.totals.gross_total, Money::zero());
        assert_eq!(cart.totals.classification, medix_core::TransactionKind::Sale);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_config_unchanged() {
        let service = Arc::new(MemoryInvoicingService::new(Vec::new()));
        let terminal = Terminal::new(service, ConfigStore::detached(TerminalConfig::default()));

        let err = terminal.set_discount_mode(DiscountMode::Value).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(terminal.config().session.discount_mode, DiscountMode::Percent);
        assert_eq!(terminal.cart().config().discount_mode, DiscountMode::Percent);
    }
}
