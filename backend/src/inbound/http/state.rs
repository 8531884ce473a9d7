//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use crate::domain::{AccountService, BeanService, RoasterService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub roasters: RoasterService,
    pub beans: BeanService,
    pub accounts: AccountService,
}

impl HttpState {
    /// Bundle the services handlers call into.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use roastery::domain::{AccountService, BeanService, RoasterService};
    /// use roastery::inbound::http::state::HttpState;
    /// use roastery::outbound::memory::{MemoryAccounts, MemoryCatalogue};
    ///
    /// let catalogue = Arc::new(MemoryCatalogue::new());
    /// let accounts = Arc::new(MemoryAccounts::new());
    /// let state = HttpState::new(
    ///     RoasterService::new(catalogue.clone(), catalogue.clone()),
    ///     BeanService::new(catalogue.clone(), catalogue),
    ///     AccountService::new(accounts.clone(), accounts),
    /// );
    /// let _roasters = state.roasters.clone();
    /// ```
    pub fn new(roasters: RoasterService, beans: BeanService, accounts: AccountService) -> Self {
        Self {
            roasters,
            beans,
            accounts,
        }
    }
}
