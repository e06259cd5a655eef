//! Shared state handed to every handler and middleware.

use std::sync::Arc;

use crate::services::bank_service::BankService;

#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<BankService>,
}

impl AppState {
    pub fn new(bank: BankService) -> Self {
        Self {
            bank: Arc::new(bank),
        }
    }
}
