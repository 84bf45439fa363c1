//! Promo codes of the catalog service, mirrored to `promo_<userId>`.
//!
//! Codes are looked up on demand; nothing here touches the cart.

use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use ths_core::validation::validate_discount;
use ths_core::{Percentage, PromoCode, ValidationError};

use super::Services;
use crate::api::NewPromoCode;
use crate::cache::{keys, user_key};
use crate::error::{ClientError, ClientResult};

#[derive(Default)]
struct PromoState {
    user_id: Option<i64>,
    codes: Vec<PromoCode>,
}

pub struct PromoCodeStore {
    services: Services,
    state: Mutex<PromoState>,
}

impl PromoCodeStore {
    pub fn new(services: Services, user_id: Option<i64>) -> Self {
        let store = Self {
            services,
            state: Mutex::new(PromoState::default()),
        };
        store.switch_user(user_id);
        store
    }

    fn lock(&self) -> MutexGuard<'_, PromoState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn switch_user(&self, user_id: Option<i64>) {
        self.lock().user_id = user_id;
        self.load_cached();
    }

    /// Replaces the in-memory list with the cached one.
    pub fn load_cached(&self) -> Vec<PromoCode> {
        let user_id = self.lock().user_id;
        let codes: Vec<PromoCode> = self
            .services
            .restore(&user_key(keys::PROMO, user_id))
            .unwrap_or_default();
        self.lock().codes = codes.clone();
        codes
    }

    /// Downloads the codes and mirrors them to the cache.
    ///
    /// On failure the cached list stays in place.
    pub async fn fetch(&self) -> Vec<PromoCode> {
        match self.services.api.fetch_promo_codes().await {
            Ok(codes) => {
                let mut state = self.lock();
                self.services
                    .persist(&user_key(keys::PROMO, state.user_id), &codes);
                state.codes = codes.clone();
                codes
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch promo codes");
                self.codes()
            }
        }
    }

    pub fn codes(&self) -> Vec<PromoCode> {
        self.lock().codes.clone()
    }

    /// Active code matching `code`, ignoring case and surrounding blanks.
    pub fn find_active(&self, code: &str) -> Option<PromoCode> {
        let code = code.trim();
        self.lock()
            .codes
            .iter()
            .find(|p| p.is_active && p.code.eq_ignore_ascii_case(code))
            .cloned()
    }

    /// Creates a code in the catalog service, then refreshes the list.
    pub async fn create(
        &self,
        code: &str,
        discount: Percentage,
        active: bool,
    ) -> ClientResult<()> {
        let code = code.trim().to_uppercase();
        let checked = if code.is_empty() {
            Err(ValidationError::Required {
                field: "code".to_string(),
            })
        } else {
            validate_discount(discount)
        };
        if let Err(e) = checked {
            self.services.notifier.error(&e.to_string());
            return Err(ClientError::from(e));
        }

        let request = NewPromoCode {
            code,
            discount,
            is_active: u8::from(active),
        };
        if let Err(e) = self.services.api.create_promo_code(&request).await {
            self.services
                .notifier
                .error(&format!("Failed to create promo code: {}", e));
            return Err(e);
        }

        info!(code = %request.code, discount = %request.discount, "Promo code created");
        self.services
            .notifier
            .success(&format!("Promo code {} created", request.code));
        self.fetch().await;
        Ok(())
    }
}
