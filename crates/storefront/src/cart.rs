//! Cart synchronizer.
//!
//! The server owns the cart. This component only mirrors the most recent
//! authoritative answer:
//!
//! - every mutation is followed by a full re-fetch, lines are never patched
//!   locally
//! - every fetch takes a sequence number; a response is applied only if its
//!   number is higher than the last one applied, so a slow response can
//!   never overwrite a newer one
//! - the total is recomputed from exactly the applied lines

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use petalshop_core::{CartId, CartLine, Price, ProductId, cart_id_of, cart_total};

use crate::api::CommerceApi;
use crate::error::{ClientError, Result, SIGN_IN_MESSAGE, add_breadcrumb};
use crate::notify::Notifier;
use crate::session::SessionContext;

pub const ADDED_MESSAGE: &str = "Added to cart!";
pub const ADD_FAILED_MESSAGE: &str = "Could not add the item to the cart.";
pub const REMOVED_MESSAGE: &str = "Removed from cart.";
pub const REMOVE_FAILED_MESSAGE: &str = "Could not remove the item from the cart.";
pub const LOAD_FAILED_MESSAGE: &str = "Could not load your cart.";

/// Where the cart view is in its fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CartStatus {
    /// Never fetched.
    #[default]
    Unloaded,
    /// A fetch is running.
    Loading,
    /// The lines are the last applied server answer.
    Loaded,
    /// The last applied fetch failed; the lines are from before it.
    Error(String),
}

/// Whether a fetch's response made it into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch (or a clear) had already been applied.
    Superseded,
}

/// Snapshot of the cart as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub status: CartStatus,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The id shared by every line, used to place an order.
    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        cart_id_of(&self.lines)
    }
}

/// Keeps the local cart view in sync with the server.
///
/// Cheap to clone; clones share the same view.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: Arc<dyn CommerceApi>,
    session: SessionContext,
    notifier: Notifier,
    state: Mutex<CartState>,
    pending: AtomicUsize,
}

#[derive(Default)]
struct CartState {
    lines: Vec<CartLine>,
    total: Price,
    status: CartStatus,
    /// Highest sequence number handed out.
    issued: u64,
    /// Highest sequence number whose response was applied.
    applied: u64,
}

impl CartSynchronizer {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: SessionContext, notifier: Notifier) -> Self {
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                notifier,
                state: Mutex::new(CartState::default()),
                pending: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetch the cart and apply it unless a newer fetch got there first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` (no request sent) when nobody
    /// is signed in, or `ClientError::Api` when an applied fetch failed.
    /// A failed fetch that was superseded is not an error.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<FetchOutcome> {
        let Some(user) = self.inner.session.current_user_id() else {
            self.lock().status = CartStatus::Error(SIGN_IN_MESSAGE.to_string());
            return Err(ClientError::Unauthenticated);
        };

        let seq = {
            let mut state = self.lock();
            state.issued += 1;
            state.status = CartStatus::Loading;
            state.issued
        };

        let result = self.inner.api.get_cart(&user).await;

        let result = result.map_err(ClientError::from).and_then(|lines| {
            let total = cart_total(&lines)?;
            Ok((lines, total))
        });

        let mut state = self.lock();
        if seq <= state.applied {
            debug!(seq, applied = state.applied, "Discarding superseded cart response");
            return Ok(FetchOutcome::Superseded);
        }
        state.applied = seq;
        // A newer fetch is still running; it decides the final status.
        let latest = seq == state.issued;

        match result {
            Ok((lines, total)) => {
                state.total = total;
                state.lines = lines;
                if latest {
                    state.status = CartStatus::Loaded;
                }
                debug!(seq, lines = state.lines.len(), total = %state.total, "Cart applied");
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                if latest {
                    state.status = CartStatus::Error(err.user_message(LOAD_FAILED_MESSAGE));
                }
                drop(state);
                err.report("cart.fetch");
                Err(err)
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product_id`, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` (no request sent) or the API
    /// failure. Either way the shopper gets a failure notification and the
    /// view is left alone. A failing re-fetch after a successful add only
    /// shows in the cart status.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId) -> Result<()> {
        self.mutate(Mutation::Add, product_id).await
    }

    /// Remove `product_id`, then re-fetch.
    ///
    /// # Errors
    ///
    /// Same as [`add_to_cart`](Self::add_to_cart).
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<()> {
        self.mutate(Mutation::Remove, product_id).await
    }

    async fn mutate(&self, mutation: Mutation, product_id: ProductId) -> Result<()> {
        let notifier = &self.inner.notifier;

        let Some(user) = self.inner.session.current_user_id() else {
            notifier.failure(SIGN_IN_MESSAGE);
            return Err(ClientError::Unauthenticated);
        };

        let product = product_id.to_string();
        add_breadcrumb(
            "cart",
            mutation.action(),
            Some(&[("product_id", product.as_str())]),
        );

        let result = {
            let _pending = PendingGuard::new(&self.inner.pending);
            match mutation {
                Mutation::Add => self.inner.api.add_to_cart(&user, product_id).await,
                Mutation::Remove => self.inner.api.remove_from_cart(&user, product_id).await,
            }
        };

        if let Err(e) = result {
            let err = ClientError::from(e);
            notifier.failure(err.user_message(mutation.failure_message()));
            err.report(mutation.action());
            return Err(err);
        }

        notifier.success(mutation.success_message());

        if let Err(e) = self.fetch_cart().await {
            debug!(error = %e, "Re-fetch after cart mutation failed");
        }
        Ok(())
    }

    /// Empty the view and supersede every fetch issued so far.
    ///
    /// Used once the server has consumed the cart into an order, so a fetch
    /// that started before the order cannot bring the old lines back.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.lines.clear();
        state.total = Price::ZERO;
        state.status = CartStatus::Loaded;
        state.applied = state.issued;
    }

    // =========================================================================
    // Views
    // =========================================================================

    #[must_use]
    pub fn view(&self) -> CartView {
        let state = self.lock();
        CartView {
            lines: state.lines.clone(),
            total: state.total,
            status: state.status.clone(),
        }
    }

    #[must_use]
    pub fn status(&self) -> CartStatus {
        self.lock().status.clone()
    }

    /// Add/remove requests still waiting for the server.
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Whether cart controls should be disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_mutations() > 0 || self.status() == CartStatus::Loading
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Remove,
}

impl Mutation {
    const fn action(self) -> &'static str {
        match self {
            Self::Add => "cart.add",
            Self::Remove => "cart.remove",
        }
    }

    const fn success_message(self) -> &'static str {
        match self {
            Self::Add => ADDED_MESSAGE,
            Self::Remove => REMOVED_MESSAGE,
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => ADD_FAILED_MESSAGE,
            Self::Remove => REMOVE_FAILED_MESSAGE,
        }
    }
}

/// Counts a mutation as pending for as long as it lives.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use petalshop_core::{Email, SessionIdentity};

    use super::*;
    use crate::api::Acknowledgement;
    use crate::testing::{Call, FakeApi, Failure, line};

    const USER: &str = "ayse@example.com";

    fn signed_in() -> SessionContext {
        let session = SessionContext::in_memory();
        session
            .sign_in(SessionIdentity::new(Email::parse(USER).unwrap()))
            .unwrap();
        session
    }

    fn cart_with(api: &Arc<FakeApi>, session: SessionContext) -> CartSynchronizer {
        CartSynchronizer::new(
            api.clone(),
            session,
            Notifier::new(Duration::from_millis(1500)),
        )
    }

    async fn until(condition: impl Fn() -> bool) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_fetch_computes_total_from_lines() {
        let api = Arc::new(FakeApi::new());
        api.set_cart(Ok(vec![line(1, 30, 2, 7), line(2, 20, 1, 7)]));
        let cart = cart_with(&api, signed_in());
        assert_eq!(cart.status(), CartStatus::Unloaded);

        assert_eq!(cart.fetch_cart().await.unwrap(), FetchOutcome::Applied);

        let view = cart.view();
        assert_eq!(view.status, CartStatus::Loaded);
        assert_eq!(view.total.to_string(), "80.00");
        assert_eq!(view.cart_id(), Some(CartId::new(7)));
        assert_eq!(api.calls(), vec![Call::GetCart(USER.to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_without_identity_sends_nothing() {
        let api = Arc::new(FakeApi::new());
        let cart = cart_with(&api, SessionContext::in_memory());

        let err = cart.fetch_cart().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
        assert_eq!(cart.status(), CartStatus::Error("Please sign in.".to_string()));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_late_response_never_overwrites_newer() {
        let api = Arc::new(FakeApi::new());
        let first_gate = api.gate_cart(Ok(vec![line(1, 30, 1, 7)]));
        let second_gate = api.gate_cart(Ok(vec![line(1, 30, 3, 7)]));
        let cart = cart_with(&api, signed_in());

        let first = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch_cart().await }
        });
        until(|| api.calls().len() == 1).await;
        let second = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch_cart().await }
        });
        until(|| api.calls().len() == 2).await;

        second_gate.send(()).unwrap();
        assert_eq!(second.await.unwrap().unwrap(), FetchOutcome::Applied);
        first_gate.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Superseded);

        let view = cart.view();
        assert_eq!(view.lines[0].quantity.get(), 3);
        assert_eq!(view.total, Price::from_units(90));
    }

    #[tokio::test]
    async fn test_applied_failure_keeps_previous_lines() {
        let api = Arc::new(FakeApi::new());
        api.set_cart(Ok(vec![line(1, 30, 2, 7)]));
        let cart = cart_with(&api, signed_in());
        cart.fetch_cart().await.unwrap();

        api.set_cart(Err(Failure::Transport));
        assert!(cart.fetch_cart().await.is_err());

        let view = cart.view();
        assert_eq!(view.status, CartStatus::Error(LOAD_FAILED_MESSAGE.to_string()));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.total, Price::from_units(60));
    }

    #[tokio::test]
    async fn test_overflowing_total_keeps_previous_lines() {
        let api = Arc::new(FakeApi::new());
        api.set_cart(Ok(vec![line(1, 30, 2, 7)]));
        let cart = cart_with(&api, signed_in());
        cart.fetch_cart().await.unwrap();

        let mut oversized = line(1, 1, 10, 7);
        oversized.price = "10000000000000000000000000000".parse().unwrap();
        api.set_cart(Ok(vec![oversized]));

        let err = cart.fetch_cart().await.unwrap_err();
        assert!(matches!(err, ClientError::Price(_)));

        let view = cart.view();
        assert_eq!(view.status, CartStatus::Error(LOAD_FAILED_MESSAGE.to_string()));
        assert_eq!(view.lines, vec![line(1, 30, 2, 7)]);
        assert_eq!(view.total, Price::from_units(60));
    }

    #[tokio::test]
    async fn test_older_response_leaves_status_loading() {
        let api = Arc::new(FakeApi::new());
        let first_gate = api.gate_cart(Ok(vec![line(1, 30, 1, 7)]));
        let second_gate = api.gate_cart(Ok(vec![line(1, 30, 3, 7)]));
        let cart = cart_with(&api, signed_in());

        let first = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch_cart().await }
        });
        until(|| api.calls().len() == 1).await;
        let second = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch_cart().await }
        });
        until(|| api.calls().len() == 2).await;

        first_gate.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Applied);
        assert_eq!(cart.view().total, Price::from_units(30));
        assert_eq!(cart.status(), CartStatus::Loading);
        assert!(cart.is_busy());

        second_gate.send(()).unwrap();
        assert_eq!(second.await.unwrap().unwrap(), FetchOutcome::Applied);
        assert_eq!(cart.status(), CartStatus::Loaded);
        assert_eq!(cart.view().total, Price::from_units(90));
        assert!(!cart.is_busy());
    }

    #[tokio::test]
    async fn test_add_refetches_and_notifies() {
        let api = Arc::new(FakeApi::new());
        api.set_cart(Ok(vec![line(3, 45, 1, 9)]));
        let notifier = Notifier::new(Duration::from_millis(1500));
        let cart = CartSynchronizer::new(api.clone(), signed_in(), notifier.clone());

        cart.add_to_cart(ProductId::new(3)).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                Call::AddToCart(USER.to_string(), ProductId::new(3)),
                Call::GetCart(USER.to_string()),
            ]
        );
        assert_eq!(cart.view().total, Price::from_units(45));
        let shown = notifier.current();
        assert!(shown.success);
        assert_eq!(shown.message, ADDED_MESSAGE);
        assert_eq!(cart.pending_mutations(), 0);
        assert!(!cart.is_busy());
    }

    #[tokio::test]
    async fn test_add_rejected_shows_server_message() {
        let api = Arc::new(FakeApi::new());
        api.set_cart(Ok(vec![line(1, 30, 2, 7)]));
        let notifier = Notifier::new(Duration::from_millis(1500));
        let cart = CartSynchronizer::new(api.clone(), signed_in(), notifier.clone());
        cart.fetch_cart().await.unwrap();
        let before = cart.view();

        api.set_add(Err(Failure::Server(400, Some("Stok yok"))));
        assert!(cart.add_to_cart(ProductId::new(5)).await.is_err());

        let shown = notifier.current();
        assert!(!shown.success);
        assert_eq!(shown.message, "Stok yok");
        assert_eq!(cart.view(), before);
        assert_eq!(api.count(|c| matches!(c, Call::GetCart(_))), 1);
    }

    #[tokio::test]
    async fn test_remove_failure_without_message_uses_fallback() {
        let api = Arc::new(FakeApi::new());
        api.set_remove(Err(Failure::Server(500, None)));
        let notifier = Notifier::new(Duration::from_millis(1500));
        let cart = CartSynchronizer::new(api.clone(), signed_in(), notifier.clone());

        assert!(cart.remove_from_cart(ProductId::new(1)).await.is_err());
        assert_eq!(notifier.current().message, REMOVE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_remove_refetches() {
        let api = Arc::new(FakeApi::new());
        api.set_remove(Ok(Acknowledgement::default()));
        let notifier = Notifier::new(Duration::from_millis(1500));
        let cart = CartSynchronizer::new(api.clone(), signed_in(), notifier.clone());

        cart.remove_from_cart(ProductId::new(1)).await.unwrap();
        assert_eq!(notifier.current().message, REMOVED_MESSAGE);
        assert_eq!(api.count(|c| matches!(c, Call::GetCart(_))), 1);
        assert!(cart.view().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_without_identity_sends_nothing() {
        let api = Arc::new(FakeApi::new());
        let notifier = Notifier::new(Duration::from_millis(1500));
        let cart = CartSynchronizer::new(
            api.clone(),
            SessionContext::in_memory(),
            notifier.clone(),
        );

        assert!(cart.add_to_cart(ProductId::new(1)).await.is_err());
        assert!(cart.remove_from_cart(ProductId::new(1)).await.is_err());
        assert!(api.calls().is_empty());
        assert_eq!(notifier.current().message, "Please sign in.");
    }

    #[tokio::test]
    async fn test_clear_supersedes_running_fetch() {
        let api = Arc::new(FakeApi::new());
        let gate = api.gate_cart(Ok(vec![line(1, 30, 2, 7)]));
        let cart = cart_with(&api, signed_in());

        let fetch = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch_cart().await }
        });
        until(|| api.calls().len() == 1).await;
        assert!(cart.is_busy());

        cart.clear();
        gate.send(()).unwrap();
        assert_eq!(fetch.await.unwrap().unwrap(), FetchOutcome::Superseded);

        let view = cart.view();
        assert!(view.is_empty());
        assert_eq!(view.total, Price::ZERO);
        assert_eq!(view.status, CartStatus::Loaded);
    }

    #[test]
    fn test_pending_guard_counts() {
        let counter = AtomicUsize::new(0);
        {
            let _a = PendingGuard::new(&counter);
            let _b = PendingGuard::new(&counter);
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
