//! Order placement and order history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument};

use petalshop_core::{CartId, Order, Price};

use crate::api::CommerceApi;
use crate::cart::CartSynchronizer;
use crate::error::{ClientError, Result, SIGN_IN_MESSAGE, add_breadcrumb};
use crate::navigation::{Navigator, Route, navigate_after};
use crate::notify::Notifier;
use crate::session::SessionContext;

pub const ORDER_PLACED_MESSAGE: &str = "Your order has been placed!";
pub const ORDER_FAILED_MESSAGE: &str = "Could not place the order.";
pub const ORDERS_FAILED_MESSAGE: &str = "Could not load your orders.";

// =============================================================================
// Order Submitter
// =============================================================================

/// A confirmed order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlaced {
    /// The cart the server turned into the order.
    pub cart_id: CartId,
    /// Cart total at the time of submission.
    pub total: Price,
}

/// Turns the current cart into an order.
///
/// At most one submission is in flight at a time.
pub struct OrderSubmitter {
    api: Arc<dyn CommerceApi>,
    session: SessionContext,
    cart: CartSynchronizer,
    notifier: Notifier,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    in_flight: AtomicBool,
}

impl OrderSubmitter {
    #[must_use]
    pub fn new(
        api: Arc<dyn CommerceApi>,
        session: SessionContext,
        cart: CartSynchronizer,
        notifier: Notifier,
        navigator: Arc<dyn Navigator>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            api,
            session,
            cart,
            notifier,
            navigator,
            redirect_delay,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Submit the displayed cart as an order.
    ///
    /// On success the local cart is cleared, a success notification is
    /// shown and the shopper is sent back to the catalog after the redirect
    /// delay.
    ///
    /// # Errors
    ///
    /// - `ClientError::OrderInFlight` if a submission is already running
    /// - `ClientError::Unauthenticated` if nobody is signed in
    /// - `ClientError::EmptyCart` if the displayed cart has no lines
    /// - `ClientError::Api` if the server refused or could not be reached
    ///
    /// Every error also raises a failure notification and leaves the cart
    /// untouched.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderPlaced> {
        let Some(_submission) = InFlight::acquire(&self.in_flight) else {
            return Err(self.reject(ClientError::OrderInFlight));
        };

        let Some(user) = self.session.current_user_id() else {
            return Err(self.reject(ClientError::Unauthenticated));
        };

        let view = self.cart.view();
        let Some(cart_id) = view.cart_id() else {
            return Err(self.reject(ClientError::EmptyCart));
        };

        let cart = cart_id.to_string();
        add_breadcrumb("order", "Place order", Some(&[("cart_id", cart.as_str())]));

        if let Err(e) = self.api.create_order(&user, cart_id).await {
            let err = ClientError::from(e);
            self.notifier.failure(err.user_message(ORDER_FAILED_MESSAGE));
            err.report("order.place");
            return Err(err);
        }

        info!(cart_id = %cart_id, total = %view.total, "Order placed");
        self.cart.clear();
        self.notifier.success(ORDER_PLACED_MESSAGE);
        navigate_after(Arc::clone(&self.navigator), Route::Catalog, self.redirect_delay);

        Ok(OrderPlaced {
            cart_id,
            total: view.total,
        })
    }

    /// Whether a submission is running.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn reject(&self, err: ClientError) -> ClientError {
        self.notifier.failure(err.user_message(ORDER_FAILED_MESSAGE));
        err.report("order.place");
        err
    }
}

/// Holds the in-flight flag until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Order History
// =============================================================================

/// Where the order list is in its fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Error(String),
}

/// Read-only view of the shopper's past orders.
pub struct OrderHistory {
    api: Arc<dyn CommerceApi>,
    session: SessionContext,
    state: Mutex<HistoryState>,
}

#[derive(Default)]
struct HistoryState {
    orders: Vec<Order>,
    status: HistoryStatus,
}

impl OrderHistory {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, session: SessionContext) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(HistoryState::default()),
        }
    }

    /// Fetch the signed-in shopper's orders.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthenticated` (no request sent) when nobody
    /// is signed in, or `ClientError::Api` when the fetch fails. The held
    /// list is kept on failure.
    #[instrument(skip(self))]
    pub async fn load_orders(&self) -> Result<Vec<Order>> {
        let Some(user) = self.session.current_user_id() else {
            self.lock().status = HistoryStatus::Error(SIGN_IN_MESSAGE.to_string());
            return Err(ClientError::Unauthenticated);
        };

        self.lock().status = HistoryStatus::Loading;

        match self.api.list_orders(&user).await {
            Ok(orders) => {
                debug!(count = orders.len(), "Orders loaded");
                let mut state = self.lock();
                state.orders.clone_from(&orders);
                state.status = HistoryStatus::Loaded;
                Ok(orders)
            }
            Err(e) => {
                let err = ClientError::from(e);
                self.lock().status = HistoryStatus::Error(err.user_message(ORDERS_FAILED_MESSAGE));
                err.report("orders.load");
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.lock().status.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
