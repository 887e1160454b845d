//! Screens the storefront can send the shopper to.
//!
//! Rendering is up to the front end; components only announce where the
//! shopper should go next.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A destination screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Catalog,
    Cart,
    Orders,
    Login,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            Self::Catalog => "/shop",
            Self::Cart => "/cart",
            Self::Orders => "/orders",
            Self::Login => "/login",
        };
        f.write_str(path)
    }
}

/// Receives navigation requests from storefront components.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(%route, "Navigate");
    }
}

/// Navigate to `route` once `delay` has passed.
///
/// Must be called from within a Tokio runtime.
pub fn navigate_after(
    navigator: Arc<dyn Navigator>,
    route: Route,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        navigator.navigate(route);
    })
}
