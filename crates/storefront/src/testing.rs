//! In-memory `CommerceApi` for unit tests.
//!
//! Replies are scripted per endpoint. Cart fetches and order submissions
//! can be gated so a test decides when (and in which order) they complete.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use petalshop_core::{
    CartId, CartLine, Category, CategoryId, Order, Price, Product, ProductId,
};

use crate::api::{
    Acknowledgement, ApiError, AuthResponse, CommerceApi, LoginRequest, LoginResponse,
    RegisterRequest,
};

/// A call the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListCategories,
    ListProducts,
    GetCart(String),
    AddToCart(String, ProductId),
    RemoveFromCart(String, ProductId),
    CreateOrder(String, CartId),
    ListOrders(String),
    Login(String),
    Register(String),
    InvalidateCatalog,
}

/// A scripted failure.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Non-success status with an optional `message`.
    Server(u16, Option<&'static str>),
    /// The body could not be decoded.
    Transport,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Self::Server(status, message) => ApiError::Server {
                status,
                message: message.map(str::to_string),
            },
            Self::Transport => {
                ApiError::Parse(serde_json::from_str::<()>("<html>").unwrap_err())
            }
        }
    }
}

type Reply<T> = Result<T, Failure>;

struct Gated<T> {
    reply: Reply<T>,
    gate: Option<oneshot::Receiver<()>>,
}

struct State {
    calls: Vec<Call>,
    categories: Reply<Vec<Category>>,
    products: Reply<Vec<Product>>,
    cart: Reply<Vec<CartLine>>,
    cart_script: VecDeque<Gated<Vec<CartLine>>>,
    add: Reply<Acknowledgement>,
    remove: Reply<Acknowledgement>,
    order: Reply<Acknowledgement>,
    order_gate: Option<oneshot::Receiver<()>>,
    orders: Reply<Vec<Order>>,
    login: Reply<LoginResponse>,
    register: Reply<AuthResponse>,
}

/// Scriptable fake of the shop API.
pub struct FakeApi {
    state: Mutex<State>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                calls: Vec::new(),
                categories: Ok(Vec::new()),
                products: Ok(Vec::new()),
                cart: Ok(Vec::new()),
                cart_script: VecDeque::new(),
                add: Ok(Acknowledgement::default()),
                remove: Ok(Acknowledgement::default()),
                order: Ok(Acknowledgement::default()),
                order_gate: None,
                orders: Ok(Vec::new()),
                login: Ok(LoginResponse::default()),
                register: Ok(AuthResponse::default()),
            }),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|call| matches(call)).count()
    }

    pub fn set_categories(&self, reply: Reply<Vec<Category>>) {
        self.state().categories = reply;
    }

    pub fn set_products(&self, reply: Reply<Vec<Product>>) {
        self.state().products = reply;
    }

    /// Reply for every cart fetch that has no scripted reply queued.
    pub fn set_cart(&self, reply: Reply<Vec<CartLine>>) {
        self.state().cart = reply;
    }

    /// Queue a reply for the next unscripted cart fetch, held until the
    /// returned sender fires.
    pub fn gate_cart(&self, reply: Reply<Vec<CartLine>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().cart_script.push_back(Gated {
            reply,
            gate: Some(rx),
        });
        tx
    }

    pub fn set_add(&self, reply: Reply<Acknowledgement>) {
        self.state().add = reply;
    }

    pub fn set_remove(&self, reply: Reply<Acknowledgement>) {
        self.state().remove = reply;
    }

    pub fn set_order(&self, reply: Reply<Acknowledgement>) {
        self.state().order = reply;
    }

    /// Hold the next order submission until the returned sender fires.
    pub fn gate_order(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().order_gate = Some(rx);
        tx
    }

    pub fn set_orders(&self, reply: Reply<Vec<Order>>) {
        self.state().orders = reply;
    }

    pub fn set_login(&self, reply: Reply<LoginResponse>) {
        self.state().login = reply;
    }

    pub fn set_register(&self, reply: Reply<AuthResponse>) {
        self.state().register = reply;
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

#[async_trait]
impl CommerceApi for FakeApi {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record(Call::ListCategories);
        self.state().categories.clone().map_err(Failure::into_error)
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::ListProducts);
        self.state().products.clone().map_err(Failure::into_error)
    }

    async fn get_cart(&self, username: &str) -> Result<Vec<CartLine>, ApiError> {
        self.record(Call::GetCart(username.to_string()));
        let next = {
            let mut state = self.state();
            state.cart_script.pop_front().unwrap_or_else(|| Gated {
                reply: state.cart.clone(),
                gate: None,
            })
        };
        wait(next.gate).await;
        next.reply.map_err(Failure::into_error)
    }

    async fn add_to_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        self.record(Call::AddToCart(username.to_string(), product_id));
        self.state().add.clone().map_err(Failure::into_error)
    }

    async fn remove_from_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        self.record(Call::RemoveFromCart(username.to_string(), product_id));
        self.state().remove.clone().map_err(Failure::into_error)
    }

    async fn create_order(
        &self,
        username: &str,
        cart_id: CartId,
    ) -> Result<Acknowledgement, ApiError> {
        self.record(Call::CreateOrder(username.to_string(), cart_id));
        let gate = self.state().order_gate.take();
        wait(gate).await;
        self.state().order.clone().map_err(Failure::into_error)
    }

    async fn list_orders(&self, username: &str) -> Result<Vec<Order>, ApiError> {
        self.record(Call::ListOrders(username.to_string()));
        self.state().orders.clone().map_err(Failure::into_error)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login(request.email.clone()));
        self.state().login.clone().map_err(Failure::into_error)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.record(Call::Register(request.email.clone()));
        self.state().register.clone().map_err(Failure::into_error)
    }

    async fn invalidate_catalog(&self) {
        self.record(Call::InvalidateCatalog);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: i32, name: &str, price: u32, stock: u32, category: i32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::from_units(price),
        stock,
        description: format!("Fresh {name}"),
        image_url: format!("https://cdn.example.com/{id}.jpg"),
        category_id: CategoryId::new(category),
        category: None,
    }
}

pub fn category(id: i32, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_string(),
    }
}

pub fn line(product_id: i32, price: u32, quantity: u32, cart_id: i32) -> CartLine {
    CartLine {
        product_id: ProductId::new(product_id),
        name: format!("Flower {product_id}"),
        price: Price::from_units(price),
        stock: 10,
        description: String::new(),
        image_url: String::new(),
        category_id: CategoryId::new(1),
        category: None,
        quantity: NonZeroU32::new(quantity).unwrap(),
        cart_id: CartId::new(cart_id),
    }
}
