//! Integration tests for Rink Rental.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rink-rental-integration-tests
//! ```
//!
//! No external services are needed: [`MockRentalServer`] serves canned JSON
//! for the background cart endpoints on an ephemeral local port, and
//! [`TestPage`] wires the interceptors to an in-memory page pointed at it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use rink_rental_storefront::interceptors::trigger;
use rink_rental_storefront::toast::ToastSnapshot;
use rink_rental_storefront::{
    CartClient, Dispatcher, Document, DomEvent, Element, EnhanceConfig, MemoryDocument,
    MemorySurface, ToastNotifier, install,
};
use rink_rental_core::CartAction;
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

/// Canned response for one path.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    /// JSON reply with the given status.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Raw (possibly non-JSON) reply.
    #[must_use]
    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub csrf_token: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct ServerState {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the rental site's background endpoints.
pub struct MockRentalServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl MockRentalServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// Base URL of the server.
    ///
    /// # Panics
    ///
    /// Panics if the socket address does not form a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock server URL")
    }

    /// Serve `reply` for `path`.
    pub fn reply(&self, path: &str, reply: Reply) {
        if let Ok(mut replies) = self.state.replies.lock() {
            replies.insert(path.to_string(), reply);
        }
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockRentalServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            csrf_token: header_value("x-csrftoken"),
            content_type: header_value(header::CONTENT_TYPE.as_str()),
            body,
        });
    }

    let reply = state
        .replies
        .lock()
        .ok()
        .and_then(|replies| replies.get(uri.path()).cloned())
        .unwrap_or_else(|| {
            Reply::json(
                404,
                &serde_json::json!({"success": false, "message": "Not found"}),
            )
        });

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

/// In-memory page with the interceptors installed.
pub struct TestPage {
    pub config: Arc<EnhanceConfig>,
    pub document: MemoryDocument,
    pub surface: MemorySurface,
    pub dispatcher: Dispatcher,
    pub cart: Element,
}

impl TestPage {
    /// Page talking to `base_url` with the given cookie string.
    #[must_use]
    pub fn new(base_url: Url, cookies: &str) -> Self {
        Self::with_config(
            EnhanceConfig {
                base_url,
                ..EnhanceConfig::default()
            },
            cookies,
        )
    }

    /// Page using an explicit configuration.
    #[must_use]
    pub fn with_config(config: EnhanceConfig, cookies: &str) -> Self {
        let config = Arc::new(config);
        let document = MemoryDocument::new("/rental/cart/", cookies);
        let surface = MemorySurface::new();
        let notifier = Arc::new(ToastNotifier::new(
            Arc::new(surface.clone()),
            config.toast_duration,
        ));
        let page: Arc<dyn Document> = Arc::new(document.clone());

        let mut dispatcher = Dispatcher::new();
        install(
            &mut dispatcher,
            &CartClient::from_config(&config),
            &notifier,
            &page,
            &config,
        );

        let cart = document.append(
            None,
            Element::new("ul").with_id(config.cart_container_id.clone()),
        );
        document.replace_inner_html(&config.cart_container_id, "<li>old</li>");

        Self {
            config,
            document,
            surface,
            dispatcher,
            cart,
        }
    }

    /// Add-to-cart form attached to the page.
    pub fn add_form(&self, action: &str, fields: &[(&str, &str)]) -> Element {
        let (_, marker) = trigger(CartAction::AddToCart);
        let form = fields.iter().fold(
            Element::new("form").with_class(marker).with_action(action),
            |form, (name, value)| form.with_field(*name, *value),
        );
        self.document.append(None, form)
    }

    /// Cart item holding a remove button; returns `(item, button)`.
    pub fn cart_item(&self, id: &str) -> (Element, Element) {
        let (_, marker) = trigger(CartAction::RemoveFromCart);
        let item = self.document.append(
            Some(self.cart.node()),
            Element::new("li").with_class(self.config.cart_item_class.clone()),
        );
        let button = self.document.append(
            Some(item.node()),
            Element::new("button").with_class(marker).with_data("id", id),
        );
        (item, button)
    }

    /// Checkout button attached to the page.
    pub fn checkout_button(&self) -> Element {
        let (_, marker) = trigger(CartAction::Checkout);
        self.document
            .append(None, Element::new("button").with_class(marker))
    }

    /// Dispatch `event` and wait for every handler.
    ///
    /// # Panics
    ///
    /// Panics if a handler task panics.
    pub async fn fire(&self, event: &DomEvent) -> usize {
        let handles = self.dispatcher.dispatch(event);
        let count = handles.len();
        for handle in handles {
            handle.await.expect("handler task panicked");
        }
        count
    }

    /// Current toast.
    #[must_use]
    pub fn toast(&self) -> ToastSnapshot {
        self.surface.snapshot()
    }

    /// Contents of the cart container.
    #[must_use]
    pub fn cart_html(&self) -> String {
        self.document
            .inner_html(&self.config.cart_container_id)
            .unwrap_or_default()
    }
}
